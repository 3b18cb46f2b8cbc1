//! Cache key construction.
//!
//! A key is the wrapped function's qualified name followed by the textual
//! form of every positional argument and, unless keyword arguments are
//! ignored, every keyword name/value pair, all joined with `:`.
//!
//! Values render through [`KeyPart`]. Types without a stable textual identity
//! (services, connection pools, anything whose only identity is its address)
//! keep the default implementation and collapse to `<module::Type>`, so a
//! singleton receiver never splits the cache per instance.

use std::sync::Arc;

/// Keyword arguments that never take part in a key.
///
/// Connections and pools differ on every call but say nothing about the
/// cached value.
pub const EXEMPT_KWARGS: &[&str] = &["connection", "pool"];

/// A value that can appear in a cache key.
pub trait KeyPart {
    /// Textual identity of the value.
    ///
    /// The default is the type placeholder `<module::Type>`. Override it only
    /// when equal values always render to equal strings.
    fn key_repr(&self) -> String {
        opaque_repr::<Self>()
    }
}

/// Placeholder used for values without a stable textual identity.
pub fn opaque_repr<T: ?Sized>() -> String {
    format!("<{}>", std::any::type_name::<T>())
}

macro_rules! display_key_part {
    ($($ty:ty),* $(,)?) => {
        $(
            impl KeyPart for $ty {
                fn key_repr(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_key_part!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool,
);

impl KeyPart for str {
    fn key_repr(&self) -> String {
        format!("{self:?}")
    }
}

impl KeyPart for String {
    fn key_repr(&self) -> String {
        self.as_str().key_repr()
    }
}

impl KeyPart for char {
    fn key_repr(&self) -> String {
        format!("{self:?}")
    }
}

impl KeyPart for () {
    fn key_repr(&self) -> String {
        "()".to_string()
    }
}

impl<T: KeyPart> KeyPart for Option<T> {
    fn key_repr(&self) -> String {
        match self {
            Some(value) => value.key_repr(),
            None => "None".to_string(),
        }
    }
}

impl<T: KeyPart> KeyPart for [T] {
    fn key_repr(&self) -> String {
        let parts: Vec<String> = self.iter().map(KeyPart::key_repr).collect();
        format!("[{}]", parts.join(", "))
    }
}

impl<T: KeyPart> KeyPart for Vec<T> {
    fn key_repr(&self) -> String {
        self.as_slice().key_repr()
    }
}

impl<T: KeyPart + ?Sized> KeyPart for &T {
    fn key_repr(&self) -> String {
        (**self).key_repr()
    }
}

impl<T: KeyPart + ?Sized> KeyPart for Box<T> {
    fn key_repr(&self) -> String {
        (**self).key_repr()
    }
}

impl<T: KeyPart + ?Sized> KeyPart for Arc<T> {
    fn key_repr(&self) -> String {
        (**self).key_repr()
    }
}

/// Arguments of one call, rendered for key construction.
///
/// Keyword arguments keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    positional: Vec<String>,
    keywords: Vec<(String, String)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a positional argument.
    #[must_use]
    pub fn arg<T: KeyPart + ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(value.key_repr());
        self
    }

    /// Add a keyword argument.
    #[must_use]
    pub fn kwarg<T: KeyPart + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.keywords.push((name.to_string(), value.key_repr()));
        self
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, String)] {
        &self.keywords
    }
}

/// Build the key for `qualname` called with `args`.
pub fn make_key(qualname: &str, args: &Args, ignore_kwargs: bool) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(1 + args.positional.len() + 2 * args.keywords.len());
    parts.push(qualname.to_string());
    parts.extend(args.positional.iter().cloned());

    if !ignore_kwargs {
        for (name, value) in &args.keywords {
            if EXEMPT_KWARGS.contains(&name.as_str()) {
                continue;
            }
            parts.push(name.key_repr());
            parts.push(value.clone());
        }
    }

    parts.join(":")
}

/// Owned argument lists accepted by [`MemoizedFn`](super::MemoizedFn).
///
/// Implemented for tuples of up to six [`KeyPart`] values; every element is
/// positional.
pub trait KeyArgs {
    fn to_args(&self) -> Args;
}

impl KeyArgs for Args {
    fn to_args(&self) -> Args {
        self.clone()
    }
}

macro_rules! tuple_key_args {
    ($($name:ident),+) => {
        impl<$($name: KeyPart),+> KeyArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_args(&self) -> Args {
                let ($($name,)+) = self;
                Args::new()$(.arg($name))+
            }
        }
    };
}

tuple_key_args!(A);
tuple_key_args!(A, B);
tuple_key_args!(A, B, C);
tuple_key_args!(A, B, C, D);
tuple_key_args!(A, B, C, D, E);
tuple_key_args!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    struct Receiver;

    impl KeyPart for Receiver {}

    struct Pool;

    impl KeyPart for Pool {}

    #[test]
    fn test_primitive_reprs() {
        assert_eq!(42u64.key_repr(), "42");
        assert_eq!((-7i32).key_repr(), "-7");
        assert_eq!(true.key_repr(), "true");
        assert_eq!("abc".key_repr(), "\"abc\"");
        assert_eq!(String::from("abc").key_repr(), "\"abc\"");
        assert_eq!(Option::<u64>::None.key_repr(), "None");
        assert_eq!(Some(5u64).key_repr(), "5");
        assert_eq!(vec![1u8, 2].key_repr(), "[1, 2]");
    }

    #[test]
    fn test_opaque_values_collapse_to_type_name() {
        let a = Receiver;
        let b = Receiver;
        assert_eq!(a.key_repr(), b.key_repr());
        assert_eq!(a.key_repr(), "<concord::cache::key::tests::Receiver>");
        assert_eq!((&a).key_repr(), a.key_repr());
        assert_eq!(Arc::new(Receiver).key_repr(), a.key_repr());
    }

    #[test]
    fn test_key_is_deterministic() {
        let args = || Args::new().arg(&Receiver).arg(&123u64).kwarg("flag", &true);
        let first = make_key("m::f", &args(), false);
        let second = make_key("m::f", &args(), false);
        assert_eq!(first, second);
        assert_eq!(first, "m::f:<concord::cache::key::tests::Receiver>:123:\"flag\":true");
    }

    #[test]
    fn test_varying_an_argument_changes_the_key() {
        let base = make_key("m::f", &Args::new().arg(&1u64).kwarg("x", &2u64), false);
        let positional = make_key("m::f", &Args::new().arg(&9u64).kwarg("x", &2u64), false);
        let keyword = make_key("m::f", &Args::new().arg(&1u64).kwarg("x", &3u64), false);
        let function = make_key("m::g", &Args::new().arg(&1u64).kwarg("x", &2u64), false);
        assert_ne!(base, positional);
        assert_ne!(base, keyword);
        assert_ne!(base, function);
    }

    #[test]
    fn test_connection_and_pool_never_change_the_key() {
        let plain = make_key("m::f", &Args::new().arg(&1u64), false);
        let with_connection = make_key("m::f", &Args::new().arg(&1u64).kwarg("connection", &Pool), false);
        let with_pool = make_key("m::f", &Args::new().arg(&1u64).kwarg("pool", &"anything"), false);
        assert_eq!(plain, with_connection);
        assert_eq!(plain, with_pool);
    }

    #[test]
    fn test_ignore_kwargs() {
        let a = Args::new().arg(&1u64).kwarg("check_bypass", &true);
        let b = Args::new().arg(&1u64).kwarg("check_bypass", &false);
        assert_eq!(make_key("m::f", &a, true), make_key("m::f", &b, true));
        assert_ne!(make_key("m::f", &a, false), make_key("m::f", &b, false));
    }

    #[test]
    fn test_tuple_args() {
        let args = (1u64, "x").to_args();
        assert_eq!(args.positional(), &["1".to_string(), "\"x\"".to_string()]);
        assert!(args.keywords().is_empty());
    }
}
