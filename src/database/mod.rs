//! Database module exports.
//!
//! The store itself lives outside this crate; `GuildStore` is the seam it
//! plugs into and `MemoryStore` backs the binary and the tests.

mod memory;
mod models;
mod repository;
mod store;

pub use memory::MemoryStore;
pub use models::*;
pub use repository::ModConfigRepo;
pub use store::{GuildStore, StoreError};
