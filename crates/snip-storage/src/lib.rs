//! [`UrlStore`](snip_core::UrlStore) implementations.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;
pub use snip_core::store::Result;
pub use snip_core::{NewUrlRecord, ReadStore, StorageError, UrlRecord, UrlStore};
