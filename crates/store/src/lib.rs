//! Persistence for candles, strategy predictions and consensus rows.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
