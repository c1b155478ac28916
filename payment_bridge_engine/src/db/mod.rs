//! Session store backends.
//!
//! [`MemorySessionStore`] keeps sessions in process memory and loses them on restart. [`SqliteSessionStore`] persists
//! them in a SQLite database.
mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemorySessionStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;
