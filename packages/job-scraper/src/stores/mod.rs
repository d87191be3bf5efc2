//! Job store implementations.
//!
//! Available backends:
//! - `MemoryStore` - In-memory storage (always available)
//! - `FirebaseStore` - Firebase Realtime Database over REST
//! - `SqliteStore` - SQLite file-based storage (requires `sqlite` feature)

pub mod firebase;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
