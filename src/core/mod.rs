//! Core seams.
//!
//! Time and persistence are the only two things the ledgers consume from the
//! outside world. Both are traits so tests can inject fakes.

pub mod clock;
pub mod store;

// Re-export core types
pub use clock::{until_next_midnight, Clock, ManualClock, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
