//! Bounded in-memory event stores
//!
//! Two instances live for the lifetime of a [`Logger`](crate::Logger): one
//! for log messages and one for peer ban events. Both use
//! [`BoundedStore`], each with its own id counter and capacity.
//!
//! Readers poll with the highest id they have seen:
//!
//! ```rust
//! use logledger::store::{BoundedStore, NO_CHECKPOINT};
//!
//! let store = BoundedStore::new(3);
//! for text in ["A", "B", "C", "D"] {
//!     store.append_with(|id| (id, text));
//! }
//! assert_eq!(store.query(NO_CHECKPOINT), vec![(1, "B"), (2, "C"), (3, "D")]);
//! assert_eq!(store.query(2), vec![(3, "D")]);
//! ```

mod bounded;
mod entry;

pub use bounded::{BoundedStore, NO_CHECKPOINT};
pub use entry::{KindSet, LogEntry, MsgKind, PeerEvent, UnknownKind};

/// Default retained message count
pub const DEFAULT_CAPACITY: usize = 20_000;
