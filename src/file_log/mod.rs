//! Rotating on-disk backup of accepted log messages
//!
//! [`FileLogger`] registers as an observer of the message stream and hands
//! each entry to a dedicated writer thread. The thread appends one line per
//! entry to `<directory>/<base_name>.log`:
//!
//! ```text
//! 2026-10-19T14:02:11+02:00 - (W) Tracker unreachable
//! ```
//!
//! ## Rotation
//!
//! Once the active file reaches `max_file_size` (or on the first write when
//! `rotate_on_startup` is set and the file is not empty) it is closed and
//! either renamed to `<base_name>.<YYYYmmdd-HHMMSS>.log` or discarded,
//! depending on `archive`.
//!
//! ## Retention
//!
//! With retention enabled, archives older than `max_age` days/months/years
//! are deleted at startup and after each rotation, then only the newest
//! `max_archives` are kept.
//!
//! ## Failures
//!
//! I/O errors are reported through `tracing` and counted in
//! [`WriterMetrics`](crate::observability::WriterMetrics). They are never
//! logged back into the store, and the writer keeps retrying on the next
//! entry.

pub mod error;
pub mod retention;
mod worker;
mod writer;

pub use error::{FileLogError, Result};
pub use retention::{PruneStats, list_archives, prune_archives};
pub use worker::FileLogger;
pub use writer::{RotatingFile, format_line};
