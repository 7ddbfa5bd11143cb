//! Bounded in-memory log ledger with observers and rotating file backup
//!
//! ```rust
//! use logledger::{Logger, MsgKind, NO_CHECKPOINT};
//! use logledger::config::Config;
//!
//! let logger = Logger::initialize(Config::in_memory()).unwrap();
//! logger.append("Listening on port 6881", MsgKind::Info).unwrap();
//!
//! let entries = logger.query(NO_CHECKPOINT).unwrap();
//! assert_eq!(entries[0].id, 0);
//! logger.shutdown().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod file_log;
pub mod humanize;
pub mod logger;
pub mod notify;
pub mod observability;
pub mod store;

pub use error::LoggerError;
pub use logger::{Logger, LoggerStats};
pub use notify::{Observer, ObserverResult, SubscriptionId, Watch};
pub use store::{KindSet, LogEntry, MsgKind, NO_CHECKPOINT, PeerEvent};
