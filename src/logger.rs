//! The logging context owned by the application
//!
//! A [`Logger`] is created once with [`Logger::initialize`], shared as
//! `Arc<Logger>` with every producer and reader, and torn down once with
//! [`Logger::shutdown`]. There is no global instance.
//!
//! Appends hold the lifecycle lock shared until their observers have run and
//! `shutdown` takes it exclusively, so an append either completes (stored and
//! delivered) before teardown starts or fails with
//! [`LoggerError::NotInitialized`]. Observers must therefore not append or
//! call `shutdown` from inside `on_entry`.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{LoggerError, Result};
use crate::file_log::FileLogger;
use crate::notify::{LiveFeed, Notifier, Observer, SubscriptionId, Watch};
use crate::observability::MetricsSnapshot;
use crate::store::{BoundedStore, KindSet, LogEntry, MsgKind, PeerEvent};

struct FileSink {
    writer: Arc<FileLogger>,
    subscription: SubscriptionId,
}

/// Message and peer-event ledger with observers and an optional file backup
pub struct Logger {
    running: RwLock<bool>,
    messages: BoundedStore<LogEntry>,
    peers: BoundedStore<PeerEvent>,
    message_observers: Notifier<LogEntry>,
    peer_observers: Notifier<PeerEvent>,
    file_sink: Option<FileSink>,
}

/// Point-in-time sizes, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LoggerStats {
    pub messages: usize,
    pub peer_events: usize,
    pub next_message_id: i64,
    pub next_peer_id: i64,
    pub message_observers: usize,
    pub peer_observers: usize,
}

impl Logger {
    /// Validate `config`, start the file writer if enabled and return the context
    pub fn initialize(config: Config) -> Result<Arc<Self>> {
        config.validate()?;

        let message_observers = Notifier::new("messages");
        let file_sink = if config.file_log.enabled {
            let writer = Arc::new(FileLogger::start(config.file_log.clone())?);
            let subscription = message_observers.subscribe(writer.clone());
            Some(FileSink {
                writer,
                subscription,
            })
        } else {
            None
        };

        info!(
            capacity = config.store.capacity,
            peer_capacity = config.store.peer_capacity,
            file_log = config.file_log.enabled,
            "Logger initialized"
        );

        Ok(Arc::new(Self {
            running: RwLock::new(true),
            messages: BoundedStore::new(config.store.capacity),
            peers: BoundedStore::new(config.store.peer_capacity),
            message_observers,
            peer_observers: Notifier::new("peers"),
            file_sink,
        }))
    }

    pub fn is_running(&self) -> bool {
        *self.running.read_recursive()
    }

    /// Record a message and return its id
    pub fn append(&self, text: impl Into<String>, kind: MsgKind) -> Result<i64> {
        let _running = self.begin_append()?;
        let text = text.into();

        let entry = self.messages.append_with(|id| LogEntry {
            id,
            kind,
            timestamp: Utc::now().timestamp(),
            text,
        });
        self.message_observers.notify(&entry);

        Ok(entry.id)
    }

    /// [`append`](Self::append) with [`MsgKind::Normal`]
    pub fn log(&self, text: impl Into<String>) -> Result<i64> {
        self.append(text, MsgKind::Normal)
    }

    /// Record a peer ban event and return its id
    pub fn append_peer_event(
        &self,
        address: impl Into<String>,
        blocked: bool,
        reason: impl Into<String>,
    ) -> Result<i64> {
        let _running = self.begin_append()?;
        let address = address.into();
        let reason = reason.into();

        let event = self.peers.append_with(|id| PeerEvent {
            id,
            blocked,
            timestamp: Utc::now().timestamp(),
            address,
            reason,
        });
        self.peer_observers.notify(&event);

        Ok(event.id)
    }

    /// Messages newer than `checkpoint` (`NO_CHECKPOINT` for everything)
    pub fn query(&self, checkpoint: i64) -> Result<Vec<LogEntry>> {
        self.ensure_running()?;
        Ok(self.messages.query(checkpoint))
    }

    /// Like [`query`](Self::query), restricted to the given kinds
    pub fn query_kinds(&self, checkpoint: i64, kinds: impl Into<KindSet>) -> Result<Vec<LogEntry>> {
        self.ensure_running()?;
        let kinds = kinds.into();
        Ok(self
            .messages
            .query_where(checkpoint, |entry| kinds.contains(entry.kind)))
    }

    pub fn query_peer_events(&self, checkpoint: i64) -> Result<Vec<PeerEvent>> {
        self.ensure_running()?;
        Ok(self.peers.query(checkpoint))
    }

    pub fn subscribe<O>(&self, observer: O) -> Result<SubscriptionId>
    where
        O: Observer<LogEntry> + 'static,
    {
        self.ensure_running()?;
        Ok(self.message_observers.subscribe(Arc::new(observer)))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.message_observers.unsubscribe(id)
    }

    pub fn subscribe_peers<O>(&self, observer: O) -> Result<SubscriptionId>
    where
        O: Observer<PeerEvent> + 'static,
    {
        self.ensure_running()?;
        Ok(self.peer_observers.subscribe(Arc::new(observer)))
    }

    pub fn unsubscribe_peers(&self, id: SubscriptionId) -> bool {
        self.peer_observers.unsubscribe(id)
    }

    /// Live message feed buffering up to `capacity` entries per receiver
    pub fn watch(&self, capacity: usize) -> Result<Watch<LogEntry>> {
        let (feed, receiver) = LiveFeed::new(capacity);
        let id = self.subscribe(feed)?;
        Ok(Watch { id, receiver })
    }

    pub fn watch_peers(&self, capacity: usize) -> Result<Watch<PeerEvent>> {
        let (feed, receiver) = LiveFeed::new(capacity);
        let id = self.subscribe_peers(feed)?;
        Ok(Watch { id, receiver })
    }

    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            messages: self.messages.len(),
            peer_events: self.peers.len(),
            next_message_id: self.messages.next_id(),
            next_peer_id: self.peers.next_id(),
            message_observers: self.message_observers.len(),
            peer_observers: self.peer_observers.len(),
        }
    }

    /// `None` when the file writer is disabled
    pub fn writer_metrics(&self) -> Option<MetricsSnapshot> {
        self.file_sink.as_ref().map(|sink| sink.writer.metrics())
    }

    /// Flush and close the file writer, drop observers and release both stores
    ///
    /// Every later call on this logger, including a second `shutdown`,
    /// returns [`LoggerError::NotInitialized`].
    pub fn shutdown(&self) -> Result<()> {
        let mut running = self.running.write();
        if !*running {
            error!("Logger shut down twice");
            return Err(LoggerError::NotInitialized);
        }
        *running = false;

        let writer_result = match &self.file_sink {
            Some(sink) => {
                self.message_observers.unsubscribe(sink.subscription);
                sink.writer.shutdown()
            }
            None => Ok(()),
        };

        self.message_observers.clear();
        self.peer_observers.clear();
        self.messages.release();
        self.peers.release();

        info!("Logger shut down");
        writer_result.map_err(LoggerError::from)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            error!("Logger used after shutdown");
            Err(LoggerError::NotInitialized)
        }
    }

    /// Shared lifecycle guard, held until the new entry has been delivered
    fn begin_append(&self) -> Result<RwLockReadGuard<'_, bool>> {
        let running = self.running.read();
        if *running {
            Ok(running)
        } else {
            error!("Logger used after shutdown");
            Err(LoggerError::NotInitialized)
        }
    }
}
