//! Background writer fed through a bounded queue
//!
//! Producers only pay for a channel send. The writer thread owns the file
//! exclusively and does all disk I/O. When the queue is full the oldest
//! queued entries are dropped and counted, so a slow disk never blocks
//! `append`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use super::error::{FileLogError, Result};
use super::writer::RotatingFile;
use crate::config::FileLogConfig;
use crate::notify::{Observer, ObserverResult};
use crate::observability::{MetricsSnapshot, WriterMetrics};
use crate::store::LogEntry;

#[derive(Clone, Debug)]
enum Command {
    Entry(LogEntry),
    Shutdown,
}

/// Observer that persists every delivered entry to rotating files
pub struct FileLogger {
    tx: broadcast::Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closing: Arc<AtomicBool>,
    metrics: Arc<WriterMetrics>,
}

impl FileLogger {
    /// Open the active file and spawn the writer thread
    ///
    /// Fails if the directory or file cannot be opened; later I/O errors are
    /// handled by the writer thread itself.
    pub fn start(config: FileLogConfig) -> Result<Self> {
        let metrics = Arc::new(WriterMetrics::new());
        let mut file = RotatingFile::new(config.clone(), metrics.clone());
        file.open()?;
        file.apply_retention();

        let (tx, rx) = broadcast::channel(config.queue_capacity.max(1));
        let closing = Arc::new(AtomicBool::new(false));

        let worker = {
            let closing = closing.clone();
            let metrics = metrics.clone();
            thread::Builder::new()
                .name("logledger-writer".to_string())
                .spawn(move || run(file, rx, closing, metrics))?
        };

        info!(
            directory = %config.directory.display(),
            queue_capacity = config.queue_capacity,
            "File logger started"
        );

        Ok(Self {
            tx,
            worker: Mutex::new(Some(worker)),
            closing,
            metrics,
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Queue an entry for the writer thread
    pub fn submit(&self, entry: LogEntry) -> Result<()> {
        if self.is_closed() {
            return Err(FileLogError::Closed);
        }
        // Only fails once the writer thread has exited.
        self.tx
            .send(Command::Entry(entry))
            .map(|_| ())
            .map_err(|_| FileLogError::Closed)
    }

    /// Drain queued entries, flush, close the file and join the thread
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };

        self.closing.store(true, Ordering::Release);
        let _ = self.tx.send(Command::Shutdown);

        worker.join().map_err(|_| FileLogError::WorkerPanicked)?;
        info!(metrics = ?self.metrics.snapshot(), "File logger stopped");
        Ok(())
    }
}

impl Observer<LogEntry> for FileLogger {
    fn on_entry(&self, entry: &LogEntry) -> ObserverResult {
        self.submit(entry.clone())?;
        Ok(())
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(error = %err, "File logger did not shut down cleanly");
        }
    }
}

fn run(
    mut file: RotatingFile,
    mut rx: broadcast::Receiver<Command>,
    closing: Arc<AtomicBool>,
    metrics: Arc<WriterMetrics>,
) {
    debug!("Writer thread running");

    loop {
        match rx.blocking_recv() {
            Ok(Command::Entry(entry)) => {
                persist(&mut file, &entry, &metrics);
                if rx.is_empty() {
                    if let Err(err) = file.flush() {
                        metrics.write_failed();
                        error!(error = %err, "Failed to flush log file");
                        file.reset();
                    }
                }
            }
            Ok(Command::Shutdown) | Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(dropped)) => {
                metrics.entries_dropped(dropped);
                warn!(dropped, "Writer queue overflowed, oldest entries dropped");
            }
        }

        // The shutdown marker itself may have been dropped by an overflow.
        if closing.load(Ordering::Acquire) && rx.is_empty() {
            break;
        }
    }

    if let Err(err) = file.close() {
        metrics.write_failed();
        error!(error = %err, "Failed to close log file");
    }
    debug!("Writer thread exited");
}

fn persist(file: &mut RotatingFile, entry: &LogEntry, metrics: &WriterMetrics) {
    if !file.is_open() {
        if let Err(err) = file.open() {
            metrics.write_failed();
            error!(id = entry.id, error = %err, "Log file unavailable, entry not written");
            return;
        }
    }

    if let Err(err) = file.write_entry(entry) {
        metrics.write_failed();
        error!(id = entry.id, error = %err, "Failed to write log entry");
        file.reset();
        return;
    }
    metrics.entry_written();

    if let Err(err) = file.rotate_if_needed() {
        metrics.write_failed();
        error!(error = %err, "Log rotation failed");
        file.reset();
    }
}
