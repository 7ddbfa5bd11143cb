use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use super::error::{FileLogError, Result};
use super::retention::{archive_path, prune_archives};
use crate::config::FileLogConfig;
use crate::observability::WriterMetrics;
use crate::store::LogEntry;

const WRITE_BUFFER_SIZE: usize = 16 * 1024;

/// One persisted line: `<RFC3339 local time> - (<tag>) <text>\n`
///
/// Line breaks and backslashes in the text are escaped so every entry stays
/// on a single line.
pub fn format_line(entry: &LogEntry) -> String {
    let time = DateTime::<Utc>::from_timestamp(entry.timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, false);
    format!("{} - ({}) {}\n", time, entry.kind.tag(), escape_text(&entry.text))
}

fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['\\', '\n', '\r']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

struct OpenFile {
    writer: BufWriter<File>,
    size: u64,
}

enum State {
    Uninitialized,
    Open(OpenFile),
    Closed,
}

/// The active log file plus its rotation and retention rules
///
/// `Uninitialized -> Open -> (rotate -> Open)* -> Closed`. Writes are only
/// accepted while open; `Closed` is terminal.
pub struct RotatingFile {
    config: FileLogConfig,
    state: State,
    startup_rotation_pending: bool,
    metrics: Arc<WriterMetrics>,
}

impl RotatingFile {
    pub fn new(config: FileLogConfig, metrics: Arc<WriterMetrics>) -> Self {
        let startup_rotation_pending = config.rotate_on_startup;
        Self {
            config,
            state: State::Uninitialized,
            startup_rotation_pending,
            metrics,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Bytes in the active file, if open
    pub fn size(&self) -> Option<u64> {
        match &self.state {
            State::Open(open) => Some(open.size),
            _ => None,
        }
    }

    /// Open (or reopen after a failure) the active file in append mode
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            State::Open(_) => return Ok(()),
            State::Closed => return Err(FileLogError::Closed),
            State::Uninitialized => {}
        }

        fs::create_dir_all(&self.config.directory)?;
        let path = self.config.active_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();

        self.state = State::Open(OpenFile {
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            size,
        });
        info!(path = %path.display(), size, "Opened log file");
        Ok(())
    }

    /// Append one entry
    ///
    /// The first write after start rotates a non-empty file when
    /// `rotate_on_startup` is set.
    pub fn write_entry(&mut self, entry: &LogEntry) -> Result<()> {
        self.ensure_writable()?;

        if self.startup_rotation_pending {
            self.startup_rotation_pending = false;
            if self.size().unwrap_or(0) > 0 {
                debug!("Rotating existing log file on startup");
                self.rotate()?;
            }
        }

        let line = format_line(entry);
        let State::Open(open) = &mut self.state else {
            return Err(FileLogError::NotOpen);
        };
        open.writer.write_all(line.as_bytes())?;
        open.size += line.len() as u64;
        Ok(())
    }

    /// Rotate if the active file reached `max_file_size`
    pub fn rotate_if_needed(&mut self) -> Result<bool> {
        match self.size() {
            Some(size) if size >= self.config.max_file_size.as_u64() => {
                self.rotate()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Close the active file, archive or discard it, and open a fresh one
    pub fn rotate(&mut self) -> Result<()> {
        self.ensure_writable()?;

        if let State::Open(mut open) = std::mem::replace(&mut self.state, State::Uninitialized) {
            open.writer.flush()?;
        }

        let active = self.config.active_path();
        if self.config.archive {
            let target = archive_path(&self.config.directory, &self.config.base_name, Local::now());
            fs::rename(&active, &target)?;
            info!(archive = %target.display(), "Archived log file");
        } else {
            match fs::remove_file(&active) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            info!(path = %active.display(), "Discarded rotated log file");
        }
        self.metrics.rotated();

        self.open()?;
        self.apply_retention();
        Ok(())
    }

    /// Prune archives when retention is enabled; failures are only reported
    pub fn apply_retention(&self) {
        let retention = &self.config.retention;
        if !retention.enabled {
            return;
        }

        match prune_archives(
            &self.config.directory,
            &self.config.base_name,
            retention,
            Local::now(),
        ) {
            Ok(stats) => self.metrics.archives_pruned(stats.total() as u64),
            Err(err) => warn!(error = %err, "Archive pruning failed"),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.state {
            State::Open(open) => Ok(open.writer.flush()?),
            State::Uninitialized => Ok(()),
            State::Closed => Err(FileLogError::Closed),
        }
    }

    /// Drop the handle after a failure so the next write reopens the file
    pub fn reset(&mut self) {
        if let State::Open(_) = self.state {
            self.state = State::Uninitialized;
        }
    }

    /// Flush and close; further writes are rejected
    pub fn close(&mut self) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, State::Closed);
        if let State::Open(mut open) = previous {
            open.writer.flush()?;
            info!(path = %self.config.active_path().display(), "Closed log file");
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.state {
            State::Open(_) => Ok(()),
            State::Uninitialized => Err(FileLogError::NotOpen),
            State::Closed => Err(FileLogError::Closed),
        }
    }
}
