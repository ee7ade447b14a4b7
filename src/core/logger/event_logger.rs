//! Logger for recording analysis outcomes
//!
//! Every request an [`Engine`](crate::Engine) handles becomes one JSON line:
//! the operation, its verdict, the processes the verdict is about, and a
//! timestamp. File I/O happens on a dedicated writer thread fed through a
//! channel, so recording an event never blocks the analysis call.

use crate::core::types::{LogEntry, Operation, Verdict};
use anyhow::{Context, Result};
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands for controlling the writer thread
#[derive(Debug)]
pub enum LoggerCommand {
    /// Write a log entry to the file
    LogEntry(LogEntry),
    /// Flush all pending entries to disk and signal completion
    Flush(Sender<()>),
}

/// Event logger writing JSON lines from a background thread
pub struct EventLogger {
    /// Channel sender for the writer thread
    sender: Sender<LoggerCommand>,
    /// Flag indicating if a flush operation is in progress
    flushing: Arc<AtomicBool>,
    /// File actually written (placeholder expanded)
    path: PathBuf,
}

impl std::fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogger")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush logs during EventLogger drop: {e:?}");
        }
    }
}

impl EventLogger {
    /// Create a new logger that writes to the specified file
    ///
    /// # Arguments
    /// * `path` - Path to the log file. If it contains "{timestamp}", that part
    ///   is replaced with the current time as `%Y%m%d_%H%M%S`.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created or the file
    /// cannot be opened for writing.
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_timestamp(path.as_ref());

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).context("Failed to create log directory")?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        let (tx, rx) = unbounded::<LoggerCommand>();
        let flushing = Arc::new(AtomicBool::new(false));

        thread::Builder::new()
            .name("resalloc-logger".into())
            .spawn(move || writer_thread(file, rx))
            .context("Failed to spawn logger thread")?;

        Ok(EventLogger {
            sender: tx,
            flushing,
            path,
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one analysis event
    ///
    /// Non-blocking; a closed channel is reported on stderr and otherwise ignored.
    pub fn log_event(&self, operation: Operation, verdict: Verdict, processes: Vec<String>) {
        let now = Utc::now();
        let timestamp = now.timestamp() as f64 + now.timestamp_subsec_micros() as f64 / 1_000_000.0;

        let entry = LogEntry {
            operation,
            verdict,
            processes,
            timestamp,
        };

        if let Err(e) = self.sender.send(LoggerCommand::LogEntry(entry)) {
            eprintln!("Failed to send log entry: {e:?}");
        }
    }

    /// Block until every entry sent so far is on disk
    ///
    /// A flush already in progress on another thread makes this a no-op.
    ///
    /// # Errors
    /// Returns an error if the writer thread is gone or does not confirm in time.
    pub fn flush(&self) -> Result<()> {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let result = self.request_flush();
        self.flushing.store(false, Ordering::SeqCst);
        result
    }

    fn request_flush(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.sender
            .send(LoggerCommand::Flush(done_tx))
            .context("Logger thread is not running")?;
        done_rx
            .recv_timeout(FLUSH_TIMEOUT)
            .map_err(|_| anyhow::anyhow!("Flush operation timed out"))
    }
}

fn expand_timestamp(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw.contains("{timestamp}") {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        PathBuf::from(raw.replace("{timestamp}", &stamp))
    } else {
        path.to_path_buf()
    }
}

/// Writer loop: one JSON line per entry, flushed as it goes
fn writer_thread(file: File, rx: Receiver<LoggerCommand>) {
    let mut writer = BufWriter::new(file);

    while let Ok(cmd) = rx.recv() {
        match cmd {
            LoggerCommand::LogEntry(entry) => {
                if let Ok(json) = serde_json::to_string(&entry)
                    && let Err(e) = writeln!(writer, "{json}").and_then(|_| writer.flush())
                {
                    eprintln!("Logger write error: {e:?}");
                }
            }
            LoggerCommand::Flush(responder) => {
                if let Err(e) = writer.flush() {
                    eprintln!("Logger flush error: {e:?}");
                }
                let _ = responder.send(());
            }
        }
    }

    if let Err(e) = writer.flush() {
        eprintln!("Logger final flush error: {e:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_basic_logging() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("basic.log");

        let logger = EventLogger::with_file(&log_path).unwrap();
        logger.log_event(Operation::BankerSafe, Verdict::Safe, vec!["P2".into(), "P1".into()]);
        logger.log_event(Operation::Detect, Verdict::NoDeadlock, vec![]);
        logger.flush().unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"operation\":\"BankerSafe\""));
        assert!(lines[0].contains("\"processes\":[\"P2\",\"P1\"]"));

        let entry: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(entry.verdict, Verdict::NoDeadlock);
    }

    #[test]
    fn test_flush_idempotence() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("flush_test.log");

        let logger = EventLogger::with_file(&log_path).unwrap();
        for _ in 0..10 {
            logger.log_event(Operation::Simulate, Verdict::Completed, vec![]);
        }

        logger.flush().unwrap();
        logger.flush().unwrap();
        logger.flush().unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 10);
    }

    #[test]
    fn test_timestamp_placeholder_and_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = temp_dir.path().join("nested/run_{timestamp}.log");

        let logger = EventLogger::with_file(&pattern).unwrap();
        let written = logger.path().to_path_buf();
        assert!(!written.to_string_lossy().contains("{timestamp}"));
        assert!(written.exists());
    }

    #[test]
    fn test_logger_drop_flushes() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("drop_test.log");

        {
            let logger = EventLogger::with_file(&log_path).unwrap();
            logger.log_event(Operation::Recovery, Verdict::VictimSelected, vec!["P1".into()]);
        }

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("\"verdict\":\"VictimSelected\""));
    }
}
