//! Share tokens for analysis logs
//!
//! Packs an event log into a single URL-safe string so a session's verdict
//! history can be handed to a viewer without shipping the file.

pub mod encoder;
pub use encoder::{CompactEvent, ExportData, decode_token, encode_log};

use crate::Engine;
use anyhow::{Context, Result};
use std::path::Path;

/// Encode a log file into a share token
///
/// # Arguments
/// * `log_path` - Path to a log written by the engine
///
/// # Errors
/// Returns an error if the file cannot be read or encoded.
///
/// # Example
///
/// ```no_run
/// let token = resalloc::export::export("analysis.log").expect("Failed to export log");
/// println!("{token}");
/// ```
pub fn export<P: AsRef<Path>>(log_path: P) -> Result<String> {
    encode_log(&log_path).with_context(|| {
        format!(
            "Failed to export log file {}",
            log_path.as_ref().display()
        )
    })
}

/// Encode the log of a running engine
///
/// Flushes pending entries first so the token covers every request handled
/// so far.
///
/// # Errors
/// Returns an error if the engine has no log, the flush times out, or the
/// file cannot be encoded.
pub fn export_engine(engine: &Engine) -> Result<String> {
    let path = engine
        .log_file()
        .context("No active log file")?
        .to_path_buf();
    engine.flush().context("Failed to flush pending log entries")?;
    export(path)
}
