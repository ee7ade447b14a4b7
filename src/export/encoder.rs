use crate::core::types::{LogEntry, Operation, Verdict};
use anyhow::{Context, Result};
use base64::alphabet::URL_SAFE;
use base64::engine::{Engine as _, general_purpose};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

// Event format: (operation_code, verdict_code, processes, timestamp)
pub type CompactEvent = (u8, u8, Vec<String>, f64);

/// Compact output structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub events: Vec<CompactEvent>,
}

fn base64_engine() -> general_purpose::GeneralPurpose {
    general_purpose::GeneralPurpose::new(&URL_SAFE, general_purpose::PAD)
}

/// Converts an event log to a compact, compressed, URL-safe token
///
/// Lines that are not log entries are skipped.
///
/// # Arguments
/// * `log_path` - Path to the log file
///
/// # Errors
/// Returns an error if the file cannot be read or the data cannot be encoded.
pub fn encode_log<P: AsRef<Path>>(log_path: P) -> Result<String> {
    let file = File::open(log_path).context("Failed to open log file")?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read line from log file")?;
        if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
            events.push(compact(entry));
        }
    }

    encode(&ExportData { events })
}

/// MessagePack, then gzip, then base64url
pub fn encode(data: &ExportData) -> Result<String> {
    let msgpack = rmp_serde::to_vec(data).context("Failed to convert data to MessagePack")?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&msgpack)
        .context("Failed to compress data")?;
    let compressed = encoder.finish().context("Failed to finish compression")?;

    Ok(base64_engine().encode(compressed))
}

/// Reverse of [`encode`]
///
/// # Errors
/// Returns an error if any of the three layers is malformed.
pub fn decode_token(token: &str) -> Result<ExportData> {
    let compressed = base64_engine()
        .decode(token.trim())
        .context("Token is not valid base64url")?;

    let mut decoder = GzDecoder::new(&compressed[..]);
    let mut msgpack = Vec::new();
    decoder
        .read_to_end(&mut msgpack)
        .context("Failed to decompress token")?;

    rmp_serde::from_slice(&msgpack).context("Failed to decode MessagePack payload")
}

fn compact(entry: LogEntry) -> CompactEvent {
    (
        operation_code(entry.operation),
        verdict_code(entry.verdict),
        entry.processes,
        entry.timestamp,
    )
}

pub fn operation_code(operation: Operation) -> u8 {
    match operation {
        Operation::Simulate => 0,
        Operation::BankerSafe => 1,
        Operation::BankerRequest => 2,
        Operation::Detect => 3,
        Operation::DetectMulti => 4,
        Operation::Recovery => 5,
    }
}

pub fn verdict_code(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Completed => 0,
        Verdict::Safe => 1,
        Verdict::Unsafe => 2,
        Verdict::Granted => 3,
        Verdict::Denied => 4,
        Verdict::Deadlock => 5,
        Verdict::NoDeadlock => 6,
        Verdict::VictimSelected => 7,
        Verdict::Rejected => 8,
    }
}
