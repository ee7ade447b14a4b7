//! Event logging for analysis requests
//!
//! Compiled only with the `logging` feature. Each handled request is written
//! as one JSON line that `resalloc export` can later pack into a share token.

mod event_logger;

pub use event_logger::{EventLogger, LoggerCommand};
