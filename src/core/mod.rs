// Core types
pub mod types;
pub use types::*;

pub mod error;
pub mod model;

// Logging functionality
#[cfg(feature = "logging")]
pub mod logger;

// Analyzers
pub mod banker;
pub mod detector;
pub mod graph;
pub mod recovery;
pub mod simulation;
mod work_finish;

use crate::protocol::{self, ErrorResponse, Request, Response};
use anyhow::Result;
use recovery::{MinAllocation, VictimPolicy};
use std::path::{Path, PathBuf};

#[cfg(feature = "logging")]
use anyhow::Context;

type DeadlockCallback = Box<dyn Fn(DeadlockReport) + Send + Sync + 'static>;

/// Engine configuration
///
/// Collects settings and turns them into an [`Engine`] with [`build`](Self::build).
pub struct EngineConfig {
    log_path: Option<PathBuf>,
    policy: Box<dyn VictimPolicy>,
    callback: Option<DeadlockCallback>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with default settings
    ///
    /// By default:
    /// - Logging is disabled
    /// - Recovery picks the process holding the fewest units
    /// - No deadlock callback is installed
    pub fn new() -> Self {
        EngineConfig {
            log_path: None,
            policy: Box::new(MinAllocation),
            callback: None,
        }
    }

    /// Activate the event log and set the path for the log file
    ///
    /// # Arguments
    /// * `path` - Path to the log file. If the path contains "{timestamp}",
    ///   it will be replaced with the current timestamp.
    ///
    /// # Returns
    /// The builder for method chaining
    pub fn with_log<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Victim policy used by recovery requests that do not name one
    pub fn victim_policy<P: VictimPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Set a callback to be invoked when a request confirms a deadlock
    ///
    /// # Arguments
    /// * `callback` - Function to call with the deadlock report
    ///
    /// # Returns
    /// The builder for method chaining
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(DeadlockReport) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Build the engine with the configured settings
    ///
    /// # Errors
    /// Returns an error if the log file cannot be opened, or if a log path was
    /// given to a build without the `logging` feature.
    pub fn build(self) -> Result<Engine> {
        #[cfg(feature = "logging")]
        let logger = match &self.log_path {
            Some(path) => Some(
                logger::EventLogger::with_file(path).context("Failed to initialize logger")?,
            ),
            None => None,
        };

        #[cfg(not(feature = "logging"))]
        if let Some(path) = &self.log_path {
            anyhow::bail!(
                "cannot log to {}: built without the `logging` feature",
                path.display()
            );
        }

        Ok(Engine {
            policy: self.policy,
            callback: self.callback,
            #[cfg(feature = "logging")]
            logger,
        })
    }
}

/// Request dispatcher
///
/// Validates each request, runs the matching analyzer, records the outcome
/// in the event log and reports positive deadlock verdicts to the callback.
/// Holds no analysis state between calls.
pub struct Engine {
    policy: Box<dyn VictimPolicy>,
    callback: Option<DeadlockCallback>,
    #[cfg(feature = "logging")]
    logger: Option<logger::EventLogger>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("policy", &self.policy.name())
            .field("callback", &self.callback.is_some())
            .field("log_file", &self.log_file())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with default settings and no log
    pub fn new() -> Self {
        Engine {
            policy: Box::new(MinAllocation),
            callback: None,
            #[cfg(feature = "logging")]
            logger: None,
        }
    }

    pub fn builder() -> EngineConfig {
        EngineConfig::new()
    }

    /// File the event log is written to, if logging is active
    pub fn log_file(&self) -> Option<&Path> {
        #[cfg(feature = "logging")]
        {
            self.logger.as_ref().map(|logger| logger.path())
        }
        #[cfg(not(feature = "logging"))]
        {
            None
        }
    }

    /// Evaluate one request
    ///
    /// # Errors
    /// Returns the validation error of the request's snapshot. The failure is
    /// still recorded in the event log with a `Rejected` verdict.
    pub fn handle(&self, request: &Request) -> error::Result<Response> {
        let operation = request.operation();
        match protocol::dispatch(request, self.policy.as_ref()) {
            Ok(response) => {
                let involved = response.involved();
                if let Some(source) = response.deadlock_source() {
                    self.report(source, involved.clone());
                }
                self.record(operation, response.verdict(), involved);
                Ok(response)
            }
            Err(err) => {
                self.record(operation, Verdict::Rejected, Vec::new());
                Err(err)
            }
        }
    }

    /// Evaluate a JSON request and answer with a JSON value
    ///
    /// Never fails: unparsable input becomes a `MalformedRequest` error body
    /// and validation failures become their own error bodies.
    pub fn handle_value(&self, input: &str) -> serde_json::Value {
        let request: Request = match serde_json::from_str(input) {
            Ok(request) => request,
            Err(e) => return error_value(&ErrorResponse::new("MalformedRequest", e.to_string())),
        };

        match self.handle(&request) {
            Ok(response) => serde_json::to_value(&response).unwrap_or_else(|e| {
                error_value(&ErrorResponse::new("Serialization", e.to_string()))
            }),
            Err(err) => error_value(&ErrorResponse::from(&err)),
        }
    }

    /// Evaluate a JSON request and answer with a compact JSON string
    pub fn handle_json(&self, input: &str) -> String {
        self.handle_value(input).to_string()
    }

    /// Block until all recorded events are on disk
    ///
    /// # Errors
    /// Returns an error if the writer thread does not confirm in time.
    pub fn flush(&self) -> Result<()> {
        #[cfg(feature = "logging")]
        if let Some(logger) = &self.logger {
            logger.flush()?;
        }
        Ok(())
    }

    fn report(&self, source: DeadlockSource, processes: Vec<String>) {
        if let Some(callback) = &self.callback {
            callback(DeadlockReport {
                source,
                processes,
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
        }
    }

    #[cfg(feature = "logging")]
    fn record(&self, operation: Operation, verdict: Verdict, processes: Vec<String>) {
        if let Some(logger) = &self.logger {
            logger.log_event(operation, verdict, processes);
        }
    }

    #[cfg(not(feature = "logging"))]
    fn record(&self, _operation: Operation, _verdict: Verdict, _processes: Vec<String>) {}
}

fn error_value(body: &ErrorResponse) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "kind": body.error.kind,
            "message": body.error.message,
        }
    })
}
