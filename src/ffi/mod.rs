//! FFI bindings for the resalloc C API
//!
//! Requests and responses cross the boundary as null-terminated JSON strings.
//! A process-wide [`Engine`] answers them; `resalloc_init` replaces it with a
//! configured one. Strings handed out by this module must be returned with
//! `resalloc_free_string`.

pub mod core;
pub use self::core::*;

use crate::Engine;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::atomic::AtomicBool;

lazy_static! {
    pub(crate) static ref ENGINE: RwLock<Engine> = RwLock::new(Engine::new());
}

// Globals to track initialization state
pub(crate) static INITIALIZED: AtomicBool = AtomicBool::new(false);
pub(crate) static DEADLOCK_DETECTED: AtomicBool = AtomicBool::new(false);
pub(crate) static IS_LOGGING_ENABLED: AtomicBool = AtomicBool::new(false);
