use crate::export;
use crate::ffi::{DEADLOCK_DETECTED, ENGINE, INITIALIZED, IS_LOGGING_ENABLED};
use crate::{DeadlockReport, EngineConfig};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::Ordering;

/// Initialize resalloc.
///
/// Replaces the process-wide engine with one that logs to `log_path` and
/// reports confirmed deadlocks to `callback`. Requests handled before this
/// call use a default engine without log or callback.
///
/// # Arguments
/// * `log_path` - Path to a log file as a null-terminated C string, or NULL to disable logging.
/// * `callback` - Function pointer to call with the JSON deadlock report, or NULL for no callback.
///
/// # Returns
/// * `0` on success
/// * `1` if resalloc is already initialized
/// * `-1` if the log path contains invalid UTF-8
/// * `-2` if the logger failed to initialize
/// * `-3` if logging was requested but the `logging` feature is disabled
///
/// # Safety
/// The caller must ensure `log_path` is either `NULL` or a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resalloc_init(
    log_path: *const c_char,
    callback: Option<extern "C" fn(*const c_char)>,
) -> c_int {
    if INITIALIZED.load(Ordering::SeqCst) {
        return 1; // Already initialized
    }

    // Convert C string to Rust if not NULL
    let log_path = if log_path.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(log_path) }.to_str() {
            Ok(s) => Some(s),
            Err(_) => return -1, // Invalid UTF-8
        }
    };

    if cfg!(not(feature = "logging")) && log_path.is_some() {
        return -3;
    }

    let mut config = EngineConfig::new().callback(move |report: DeadlockReport| {
        DEADLOCK_DETECTED.store(true, Ordering::SeqCst);

        if let Some(cb) = callback
            && let Ok(json) = serde_json::to_string(&report)
            && let Ok(c_str) = CString::new(json)
        {
            cb(c_str.as_ptr());
        }
    });
    if let Some(path) = log_path {
        config = config.with_log(path);
    }

    let engine = match config.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to initialize resalloc: {e:#}");
            return -2;
        }
    };

    IS_LOGGING_ENABLED.store(engine.log_file().is_some(), Ordering::SeqCst);
    *ENGINE.write() = engine;
    INITIALIZED.store(true, Ordering::SeqCst);
    0
}

/// Evaluate a JSON request.
///
/// # Arguments
/// * `request` - Request JSON as a null-terminated C string.
///
/// # Returns
/// A newly allocated JSON response (an `{"error": ...}` object on failure),
/// or NULL if `request` is NULL. Release it with `resalloc_free_string`.
///
/// # Safety
/// The caller must ensure `request` is either `NULL` or a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resalloc_handle(request: *const c_char) -> *mut c_char {
    if request.is_null() {
        return ptr::null_mut();
    }

    let input = unsafe { CStr::from_ptr(request) }.to_string_lossy();
    let response = ENGINE.read().handle_json(&input);
    into_c_string(response)
}

/// Release a string returned by this library.
///
/// # Safety
/// `s` must be NULL or a pointer obtained from `resalloc_handle` or
/// `resalloc_export`, and must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resalloc_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

/// Check if a deadlock has been reported since initialization or the last reset.
///
/// # Returns
/// * `1` if a deadlock was detected
/// * `0` otherwise
#[unsafe(no_mangle)]
pub extern "C" fn resalloc_is_deadlock_detected() -> c_int {
    c_int::from(DEADLOCK_DETECTED.load(Ordering::SeqCst))
}

/// Reset the deadlock detected flag.
#[unsafe(no_mangle)]
pub extern "C" fn resalloc_reset_deadlock_flag() {
    DEADLOCK_DETECTED.store(false, Ordering::SeqCst);
}

/// Check if logging is enabled.
///
/// # Returns
/// * `1` if logging is enabled
/// * `0` if logging is disabled
#[unsafe(no_mangle)]
pub extern "C" fn resalloc_is_logging_enabled() -> c_int {
    c_int::from(IS_LOGGING_ENABLED.load(Ordering::SeqCst))
}

/// Flush all pending log entries to disk
///
/// # Returns
/// * `0` on success
/// * `-1` if flushing failed
#[unsafe(no_mangle)]
pub extern "C" fn resalloc_flush() -> c_int {
    match ENGINE.read().flush() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Failed to flush logs: {e:#}");
            -1
        }
    }
}

/// Encode a log file into a share token.
///
/// Passing NULL encodes the log of the initialized engine after flushing it.
///
/// # Returns
/// A newly allocated token, or NULL on failure. Release it with `resalloc_free_string`.
///
/// # Safety
/// The caller must ensure `log_path` is either `NULL` or a valid null-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resalloc_export(log_path: *const c_char) -> *mut c_char {
    let token = if log_path.is_null() {
        export::export_engine(&ENGINE.read())
    } else {
        match unsafe { CStr::from_ptr(log_path) }.to_str() {
            Ok(path) => export::export(path),
            Err(_) => return ptr::null_mut(),
        }
    };

    match token {
        Ok(token) => into_c_string(token),
        Err(e) => {
            eprintln!("Export error: {e:#}");
            ptr::null_mut()
        }
    }
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).map_or(ptr::null_mut(), CString::into_raw)
}
