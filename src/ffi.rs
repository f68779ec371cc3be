//! FFI bindings for the NeuroAura engine
//!
//! C-compatible functions for calling the engine from a mobile or web host.
//! All functions take null-terminated UTF-8 strings and return allocated
//! memory that must be freed by the caller using `neuroaura_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::pipeline::{score_assessment_json, StressEngine};
use crate::scoring::InterventionCatalog;
use crate::sentiment::analyze_sentiment;
use crate::store::InMemoryResultStore;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Caller must free with `neuroaura_free_string`
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score an assessment payload JSON and return the `StressResult` JSON.
///
/// # Safety
/// - `payload_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuroaura_free_string`.
/// - Returns NULL on error; call `neuroaura_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_score_assessment(payload_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json) = cstr_to_string(payload_json) else {
        set_last_error("Invalid payload string pointer");
        return ptr::null_mut();
    };

    match score_assessment_json(&json) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Analyze free text and return the sentiment JSON
/// (`{"score":..,"token_count":..,"matched_tokens":..}`).
///
/// # Safety
/// - `text` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuroaura_free_string`.
/// - Returns NULL on error; call `neuroaura_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_analyze_sentiment(text: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(text) = cstr_to_string(text) else {
        set_last_error("Invalid text string pointer");
        return ptr::null_mut();
    };

    match serde_json::to_string(&analyze_sentiment(&text)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to a StressEngine with an in-memory result store
pub struct NeuroAuraEngineHandle {
    engine: StressEngine<InMemoryResultStore>,
}

/// Create an engine. `config_json` may be NULL for the default configuration.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `neuroaura_engine_free`.
/// - Returns NULL on error; call `neuroaura_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_engine_new(
    config_json: *const c_char,
) -> *mut NeuroAuraEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let Some(json) = cstr_to_string(config_json) else {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match StressEngine::new(
        config,
        InterventionCatalog::default(),
        InMemoryResultStore::new(),
    ) {
        Ok(engine) => Box::into_raw(Box::new(NeuroAuraEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuroaura_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_engine_free(engine: *mut NeuroAuraEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Score a payload with the engine and remember the result for its user.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuroaura_engine_new`.
/// - `payload_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuroaura_free_string`.
/// - Returns NULL on error; call `neuroaura_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_engine_score(
    engine: *mut NeuroAuraEngineHandle,
    payload_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let Some(json) = cstr_to_string(payload_json) else {
        set_last_error("Invalid payload string pointer");
        return ptr::null_mut();
    };

    match handle.engine.score_json(&json) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Latest stored result for a user as JSON, or the string `null` if none.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neuroaura_engine_new`.
/// - `user_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neuroaura_free_string`.
/// - Returns NULL on error; call `neuroaura_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_engine_latest(
    engine: *const NeuroAuraEngineHandle,
    user_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let Some(user_id) = cstr_to_string(user_id) else {
        set_last_error("Invalid user_id string pointer");
        return ptr::null_mut();
    };

    let latest = handle
        .engine
        .latest(&user_id)
        .and_then(|stored| Ok(serde_json::to_string(&stored)?));
    match latest {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by the engine.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `neuroaura_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn neuroaura_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> CString {
        CString::new(
            r#"{
                "userId": "ffi-user",
                "questions": [
                    {"id": "q1", "type": "mcq", "answer": "Poor", "latencyMs": 5000},
                    {"id": "q2", "type": "mcq", "answer": "Often", "latencyMs": 4000},
                    {"id": "q3", "type": "mcq", "answer": "Busy", "latencyMs": 3000},
                    {"id": "q4", "type": "text", "answer": "deadlines are stressing me out",
                     "wpm": 35, "backspaces": 4, "pauses": 1, "keystrokeVariance": 0.6},
                    {"id": "q5", "type": "mcq", "answer": "Neutral", "latencyMs": 3500},
                    {"id": "q6", "type": "slider", "answer": 6, "latencyMs": 2500}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_score_assessment() {
        let payload = sample_payload();
        unsafe {
            let result = neuroaura_score_assessment(payload.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("\"stressScore\""));
            assert!(result_str.contains("\"mood\""));

            neuroaura_free_string(result);
        }
    }

    #[test]
    fn test_ffi_analyze_sentiment() {
        let text = CString::new("I am not happy").unwrap();
        unsafe {
            let result = neuroaura_analyze_sentiment(text.as_ptr());
            assert!(!result.is_null());
            let parsed: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert!(parsed["score"].as_f64().unwrap() < 0.0);
            neuroaura_free_string(result);
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = neuroaura_engine_new(ptr::null());
            assert!(!engine.is_null());

            let user = CString::new("ffi-user").unwrap();
            let before = neuroaura_engine_latest(engine, user.as_ptr());
            assert_eq!(CStr::from_ptr(before).to_str().unwrap(), "null");
            neuroaura_free_string(before);

            let payload = sample_payload();
            let result = neuroaura_engine_score(engine, payload.as_ptr());
            assert!(!result.is_null());
            neuroaura_free_string(result);

            let after = neuroaura_engine_latest(engine, user.as_ptr());
            assert!(CStr::from_ptr(after).to_str().unwrap().contains("stress_score"));
            neuroaura_free_string(after);

            neuroaura_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_engine_rejects_bad_config() {
        let config = CString::new(r#"{"typing": {"idle_threshold_ms": 0}}"#).unwrap();
        unsafe {
            let engine = neuroaura_engine_new(config.as_ptr());
            assert!(engine.is_null());
            assert!(!neuroaura_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        unsafe {
            let result = neuroaura_score_assessment(invalid.as_ptr());
            assert!(result.is_null());

            let error = neuroaura_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("parse"));

            let result = neuroaura_score_assessment(ptr::null());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = neuroaura_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
