//! C-ABI wrapper around `crud-core`.
//!
//! # Overview
//! Exposes the CRUD client through `extern "C"` functions so any language
//! with a C FFI can build requests and interpret responses, running the HTTP
//! round-trip with its own networking stack.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `crud_build_*` mirrors the core `build_*` methods 1:1; one
//!   `crud_parse_response` serves all four operations.
//! - A single `FfiCrudResult` envelope with `FfiDataTag` + `void* data`
//!   conveys requests, response bodies, and errors uniformly, so validation
//!   and configuration failures reach C with their category and message.
//! - Records go in and bodies come out as JSON strings.
//! - The C caller owns all returned pointers and must call the matching
//!   `crud_free_*` function to release them.

pub mod types;

use std::borrow::Cow;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use crud_core::{ApiError, HttpResponse, Record};

use types::*;

/// Borrow the argument `name` as `&str`. Null reads as `""`; invalid UTF-8
/// is a `Validation` error naming the argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, ApiError> {
    if ptr.is_null() {
        return Ok("");
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| ApiError::validation(format!("{name} is not valid UTF-8")))
}

/// Borrow a response body. Null is empty; invalid UTF-8 is replaced with
/// U+FFFD so the status still decides the outcome.
///
/// # Safety
/// Same as `str_arg`.
unsafe fn body_arg<'a>(ptr: *const c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        return Cow::Borrowed("");
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
}

/// Parse a record argument. Null is an empty record, which the core rejects.
fn record_arg(json: &str) -> Result<Record, ApiError> {
    if json.trim().is_empty() {
        return Ok(Record::default());
    }
    serde_json::from_str(json).map_err(|e| ApiError::validation(format!("record is not valid JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client for `endpoint`, authenticating with `api_key`.
///
/// Returns null if either argument is null, empty or not valid UTF-8, or if
/// an internal panic occurs. The caller must free the returned pointer with
/// `crud_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn crud_client_new(
    endpoint: *const c_char,
    api_key: *const c_char,
) -> *mut FfiCrudClient {
    catch_unwind(|| {
        let (Ok(endpoint), Ok(api_key)) =
            (unsafe { (str_arg(endpoint, "endpoint"), str_arg(api_key, "api_key")) })
        else {
            return std::ptr::null_mut();
        };
        match crud_core::CrudClient::new(endpoint, api_key) {
            Ok(inner) => Box::into_raw(Box::new(FfiCrudClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `crud_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn crud_client_free(client: *mut FfiCrudClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for creating a record from `record_json`.
///
/// `record_json` must hold truthy `value` and `txHash` fields.
/// On success `data_tag` is `Request`.
#[unsafe(no_mangle)]
pub extern "C" fn crud_build_create(
    client: *const FfiCrudClient,
    record_json: *const c_char,
) -> *mut FfiCrudResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCrudResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let built = unsafe { str_arg(record_json, "record") }
            .and_then(record_arg)
            .and_then(|record| client.inner.build_create(&record));
        match built {
            Ok(req) => FfiCrudResult::ok_request(req),
            Err(e) => FfiCrudResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCrudResult::panic("panic in crud_build_create"))
}

/// Build the request for fetching the record `id`.
///
/// A null or empty `id` yields a `Validation` error.
#[unsafe(no_mangle)]
pub extern "C" fn crud_build_get(
    client: *const FfiCrudClient,
    id: *const c_char,
) -> *mut FfiCrudResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCrudResult::null_arg("client");
        }
        let client = unsafe { &*client };
        match unsafe { str_arg(id, "id") }.and_then(|id| client.inner.build_get(id)) {
            Ok(req) => FfiCrudResult::ok_request(req),
            Err(e) => FfiCrudResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCrudResult::panic("panic in crud_build_get"))
}

/// Build the request for updating the record `id` with `record_json`.
///
/// Only `value` is required; `txHash` may be omitted.
#[unsafe(no_mangle)]
pub extern "C" fn crud_build_update(
    client: *const FfiCrudClient,
    id: *const c_char,
    record_json: *const c_char,
) -> *mut FfiCrudResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCrudResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let built = unsafe { str_arg(id, "id") }.and_then(|id| {
            let record = record_arg(unsafe { str_arg(record_json, "record") }?)?;
            client.inner.build_update(id, &record)
        });
        match built {
            Ok(req) => FfiCrudResult::ok_request(req),
            Err(e) => FfiCrudResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCrudResult::panic("panic in crud_build_update"))
}

/// Build the request for deleting the record `id`.
#[unsafe(no_mangle)]
pub extern "C" fn crud_build_delete(
    client: *const FfiCrudClient,
    id: *const c_char,
) -> *mut FfiCrudResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCrudResult::null_arg("client");
        }
        let client = unsafe { &*client };
        match unsafe { str_arg(id, "id") }.and_then(|id| client.inner.build_delete(id)) {
            Ok(req) => FfiCrudResult::ok_request(req),
            Err(e) => FfiCrudResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCrudResult::panic("panic in crud_build_delete"))
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Interpret the response to any request built above.
///
/// On a 2xx status `data_tag` is `Json` and `data` holds the body as JSON
/// text (`null` for an empty body). Any other status yields the normalized
/// error code, message and `http_status`.
#[unsafe(no_mangle)]
pub extern "C" fn crud_parse_response(
    client: *const FfiCrudClient,
    response: *const FfiHttpResponse,
) -> *mut FfiCrudResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCrudResult::null_arg("client");
        }
        if response.is_null() {
            return FfiCrudResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        let core_resp = HttpResponse::new(resp.status, unsafe { body_arg(resp.body) });
        match client.inner.parse_response(core_resp) {
            Ok(value) => FfiCrudResult::ok_json(&value),
            Err(e) => FfiCrudResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCrudResult::panic("panic in crud_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiCrudResult` returned by any `crud_build_*` or
/// `crud_parse_response` call, including the request or JSON it carries.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn crud_free_result(result: *mut FfiCrudResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiCrudResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn crud_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
