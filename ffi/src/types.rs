//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Records and response bodies
//! cross the boundary as JSON strings, since their shape is open-ended.
//! Conversion functions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use crud_core::{ApiError, ErrorKind, HttpMethod, HttpRequest};
use serde_json::Value;

/// Opaque handle to a `CrudClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCrudClient {
    pub(crate) inner: crud_core::CrudClient,
}

/// Heap-allocate `s` as a C string. Interior NULs are dropped.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

/// Reclaim a string produced by `into_c_string`. Null is ignored.
///
/// # Safety
/// `ptr` must be null or come from `into_c_string` and not be freed yet.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Returned inside an `FfiCrudResult` by the `crud_build_*` functions. The C
/// caller executes the request and passes the response to
/// `crud_parse_response`. `body` is null when the request has none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: into_c_string(req.url),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), into_c_string),
        }))
    }

    /// Free a request built by `from_core`, including every string it owns.
    ///
    /// # Safety
    /// `ptr` must be non-null, come from `from_core`, and not be freed yet.
    unsafe fn free(ptr: *mut Self) {
        let req = unsafe { Box::from_raw(ptr) };
        unsafe {
            free_c_string(req.url);
            free_c_string(req.body);
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                unsafe {
                    free_c_string(h.key);
                    free_c_string(h.value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request, then
/// passes a pointer to `crud_parse_response`. The FFI layer reads but does
/// not free these fields. A null `body` is treated as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiCrudResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    Validation = 2,
    NotFound = 3,
    QuotaExceeded = 4,
    Remote = 5,
    Serialization = 6,
    Transport = 7,
    NullArg = 8,
    Panic = 9,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Configuration => FfiErrorCode::Configuration,
            ErrorKind::Validation => FfiErrorCode::Validation,
            ErrorKind::NotFound => FfiErrorCode::NotFound,
            ErrorKind::QuotaExceeded => FfiErrorCode::QuotaExceeded,
            ErrorKind::Remote => FfiErrorCode::Remote,
            ErrorKind::Serialization => FfiErrorCode::Serialization,
            ErrorKind::Transport => FfiErrorCode::Transport,
        }
    }
}

/// Tag that tells `crud_free_result` what `FfiCrudResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest*`.
    Request = 1,
    /// `data` is a NUL-terminated JSON document (`char*`).
    Json = 2,
}

/// Result envelope for every build and parse operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`. On failure `error_code`
/// describes the category, `error_message` is a human-readable C string,
/// `http_status` is set for server-reported errors, and `data` is null.
#[repr(C)]
pub struct FfiCrudResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiCrudResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        FfiCrudResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }
        .boxed()
    }

    /// Build a success result carrying a request to execute.
    pub(crate) fn ok_request(req: HttpRequest) -> *mut Self {
        FfiCrudResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag: FfiDataTag::Request,
            data: FfiHttpRequest::from_core(req) as *mut c_void,
        }
        .boxed()
    }

    /// Build a success result carrying a response body as JSON text.
    pub(crate) fn ok_json(value: &Value) -> *mut Self {
        let json = serde_json::to_string(value).unwrap_or_default();
        FfiCrudResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag: FfiDataTag::Json,
            data: into_c_string(json) as *mut c_void,
        }
        .boxed()
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::failure(
            err.kind().into(),
            err.status().unwrap_or(0),
            err.to_string(),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string())
    }

    /// Free a result and whatever `data` points to.
    ///
    /// # Safety
    /// `ptr` must be non-null, come from one of the constructors above, and
    /// not be freed yet.
    pub(crate) unsafe fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        unsafe { free_c_string(result.error_message) };
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Request => unsafe { FfiHttpRequest::free(result.data as *mut FfiHttpRequest) },
            FfiDataTag::Json => unsafe { free_c_string(result.data as *mut c_char) },
            FfiDataTag::None => {}
        }
    }
}
