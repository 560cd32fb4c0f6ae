//! Error types for the CRUD API client.
//!
//! # Design
//! Every non-2xx response is folded into one of four variants by
//! [`normalize`], a pure function of status code and body. Local
//! precondition failures use `Configuration` and `Validation`; failures with
//! no HTTP response at all arrive as `Transport` and keep the transport's
//! own error object.

use serde_json::Value;
use thiserror::Error;

pub const INIT_REQUIRED_MSG: &str = "CRUD_API_URL and CRUD_API_KEY must be provided";
pub const NOT_INITIALIZED_MSG: &str = "client not initialized; call init first";
pub const CREATE_FIELDS_MSG: &str = "missing required fields: value and txHash";
pub const ID_REQUIRED_MSG: &str = "ID is required";
pub const UPDATE_VALUE_MSG: &str = "value is required for update";
pub const INVALID_REQUEST_MSG: &str = "invalid request";
pub const UNKNOWN_ERROR_MSG: &str = "unknown error";

/// Boxed error produced by a transport when no response was received.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `CrudClient` and `BlockingClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client has no configuration, or `init` got an empty argument.
    #[error("{0}")]
    Configuration(String),

    /// A required input is missing, or the server answered 400. `status` is
    /// `Some(400)` only in the latter case.
    #[error("{message}")]
    Validation { message: String, status: Option<u16> },

    /// The server answered 404.
    #[error("resource not found")]
    NotFound,

    /// The server answered 403.
    #[error("request limit exceeded, please recharge credits")]
    QuotaExceeded,

    /// Any other non-2xx response.
    #[error("API error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No response was received. The inner error is the transport's own.
    #[error(transparent)]
    Transport(TransportError),
}

/// Fieldless tag for each `ApiError` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    QuotaExceeded,
    Remote,
    Serialization,
    Transport,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Configuration(_) => ErrorKind::Configuration,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::QuotaExceeded => ErrorKind::QuotaExceeded,
            ApiError::Remote { .. } => ErrorKind::Remote,
            ApiError::Serialization(_) => ErrorKind::Serialization,
            ApiError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status behind a server-reported error, if one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::QuotaExceeded => Some(403),
            ApiError::Validation { status, .. } => *status,
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A locally detected validation failure, with no HTTP status.
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation {
            message: msg.into(),
            status: None,
        }
    }

    pub(crate) fn configuration(msg: &str) -> Self {
        ApiError::Configuration(msg.to_string())
    }
}

/// Map a non-success response to its `ApiError`.
///
/// 403 and 404 ignore the body. 400 prefers the body's `error` field and
/// every other status prefers its `message` field. A body that is not a JSON
/// object falls back to the generic text.
pub fn normalize(status: u16, body: &str) -> ApiError {
    match status {
        403 => ApiError::QuotaExceeded,
        404 => ApiError::NotFound,
        400 => ApiError::Validation {
            message: body_field(body, "error").unwrap_or_else(|| INVALID_REQUEST_MSG.to_string()),
            status: Some(400),
        },
        _ => ApiError::Remote {
            status,
            message: body_field(body, "message").unwrap_or_else(|| UNKNOWN_ERROR_MSG.to_string()),
        },
    }
}

/// Extract a non-empty field from a JSON object body as text.
fn body_field(body: &str, field: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    match parsed.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_quota_regardless_of_body() {
        for body in ["", "{}", r#"{"error":"nope","message":"nope"}"#, "plain text"] {
            let err = normalize(403, body);
            assert!(matches!(err, ApiError::QuotaExceeded), "body {body:?}");
            assert_eq!(err.to_string(), "request limit exceeded, please recharge credits");
        }
    }

    #[test]
    fn bad_request_uses_error_field() {
        let err = normalize(400, r#"{"error":"bad field"}"#);
        assert!(matches!(&err, ApiError::Validation { message, .. } if message == "bad field"));
        assert_eq!(err.to_string(), "bad field");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn bad_request_without_error_field_is_generic() {
        for body in ["", "{}", r#"{"message":"ignored"}"#, "<html>", r#"{"error":""}"#] {
            let err = normalize(400, body);
            assert!(
                matches!(&err, ApiError::Validation { message, .. } if message == INVALID_REQUEST_MSG),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn local_validation_has_no_status() {
        let err = ApiError::validation(ID_REQUIRED_MSG);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), ID_REQUIRED_MSG);
    }

    #[test]
    fn not_found_discards_body() {
        let err = normalize(404, r#"{"message":"no such record"}"#);
        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(err.to_string(), "resource not found");
    }

    #[test]
    fn other_status_uses_message_field() {
        let err = normalize(500, r#"{"message":"db down"}"#);
        match &err {
            ApiError::Remote { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.to_string(), "API error (500): db down");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn other_status_without_message_is_unknown() {
        let err = normalize(502, "Bad Gateway");
        assert!(matches!(
            &err,
            ApiError::Remote { status: 502, message } if message == UNKNOWN_ERROR_MSG
        ));
    }

    #[test]
    fn unauthorized_is_remote_not_quota() {
        let err = normalize(401, r#"{"message":"invalid api key"}"#);
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn non_string_field_is_rendered_as_json() {
        let err = normalize(500, r#"{"message":{"code":7}}"#);
        assert!(matches!(&err, ApiError::Remote { message, .. } if message == r#"{"code":7}"#));
    }

    #[test]
    fn transport_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ApiError::Transport(Box::new(io));
        assert_eq!(err.to_string(), "refused");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }
}
