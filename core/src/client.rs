//! Request builder and response parser for the CRUD API.
//!
//! # Design
//! `CrudClient` holds only its `Config` and carries no per-call state. Each
//! operation is split into a `build_*` method that validates inputs and
//! produces an `HttpRequest`, and a single `parse_response` that turns the
//! `HttpResponse` into the service's JSON body or an `ApiError`. The caller
//! executes the HTTP round-trip, keeping this type free of I/O.

use serde_json::Value;

use crate::config::Config;
use crate::error::{
    normalize, ApiError, CREATE_FIELDS_MSG, ID_REQUIRED_MSG, NOT_INITIALIZED_MSG,
    UPDATE_VALUE_MSG,
};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::Record;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Stateless client for the CRUD API.
///
/// A `CrudClient::default()` is uninitialized and rejects every operation
/// with `ApiError::Configuration` until `init` succeeds.
#[derive(Debug, Clone, Default)]
pub struct CrudClient {
    config: Option<Config>,
}

impl CrudClient {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, ApiError> {
        let mut client = Self::default();
        client.init(endpoint, api_key)?;
        Ok(client)
    }

    /// Replace the configuration. On error the previous one is kept.
    pub fn init(&mut self, endpoint: &str, api_key: &str) -> Result<(), ApiError> {
        self.config = Some(Config::new(endpoint, api_key)?);
        Ok(())
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn build_create(&self, record: &Record) -> Result<HttpRequest, ApiError> {
        let config = self.require_config()?;
        if !record.has_value() || !record.has_tx_hash() {
            return Err(ApiError::validation(CREATE_FIELDS_MSG));
        }
        request(config, HttpMethod::Post, "create", Some(record))
    }

    pub fn build_get(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let config = self.require_config()?;
        let id = require_id(id)?;
        request(config, HttpMethod::Get, &format!("get/{id}"), None)
    }

    /// `txHash` is not required here, unlike `build_create`.
    pub fn build_update(&self, id: &str, record: &Record) -> Result<HttpRequest, ApiError> {
        let config = self.require_config()?;
        let id = require_id(id)?;
        if !record.has_value() {
            return Err(ApiError::validation(UPDATE_VALUE_MSG));
        }
        request(config, HttpMethod::Put, &format!("update/{id}"), Some(record))
    }

    pub fn build_delete(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let config = self.require_config()?;
        let id = require_id(id)?;
        request(config, HttpMethod::Delete, &format!("delete/{id}"), None)
    }

    /// Return a 2xx body verbatim, or normalize any other status.
    ///
    /// An empty body becomes `Value::Null` and a body that is not JSON comes
    /// back as `Value::String`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(normalize(response.status, &response.body));
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
    }

    fn require_config(&self) -> Result<&Config, ApiError> {
        self.config
            .as_ref()
            .ok_or_else(|| ApiError::configuration(NOT_INITIALIZED_MSG))
    }
}

fn require_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() {
        return Err(ApiError::validation(ID_REQUIRED_MSG));
    }
    Ok(id)
}

fn request(
    config: &Config,
    method: HttpMethod,
    path: &str,
    record: Option<&Record>,
) -> Result<HttpRequest, ApiError> {
    let mut headers = vec![(API_KEY_HEADER.to_string(), config.api_key().to_string())];
    let body = match record {
        Some(record) => {
            headers.push(("content-type".to_string(), "application/json".to_string()));
            let body =
                serde_json::to_string(record).map_err(|e| ApiError::Serialization(e.to_string()))?;
            Some(body)
        }
        None => None,
    };
    Ok(HttpRequest {
        method,
        url: format!("{}/{path}", config.endpoint()),
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn client() -> CrudClient {
        CrudClient::new("http://localhost:3000", "test-key").unwrap()
    }

    fn body_json(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn uninitialized_client_rejects_every_operation() {
        let c = CrudClient::default();
        let full = Record::new("v").with_tx_hash("h");
        let errors = [
            c.build_create(&full).unwrap_err(),
            c.build_create(&Record::default()).unwrap_err(),
            c.build_get("1").unwrap_err(),
            c.build_get("").unwrap_err(),
            c.build_update("1", &full).unwrap_err(),
            c.build_delete("").unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(&err, ApiError::Configuration(m) if m == NOT_INITIALIZED_MSG));
        }
    }

    #[test]
    fn failed_init_keeps_previous_config() {
        let mut c = client();
        assert!(c.init("", "other").is_err());
        assert_eq!(c.config().unwrap().api_key(), "test-key");
    }

    #[test]
    fn later_init_wins() {
        let mut c = client();
        c.init("http://other:9000/", "second").unwrap();
        let req = c.build_get("7").unwrap();
        assert_eq!(req.url, "http://other:9000/get/7");
        assert_eq!(req.header(API_KEY_HEADER), Some("second"));
    }

    #[test]
    fn build_create_produces_post_with_key_and_body() {
        let record = Record::new("payload").with_tx_hash("0xfeed");
        let req = client().build_create(&record).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/create");
        assert_eq!(
            req.headers,
            vec![
                ("x-api-key".to_string(), "test-key".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ]
        );
        assert_eq!(body_json(&req), json!({"value": "payload", "txHash": "0xfeed"}));
    }

    #[test]
    fn build_create_requires_value_and_tx_hash() {
        let c = client();
        for record in [
            Record::default(),
            Record::new("v"),
            Record::default().with_tx_hash("h"),
            Record::new("").with_tx_hash("h"),
            Record::new(false).with_tx_hash("h"),
        ] {
            let err = c.build_create(&record).unwrap_err();
            assert!(matches!(&err, ApiError::Validation { message: m, .. } if m == CREATE_FIELDS_MSG));
        }
    }

    #[test]
    fn build_get_produces_get_without_body() {
        let req = client().build_get("abc-123").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/get/abc-123");
        assert_eq!(req.header(API_KEY_HEADER), Some("test-key"));
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn empty_id_is_rejected() {
        let c = client();
        let record = Record::new("v");
        for err in [
            c.build_get("").unwrap_err(),
            c.build_update("", &record).unwrap_err(),
            c.build_delete("").unwrap_err(),
        ] {
            assert!(matches!(&err, ApiError::Validation { message: m, .. } if m == ID_REQUIRED_MSG));
        }
    }

    #[test]
    fn build_update_does_not_require_tx_hash() {
        let req = client().build_update("9", &Record::new("x")).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/update/9");
        assert_eq!(body_json(&req), json!({"value": "x"}));
    }

    #[test]
    fn build_update_requires_value() {
        let err = client()
            .build_update("9", &Record::default().with_tx_hash("h"))
            .unwrap_err();
        assert!(matches!(&err, ApiError::Validation { message: m, .. } if m == UPDATE_VALUE_MSG));
    }

    #[test]
    fn build_delete_produces_delete_without_body() {
        let req = client().build_delete("9").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:3000/delete/9");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_success_returns_body_verbatim() {
        let body = r#"{"id":"1","value":{"nested":[1,2,3]},"txHash":"h","extra":true}"#;
        let value = client().parse_response(HttpResponse::new(201, body)).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(body).unwrap());
    }

    #[test]
    fn parse_empty_success_is_null() {
        let value = client().parse_response(HttpResponse::new(204, "")).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn parse_non_json_success_is_string() {
        let value = client().parse_response(HttpResponse::new(200, "deleted")).unwrap();
        assert_eq!(value, json!("deleted"));
    }

    #[test]
    fn parse_failure_is_normalized() {
        let c = client();
        let cases = [
            (403, "{}", ErrorKind::QuotaExceeded),
            (400, r#"{"error":"bad"}"#, ErrorKind::Validation),
            (404, "", ErrorKind::NotFound),
            (500, r#"{"message":"db down"}"#, ErrorKind::Remote),
            (301, "", ErrorKind::Remote),
        ];
        for (status, body, kind) in cases {
            let err = c.parse_response(HttpResponse::new(status, body)).unwrap_err();
            assert_eq!(err.kind(), kind, "status {status}");
        }
    }
}
