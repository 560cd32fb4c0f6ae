//! Endpoint and credential pair shared by every operation.

use crate::error::{ApiError, INIT_REQUIRED_MSG};

/// Validated client configuration. Both fields are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    endpoint: String,
    api_key: String,
}

impl Config {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, ApiError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let api_key = api_key.trim();
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(ApiError::configuration(INIT_REQUIRED_MSG));
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

// The key never shows up in logs or panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_endpoint_or_key() {
        for (endpoint, key) in [("", "k"), ("http://x", ""), ("   ", "k"), ("/", "k"), ("", "")] {
            let err = Config::new(endpoint, key).unwrap_err();
            assert!(
                matches!(&err, ApiError::Configuration(m) if m == INIT_REQUIRED_MSG),
                "({endpoint:?}, {key:?})"
            );
        }
    }

    #[test]
    fn strips_trailing_slash() {
        let config = Config::new("http://localhost:3000/", "key").unwrap();
        assert_eq!(config.endpoint(), "http://localhost:3000");
        assert_eq!(config.api_key(), "key");
    }

    #[test]
    fn debug_redacts_key() {
        let config = Config::new("http://localhost:3000", "super-secret").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("http://localhost:3000"));
    }
}
