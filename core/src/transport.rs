//! Executing requests.
//!
//! `Transport` is the seam between the pure build/parse core and the
//! network. `BlockingClient` runs one build, execute, parse cycle per call
//! and never retries.

use serde_json::Value;
use tracing::debug;

use crate::client::CrudClient;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::Record;

/// Performs one HTTP round-trip.
///
/// Implementations must return `Ok` for every response that arrived,
/// whatever its status, and `Err` only when there is no response at all.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A `CrudClient` paired with a transport.
#[derive(Debug, Clone)]
pub struct BlockingClient<T> {
    client: CrudClient,
    transport: T,
}

#[cfg(feature = "blocking")]
impl BlockingClient<UreqTransport> {
    /// Client over the default `ureq` transport.
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, ApiError> {
        Ok(Self::with_transport(
            CrudClient::new(endpoint, api_key)?,
            UreqTransport::new(),
        ))
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(client: CrudClient, transport: T) -> Self {
        Self { client, transport }
    }

    /// See [`CrudClient::init`].
    pub fn init(&mut self, endpoint: &str, api_key: &str) -> Result<(), ApiError> {
        self.client.init(endpoint, api_key)
    }

    pub fn client(&self) -> &CrudClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn create(&self, record: &Record) -> Result<Value, ApiError> {
        let request = self.client.build_create(record)?;
        self.send(request)
    }

    pub fn get(&self, id: &str) -> Result<Value, ApiError> {
        let request = self.client.build_get(id)?;
        self.send(request)
    }

    pub fn update(&self, id: &str, record: &Record) -> Result<Value, ApiError> {
        let request = self.client.build_update(id, record)?;
        self.send(request)
    }

    pub fn delete(&self, id: &str) -> Result<Value, ApiError> {
        let request = self.client.build_delete(id)?;
        self.send(request)
    }

    fn send(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request).map_err(ApiError::Transport)?;
        debug!(status = response.status, "received response");
        self.client.parse_response(response)
    }
}

#[cfg(feature = "blocking")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "blocking")]
mod ureq_transport {
    use super::*;
    use crate::http::HttpMethod;

    /// `ureq` agent with status-as-error disabled, so 4xx/5xx come back as
    /// responses for `CrudClient` to interpret.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let result = match method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(&url);
                    for (k, v) in &headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Delete => {
                    let mut builder = self.agent.delete(&url);
                    for (k, v) in &headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Post | HttpMethod::Put => {
                    let mut builder = if method == HttpMethod::Post {
                        self.agent.post(&url)
                    } else {
                        self.agent.put(&url)
                    };
                    for (k, v) in &headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            // Once a status has arrived the response is normalized from it;
            // a body that cannot be read only matters when it is the payload.
            let body = match response.body_mut().with_config().limit(u64::MAX).read_to_vec() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) if (200..300).contains(&status) => return Err(Box::new(e)),
                Err(e) => {
                    debug!(status, error = %e, "discarding unreadable error body");
                    String::new()
                }
            };

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
