use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use crud_core::is_truthy;
use serde_json::{json, Map, Value};
use tokio::{
    net::TcpListener,
    sync::{Mutex, RwLock},
};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-api-key";

pub type Db = Arc<RwLock<HashMap<String, Map<String, Value>>>>;
pub type Credits = Arc<Mutex<HashMap<String, u64>>>;

/// One API key and the number of requests it may make.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub api_key: String,
    pub credits: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: "dev-key".to_string(),
            credits: 1000,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub credits: Credits,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let credits = HashMap::from([(config.api_key.clone(), config.credits)]);
        Self {
            db: Arc::new(RwLock::new(HashMap::new())),
            credits: Arc::new(Mutex::new(credits)),
        }
    }
}

pub fn app(config: ServerConfig) -> Router {
    router(AppState::new(&config))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create", post(create_record))
        .route("/get/{id}", get(get_record))
        .route("/update/{id}", put(update_record))
        .route("/delete/{id}", delete(delete_record))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

/// JSON error body with the status it is sent under.
#[derive(Debug)]
pub struct Failure(StatusCode, Value);

impl Failure {
    fn bad_request(msg: impl Into<String>) -> Self {
        Failure(StatusCode::BAD_REQUEST, json!({ "error": msg.into() }))
    }

    fn not_found() -> Self {
        Failure(StatusCode::NOT_FOUND, json!({ "message": "record not found" }))
    }

    fn with_message(status: StatusCode, msg: &str) -> Self {
        Failure(status, json!({ "message": msg }))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

/// Every accepted request spends one credit; a key with none left gets 403.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Failure> {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Failure::with_message(StatusCode::UNAUTHORIZED, "missing api key"))?
        .to_string();

    {
        let mut credits = state.credits.lock().await;
        match credits.get_mut(&key) {
            None => {
                return Err(Failure::with_message(
                    StatusCode::UNAUTHORIZED,
                    "invalid api key",
                ))
            }
            Some(0) => {
                tracing::info!("api key out of credits");
                return Err(Failure::with_message(
                    StatusCode::FORBIDDEN,
                    "request limit exceeded",
                ));
            }
            Some(left) => *left -= 1,
        }
    }

    Ok(next.run(request).await)
}

async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<Map<String, Value>>), Failure> {
    let Json(mut record) = body.map_err(|e| Failure::bad_request(e.body_text()))?;
    let has_value = record.get("value").is_some_and(is_truthy);
    let has_tx_hash = record.get("txHash").is_some_and(is_truthy);
    if !has_value || !has_tx_hash {
        return Err(Failure::bad_request("value and txHash are required"));
    }
    if !record["txHash"].as_str().is_some_and(|h| h.starts_with("0x")) {
        return Err(Failure::bad_request("txHash must be 0x-prefixed"));
    }

    let id = Uuid::new_v4().to_string();
    record.insert("id".to_string(), Value::String(id.clone()));
    state.db.write().await.insert(id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Map<String, Value>>, Failure> {
    let records = state.db.read().await;
    records.get(&id).cloned().map(Json).ok_or_else(Failure::not_found)
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Map<String, Value>>, Failure> {
    let Json(changes) = body.map_err(|e| Failure::bad_request(e.body_text()))?;
    if !changes.get("value").is_some_and(is_truthy) {
        return Err(Failure::bad_request("value is required"));
    }

    let mut records = state.db.write().await;
    let record = records.get_mut(&id).ok_or_else(Failure::not_found)?;
    for (key, value) in changes {
        if key != "id" {
            record.insert(key, value);
        }
    }
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut records = state.db.write().await;
    records
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(Failure::not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_credits() {
        let config = ServerConfig::default();
        assert_eq!(config.api_key, "dev-key");
        assert!(config.credits > 0);
    }

    #[tokio::test]
    async fn state_seeds_single_key() {
        let state = AppState::new(&ServerConfig {
            api_key: "k".to_string(),
            credits: 3,
        });
        let credits = state.credits.lock().await;
        assert_eq!(credits.get("k"), Some(&3));
        assert_eq!(credits.len(), 1);
        assert!(state.db.read().await.is_empty());
    }

    #[test]
    fn failure_bodies_use_expected_fields() {
        let Failure(status, body) = Failure::bad_request("nope");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "nope");

        let Failure(status, body) = Failure::not_found();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.get("message").is_some());
    }
}
