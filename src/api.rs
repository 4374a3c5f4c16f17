use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::error::{FeedError, StoreError};
use crate::ingest::config::IngestConfig;
use crate::ingest::providers::HttpFeed;
use crate::ingest::types::OrderRecord;
use crate::ingest::{run_once, IngestReport};
use crate::store::OrderStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<OrderStore>,
    pub config: Arc<IngestConfig>,
}

impl AppState {
    pub fn new(store: OrderStore, config: IngestConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Feed unavailable: {0}")]
    Feed(#[from] FeedError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(format!("order '{id}'")),
            dup @ StoreError::Duplicate { .. } => ApiError::Conflict(dup.to_string()),
            StoreError::MissingKey => ApiError::BadRequest("order_id is required".into()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Feed(_) => (StatusCode::BAD_GATEWAY, "FEED_UNAVAILABLE"),
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{order_id}",
            get(get_order)
                .put(replace_order)
                .patch(patch_order)
                .delete(delete_order),
        )
        .route("/admin/fetch", post(admin_fetch))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_orders(State(state): State<AppState>) -> Json<Vec<OrderRecord>> {
    Json(state.store.list())
}

async fn create_order(
    State(state): State<AppState>,
    Json(rec): Json<OrderRecord>,
) -> Result<(StatusCode, Json<OrderRecord>), ApiError> {
    if rec.order_id.trim().is_empty() {
        return Err(ApiError::BadRequest("order_id is required".into()));
    }
    state.store.insert(rec.clone())?;
    persist(&state)?;
    Ok((StatusCode::CREATED, Json(rec)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecord>, ApiError> {
    state
        .store
        .get(&order_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order '{order_id}'")))
}

async fn replace_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(rec): Json<OrderRecord>,
) -> Result<Json<OrderRecord>, ApiError> {
    if rec.order_id != order_id {
        return Err(ApiError::BadRequest(
            "order_id in body must match the path".into(),
        ));
    }
    let saved = state.store.update(&order_id, rec)?;
    persist(&state)?;
    Ok(Json(saved))
}

/// Merge the top-level fields of the body into the stored record.
async fn patch_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<OrderRecord>, ApiError> {
    let Value::Object(fields) = patch else {
        return Err(ApiError::BadRequest("body must be a JSON object".into()));
    };
    let current = state
        .store
        .get(&order_id)
        .ok_or_else(|| ApiError::NotFound(format!("order '{order_id}'")))?;

    let mut merged = serde_json::to_value(&current).map_err(anyhow::Error::from)?;
    if let Value::Object(obj) = &mut merged {
        for (k, v) in fields {
            if !obj.contains_key(&k) {
                return Err(ApiError::BadRequest(format!("unknown field '{k}'")));
            }
            obj.insert(k, v);
        }
    }
    let rec: OrderRecord =
        serde_json::from_value(merged).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if rec.order_id != order_id {
        return Err(ApiError::BadRequest("order_id cannot be changed".into()));
    }

    let saved = state.store.update(&order_id, rec)?;
    persist(&state)?;
    Ok(Json(saved))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&order_id)?;
    persist(&state)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the configured feed once into the store.
async fn admin_fetch(State(state): State<AppState>) -> Result<Json<IngestReport>, ApiError> {
    let cfg = &state.config;
    let builder = cfg.record_builder()?;
    let feed = HttpFeed::with_timeout(cfg.feed_url.clone(), cfg.http_timeout())?;
    let report = run_once(&feed, &builder, state.store.as_ref(), cfg.batch_policy).await?;
    persist(&state)?;
    Ok(Json(report))
}

fn persist(state: &AppState) -> Result<(), ApiError> {
    state.store.persist().map_err(ApiError::from)
}
