//! Key/value handlers.
//!
//! Values are opaque text. A read of an absent key answers `200` with an
//! empty body; deleting an absent key is not an error.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::storage::SyncBackend;

/// `?key=` query parameter shared by every operation.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    /// Key to operate on.
    pub key: Option<String>,
}

impl KeyQuery {
    fn require(self) -> Result<String> {
        self.key
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingKey)
    }
}

/// Run a store operation off the async runtime; the file store blocks.
async fn with_store<R, F>(state: &AppState, op: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce(&dyn SyncBackend) -> crate::error::StorageResult<R> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let result = tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(result?)
}

/// Read the raw text stored under `key`.
pub async fn get_item(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<String> {
    let key = query.require()?;
    metrics::counter!("kv_requests_total", "op" => "get").increment(1);

    let lookup = key.clone();
    let value = with_store(&state, move |store| store.get(&lookup)).await?;
    info!(%key, found = value.is_some(), "Read item");

    Ok(value.unwrap_or_default())
}

/// Store the request body under `key`.
pub async fn set_item(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
    body: String,
) -> Result<StatusCode> {
    let key = query.require()?;
    metrics::counter!("kv_requests_total", "op" => "set").increment(1);

    let target = key.clone();
    let bytes = body.len();
    with_store(&state, move |store| store.set(&target, &body)).await?;
    info!(%key, bytes, "Stored item");

    Ok(StatusCode::OK)
}

/// Remove the value stored under `key`.
pub async fn delete_item(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<StatusCode> {
    let key = query.require()?;
    metrics::counter!("kv_requests_total", "op" => "delete").increment(1);

    let target = key.clone();
    with_store(&state, move |store| store.clear(&target)).await?;
    info!(%key, "Deleted item");

    Ok(StatusCode::OK)
}
