//! Request handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::StoreHealth;
use crate::error::TimeslicerError;
use crate::slicer::{date_of, day_key};
use crate::store::Store;
use crate::value::Slices;

use super::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct DayResponse {
    date: String,
    slices: Slices,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SliceUpdate {
    activity: String,
}

/// `GET /dayslice/:timestamp`
pub(crate) async fn get_day(
    State(state): State<AppState>,
    Path(timestamp): Path<String>,
) -> Response {
    let result = run_blocking(move || {
        let date = parse_timestamp(&timestamp)?;
        let slices = state.slicer.get_or_create(state.store.as_ref(), date)?;
        Ok(DayResponse {
            date: day_key(date)?,
            slices,
        })
    })
    .await;

    match result {
        Ok(day) => Json(day).into_response(),
        Err(err) => error_response(err),
    }
}

/// `PUT /dayslice/:timestamp/:slice`
pub(crate) async fn set_slice(
    State(state): State<AppState>,
    Path((timestamp, slice)): Path<(String, String)>,
    Json(update): Json<SliceUpdate>,
) -> Response {
    let label = slice.clone();
    let activity = update.activity.clone();
    let result = run_blocking(move || {
        let date = parse_timestamp(&timestamp)?;
        // Make sure the day exists so a valid label can be set on first use
        state.slicer.get_or_create(state.store.as_ref(), date)?;
        let key = day_key(date)?;
        state.store.set_slice(&key, &label, &activity)
    })
    .await;

    match result {
        Ok(true) => {
            tracing::info!(slice = %slice, activity = %update.activity, "Slice updated");
            Json(json!({ "updated": true })).into_response()
        }
        Ok(false) => (StatusCode::NOT_FOUND, Json(json!({ "updated": false }))).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /health`
pub(crate) async fn health(State(state): State<AppState>) -> Json<StoreHealth> {
    Json(state.store.health())
}

/// Store calls do file I/O and may wait on a full sync queue, so they run on
/// the blocking pool instead of a runtime worker
async fn run_blocking<T, F>(work: F) -> Result<T, TimeslicerError>
where
    F: FnOnce() -> Result<T, TimeslicerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TimeslicerError::Storage(format!("store task failed: {}", e)))?
}

fn parse_timestamp(raw: &str) -> Result<time::Date, TimeslicerError> {
    let timestamp: i64 = raw
        .parse()
        .map_err(|_| TimeslicerError::InvalidTimestamp(raw.to_string()))?;
    date_of(timestamp)
}

fn error_response(err: TimeslicerError) -> Response {
    match err {
        TimeslicerError::InvalidTimestamp(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid timestamp provided." })),
        )
            .into_response(),
        err => {
            tracing::error!(error = %err, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
