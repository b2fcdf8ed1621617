use super::error::ApiError;
use super::query;
use super::state::AppState;
use super::types::{
    AVAILABLE_ENDPOINTS, DataQuery, DataResponse, HealthResponse, NotFoundResponse, SaveResponse,
    StatsResponse, now_iso,
};
use crate::persistence::Record;
use crate::persistence::store::json_kind;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::IntoResponse;
use chrono::SecondsFormat;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DASHBOARD_PATH: &str = "/dashboard.html";

pub async fn handle_root() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, DASHBOARD_PATH)])
}

pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: now_iso(),
        uptime: state.uptime_secs(),
        records: snapshot.len(),
        version: snapshot.version,
        environment: state.config.environment.clone(),
    })
}

pub async fn handle_get_data(
    State(state): State<AppState>,
    Query(params): Query<DataQuery>,
) -> Json<DataResponse> {
    let snapshot = state.store.snapshot();
    let page = query::apply(&snapshot.records, &params);

    tracing::debug!(
        "Serving {} of {} records (search={:?})",
        page.records.len(),
        snapshot.len(),
        params.search
    );

    Json(DataResponse {
        data: page.records.into_iter().cloned().collect(),
        total: snapshot.len(),
        filtered: page.filtered,
        version: snapshot.version,
        timestamp: now_iso(),
    })
}

pub async fn handle_raw_data(State(state): State<AppState>) -> Json<Vec<Record>> {
    let snapshot = state.store.snapshot();
    Json(snapshot.records.as_ref().clone())
}

pub async fn handle_save(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    let records = parse_replacement(&body)?;
    let count = records.len();
    let version = replace_dataset(&state, records)?;

    Ok(Json(SaveResponse {
        success: true,
        message: "Data saved successfully".to_string(),
        records: count,
        version,
        timestamp: now_iso(),
    }))
}

/// Older dashboards post here and expect plain-text replies.
pub async fn handle_legacy_save(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, String) {
    let result = parse_replacement(&body).and_then(|records| replace_dataset(&state, records));

    match result {
        Ok(_) => (StatusCode::OK, "File saved successfully".to_string()),
        Err(e) => (e.status(), e.legacy_message()),
    }
}

pub async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.store.snapshot();
    let file = state.store.file_stats();

    Json(StatsResponse {
        total_records: snapshot.len(),
        data_version: snapshot.version,
        last_modified: file
            .as_ref()
            .and_then(|f| f.modified)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        file_size: file.map(|f| f.size_bytes).unwrap_or(0),
        status_distribution: status_distribution(&snapshot.records),
    })
}

pub async fn handle_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CACHE_CONTROL, "no-store")],
        Json(NotFoundResponse {
            error: "Endpoint not found".to_string(),
            path: uri.path().to_string(),
            available_endpoints: AVAILABLE_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }),
    )
}

/// Validates a replacement body: a JSON array whose every element is an object.
pub fn parse_replacement(body: &[u8]) -> Result<Vec<Record>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid data format - expected array".to_string(),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(ApiError::BadRequest(format!(
                "Invalid data format - record {} is {}, expected an object",
                index,
                json_kind(&other)
            ))),
        })
        .collect()
}

fn replace_dataset(state: &AppState, records: Vec<Record>) -> Result<u64, ApiError> {
    let count = records.len();
    match state.store.replace_all(records) {
        Ok(version) => {
            tracing::info!("Dataset replaced: {} records (version {})", count, version);
            Ok(version)
        }
        Err(e) => {
            tracing::error!("Save error: {}", e);
            Err(ApiError::from(e))
        }
    }
}

/// Counts records per `Status` (or `status`) string value.
/// `None` when no record carries such a field.
fn status_distribution(records: &[Record]) -> Option<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for record in records {
        let status = record.get("Status").or_else(|| record.get("status"));
        if let Some(Value::String(status)) = status {
            *counts.entry(status.clone()).or_insert(0) += 1;
        }
    }

    if counts.is_empty() { None } else { Some(counts) }
}
