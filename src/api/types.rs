//! API Data Types
//!
//! Request and response shapes of the public HTTP surface. Field names are
//! camelCase on the wire because the dashboard front-end reads them directly.

use crate::persistence::Record;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every route the service answers, listed in 404 responses.
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api/data",
    "GET /data.json",
    "POST /api/save",
    "POST /save",
    "GET /api/stats",
];

/// Query string of `GET /api/data`.
///
/// Kept as raw strings: `offset` and `limit` are parsed leniently later, so a
/// value like `limit=abc` is ignored instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub search: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    pub records: usize,
    pub version: u64,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<Record>,
    /// Size of the whole dataset.
    pub total: usize,
    /// Records matching `search`, before offset/limit.
    pub filtered: usize,
    pub version: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub records: usize,
    pub version: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_records: usize,
    pub data_version: u64,
    pub last_modified: Option<String>,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_distribution: Option<BTreeMap<String, usize>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub error: String,
    pub path: String,
    pub available_endpoints: Vec<String>,
}

/// Current time as RFC 3339 with millisecond precision (`2024-05-01T12:00:00.000Z`).
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
