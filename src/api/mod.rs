//! HTTP Façade Module
//!
//! Exposes the dataset over REST and applies the cross-cutting policy that
//! wraps every request.
//!
//! ## Request Flow
//! - **Reads** (`GET /api/data`, `GET /data.json`, `GET /api/stats`): take a
//!   snapshot from the `DataStore`, optionally filter and paginate, respond.
//! - **Writes** (`POST /api/save`, legacy `POST /save`): validate that the body is
//!   an array of objects, then hand the whole array to `DataStore::replace_all`.
//!   Nothing is touched when validation fails.
//!
//! ## Layers (outermost first)
//! Request tracing, CORS, gzip compression, panic capture, body size limit,
//! basic auth (everything except `/health`).
//!
//! ## Submodules
//! - **`auth`**: static basic-auth gate.
//! - **`error`**: `ApiError` and its HTTP mapping.
//! - **`handlers`**: endpoint handlers.
//! - **`query`**: search / offset / limit over a snapshot.
//! - **`router`**: route table, middleware stack, static assets.
//! - **`state`**: shared handler state.
//! - **`types`**: request and response DTOs.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod query;
pub mod router;
pub mod state;
pub mod types;

pub use router::build_router;
pub use state::AppState;
