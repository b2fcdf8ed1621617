//! Feedback Dashboard Backend Library
//!
//! A single-process HTTP service that keeps a JSON array of feedback records in
//! memory, mirrors it to one flat file, and exposes it behind static basic auth.
//! The binary (`main.rs`) wires these modules together.
//!
//! ## Modules
//! - **`api`**: the HTTP façade. Routes, filtering, validation of replacement
//!   payloads, auth, CORS, compression, body limits and static assets.
//! - **`config`**: environment-driven settings (`PORT`, `ADMIN_PASSWORD`, ...).
//! - **`lifecycle`**: signal handling and the final flush on exit.
//! - **`persistence`**: the `DataStore`. Atomic temp-write + rename saves,
//!   self-healing loads with corrupt-file backups, and the data version counter.

pub mod api;
pub mod config;
pub mod lifecycle;
pub mod persistence;
