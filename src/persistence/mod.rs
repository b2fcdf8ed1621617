//! Persistence Module
//!
//! Owns the on-disk mirror of the dataset and the single in-memory copy that
//! every request reads from.
//!
//! ## Guarantees
//! - **Atomic saves**: the dataset is written to a sibling temp file, fsynced, and
//!   renamed over the real file. A reader never sees a half-written file and a
//!   crash mid-write leaves the previous file intact.
//! - **Self-healing load**: a missing file is created empty; a corrupt file is
//!   copied to a timestamped backup and replaced by an empty array; an array with
//!   non-object elements is backed up and keeps its objects. A failed backup is
//!   only logged. `load()` can not fail.
//! - **Versioning**: a counter bumped once per load and once per successful save,
//!   so clients can tell when the snapshot changed.
//!
//! ## Submodules
//! - **`atomic`**: temp-write + rename primitive and corrupt-file backups.
//! - **`store`**: `DataStore`, the owned mutable dataset with its version counter.
//! - **`types`**: records, snapshots, load outcomes and errors.

pub mod atomic;
pub mod store;
pub mod types;

pub use store::DataStore;
pub use types::{FileStats, LoadOutcome, PersistError, Record, Snapshot};

#[cfg(test)]
mod tests;
