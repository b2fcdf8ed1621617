//! Process Lifecycle
//!
//! Shutdown hooks for the dataset. Clean exits (SIGINT / SIGTERM) and fatal
//! server failures both go through `flush_on_exit`, which calls the same
//! `DataStore::save` the save endpoints use, so durability has one code path.

use crate::persistence::DataStore;

/// Why the process is going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A termination signal arrived and the server drained.
    Signal,
    /// The server task returned an error or panicked.
    Fatal,
}

impl ExitReason {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Signal => 0,
            Self::Fatal => 1,
        }
    }
}

/// Resolves when SIGINT or SIGTERM (Ctrl-C on non-unix) is received.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, saving data and shutting down gracefully"),
                    _ = sigint.recv() => tracing::info!("SIGINT received, saving data and shutting down gracefully"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to install signal handlers ({}), falling back to Ctrl-C", e);
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl-C received, saving data and shutting down gracefully"),
        Err(e) => {
            tracing::error!("Unable to listen for shutdown signals: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Best-effort final save. Returns whether the dataset reached the disk.
///
/// Runs synchronously with no timeout; a hung filesystem hangs the exit too.
pub fn flush_on_exit(store: &DataStore, reason: ExitReason) -> bool {
    match store.save() {
        Ok(version) => {
            tracing::info!(
                "Flushed {} records before exit ({:?}, version {})",
                store.len(),
                reason,
                version
            );
            true
        }
        Err(e) => {
            tracing::error!("Error saving data during shutdown ({:?}): {}", reason, e);
            false
        }
    }
}

#[cfg(test)]
mod tests;
