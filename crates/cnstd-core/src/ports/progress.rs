//! Progress reporting port for UI integration.

/// Events emitted while transferring a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A transfer started.
    Started {
        /// Name shown to the user (model name or file name).
        name: String,
        /// Total size in bytes, if the server reported it.
        total: Option<u64>,
    },
    /// More bytes arrived.
    Advanced {
        /// Name of the transfer.
        name: String,
        /// Bytes received so far.
        downloaded: u64,
    },
    /// The transfer completed and was verified.
    Finished {
        /// Name of the transfer.
        name: String,
        /// Total bytes received.
        bytes: u64,
    },
    /// A transfer stopped with an error.
    Failed {
        /// Name of the transfer.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// A transfer was not needed because a valid copy already exists.
    Skipped {
        /// Name of the transfer.
        name: String,
        /// Why nothing was downloaded.
        reason: String,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
