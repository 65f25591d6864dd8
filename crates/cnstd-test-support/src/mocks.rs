//! Mock implementations of core port traits.

use std::sync::{Mutex, PoisonError};

use cnstd_core::{ProgressEvent, ProgressSink};

/// Progress sink that records every event for later assertions.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true if a `Finished` event was recorded for `name`.
    #[must_use]
    pub fn finished(&self, name: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Finished { name: n, .. } if n == name))
    }

    /// Returns true if a `Failed` event was recorded for `name`.
    #[must_use]
    pub fn failed(&self, name: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Failed { name: n, .. } if n == name))
    }

    /// Returns true if a `Skipped` event was recorded for `name`.
    #[must_use]
    pub fn skipped(&self, name: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Skipped { name: n, .. } if n == name))
    }
}

impl ProgressSink for RecordingProgress {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingProgress::new();
        sink.on_event(ProgressEvent::Started {
            name: "a".into(),
            total: Some(3),
        });
        sink.on_event(ProgressEvent::Finished {
            name: "a".into(),
            bytes: 3,
        });
        assert_eq!(sink.events().len(), 2);
        assert!(sink.finished("a"));
        assert!(!sink.skipped("a"));
        assert!(!sink.failed("a"));
    }
}
