//! Timing of the document under inspection.

use perf::{DocumentTiming, DocumentTimingSource};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The root document of the inspected context, if one is loaded.
///
/// Navigation attaches a fresh document; paint and load milestones are
/// marked on it as they happen.
#[derive(Debug, Default)]
pub struct InspectedDocument {
    timing: Mutex<Option<DocumentTiming>>,
}

impl InspectedDocument {
    /// Create a context with no document.
    pub fn new() -> Self {
        Self::default()
    }

    fn timing(&self) -> MutexGuard<'_, Option<DocumentTiming>> {
        self.timing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Associate a new document; its milestones start unset.
    pub fn attach(&self) {
        *self.timing() = Some(DocumentTiming::default());
    }

    /// Drop the current document.
    pub fn detach(&self) {
        *self.timing() = None;
    }

    /// Whether a document is attached.
    pub fn is_attached(&self) -> bool {
        self.timing().is_some()
    }

    /// Record the first meaningful paint. Ignored without a document.
    pub fn mark_first_meaningful_paint(&self, timestamp: f64) {
        if let Some(timing) = self.timing().as_mut() {
            timing.first_meaningful_paint = timestamp;
        }
    }

    /// Record the DOMContentLoaded event start. Ignored without a document.
    pub fn mark_dom_content_loaded(&self, timestamp: f64) {
        if let Some(timing) = self.timing().as_mut() {
            timing.dom_content_loaded = timestamp;
        }
    }
}

impl DocumentTimingSource for InspectedDocument {
    fn document_timing(&self) -> Option<DocumentTiming> {
        *self.timing()
    }
}
