//! Collaborators queried when a snapshot is assembled.

use crate::metrics::Metric;
use serde::{Deserialize, Serialize};

/// Supplies live-object counts of the host runtime.
pub trait InstanceCounterSource: Send + Sync {
    /// Counter metrics in the source's declared order.
    fn counters(&self) -> Vec<Metric>;
}

/// Paint and load timestamps of the inspected document, in seconds.
///
/// A zero timestamp means the event has not happened yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTiming {
    /// First meaningful paint
    pub first_meaningful_paint: f64,
    /// Start of the DOMContentLoaded event
    pub dom_content_loaded: f64,
}

/// Gives access to the timing of the document currently being inspected.
pub trait DocumentTimingSource: Send + Sync {
    /// `None` when no rendering document is associated with the context.
    fn document_timing(&self) -> Option<DocumentTiming>;
}

/// Counter source reporting nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstanceCounters;

impl InstanceCounterSource for NoInstanceCounters {
    fn counters(&self) -> Vec<Metric> {
        Vec::new()
    }
}

/// Document source for contexts without a rendering document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocument;

impl DocumentTimingSource for NoDocument {
    fn document_timing(&self) -> Option<DocumentTiming> {
        None
    }
}

impl DocumentTimingSource for DocumentTiming {
    fn document_timing(&self) -> Option<DocumentTiming> {
        Some(*self)
    }
}
