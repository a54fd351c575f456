//! Page Performance Metrics
//!
//! This crate holds the aggregate state of the performance agent:
//! - Nesting-aware phase timing for script, style recalculation, and layout
//! - Top-level task duration matched by start time
//! - A registry that assembles an ordered metric snapshot on demand
//!
//! Nothing here reads a clock. Hosts pass elapsed times and task timestamps
//! in, all in seconds.
//!
//! # Example
//!
//! ```rust
//! use perf::{metric_value, MetricsRegistry, NoDocument, NoInstanceCounters, PhaseKind};
//!
//! let mut registry = MetricsRegistry::new();
//! registry.enable();
//!
//! registry.will_phase(PhaseKind::Layout);
//! registry.will_phase(PhaseKind::Layout); // forced layout inside a layout
//! registry.did_phase(PhaseKind::Layout, 0.005);
//! registry.did_phase(PhaseKind::Layout, 0.007);
//!
//! let metrics = registry.snapshot(&NoInstanceCounters, &NoDocument);
//! assert_eq!(metric_value(&metrics, "LayoutCount"), Some(1.0));
//! assert_eq!(metric_value(&metrics, "LayoutDuration"), Some(0.007));
//! ```

mod metrics;
mod phase;
mod registry;
mod source;
mod task;

pub use metrics::*;
pub use phase::*;
pub use registry::*;
pub use source::*;
pub use task::*;
