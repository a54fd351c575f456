//! Metric values and the fixed page metric set

use crate::phase::{PhaseKind, PhaseTimer};
use crate::task::TaskTimeTracker;
use serde::{Deserialize, Serialize};

/// Names of the metrics produced by the registry, in report order.
pub mod names {
    /// Number of outermost layouts
    pub const LAYOUT_COUNT: &str = "LayoutCount";
    /// Number of style recalculations
    pub const RECALC_STYLE_COUNT: &str = "RecalcStyleCount";
    /// Cumulative layout time
    pub const LAYOUT_DURATION: &str = "LayoutDuration";
    /// Cumulative style recalculation time
    pub const RECALC_STYLE_DURATION: &str = "RecalcStyleDuration";
    /// Cumulative script time
    pub const SCRIPT_DURATION: &str = "ScriptDuration";
    /// Cumulative top-level task time
    pub const TASK_DURATION: &str = "TaskDuration";
    /// First meaningful paint timestamp of the inspected document
    pub const FIRST_MEANINGFUL_PAINT: &str = "FirstMeaningfulPaint";
    /// DOMContentLoaded event start of the inspected document
    pub const DOM_CONTENT_LOADED: &str = "DomContentLoaded";
}

/// A single named metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Metric value
    pub value: f64,
}

impl Metric {
    /// Create a new metric.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Look up a metric value by name.
pub fn metric_value(metrics: &[Metric], name: &str) -> Option<f64> {
    metrics.iter().find(|m| m.name == name).map(|m| m.value)
}

/// Cumulative page counters and durations.
///
/// Durations are in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    /// Number of outermost layouts
    pub layout_count: u64,
    /// Number of style recalculations
    pub recalc_style_count: u64,
    /// Cumulative layout time
    pub layout_duration: f64,
    /// Cumulative style recalculation time
    pub recalc_style_duration: f64,
    /// Cumulative function call and script execution time
    pub script_duration: f64,
    /// Cumulative top-level task time
    pub task_duration: f64,
}

impl PageMetrics {
    /// Collect the page metrics from the phase and task accumulators.
    pub fn collect(phases: &PhaseTimer, tasks: &TaskTimeTracker) -> Self {
        let layout = phases.accumulator(PhaseKind::Layout);
        let recalc = phases.accumulator(PhaseKind::StyleRecalc);

        Self {
            layout_count: layout.count,
            recalc_style_count: recalc.count,
            layout_duration: layout.total_duration,
            recalc_style_duration: recalc.total_duration,
            script_duration: phases.script_duration(),
            task_duration: tasks.total_duration(),
        }
    }

    /// Append the page metrics to `out` in report order.
    pub fn append_to(&self, out: &mut Vec<Metric>) {
        out.push(Metric::new(names::LAYOUT_COUNT, self.layout_count as f64));
        out.push(Metric::new(names::RECALC_STYLE_COUNT, self.recalc_style_count as f64));
        out.push(Metric::new(names::LAYOUT_DURATION, self.layout_duration));
        out.push(Metric::new(names::RECALC_STYLE_DURATION, self.recalc_style_duration));
        out.push(Metric::new(names::SCRIPT_DURATION, self.script_duration));
        out.push(Metric::new(names::TASK_DURATION, self.task_duration));
    }
}
