//! The aggregate state behind the performance agent.

use crate::metrics::{names, Metric, PageMetrics};
use crate::phase::{PhaseKind, PhaseTimer};
use crate::source::{DocumentTimingSource, InstanceCounterSource};
use crate::task::TaskTimeTracker;

/// Phase and task accumulators plus the enabled flag.
///
/// Notifications arriving while disabled are ignored. Disabling keeps the
/// accumulated values; enabling again continues from them.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    enabled: bool,
    phases: PhaseTimer,
    tasks: TaskTimeTracker,
}

impl MetricsRegistry {
    /// Create a disabled registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting notifications.
    ///
    /// Returns `true` if the registry was disabled before. The task window is
    /// reset on that transition; counters are kept.
    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        self.tasks.reset_window();
        true
    }

    /// Stop accepting notifications. Returns `true` if it was enabled.
    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        // Intervals still open now will never see their end.
        self.phases.clear_depths();
        true
    }

    /// Whether the registry accepts notifications.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A phase begins. Returns `true` if its start time should be captured.
    pub fn will_phase(&mut self, kind: PhaseKind) -> bool {
        self.enabled && self.phases.begin(kind)
    }

    /// A phase ended after `elapsed` seconds.
    pub fn did_phase(&mut self, kind: PhaseKind, elapsed: f64) {
        if self.enabled {
            self.phases.end(kind, elapsed);
        }
    }

    /// A top-level task is about to run.
    pub fn will_process_task(&mut self, start_time: f64) {
        if self.enabled {
            self.tasks.will_process(start_time);
        }
    }

    /// A top-level task finished.
    pub fn did_process_task(&mut self, start_time: f64, end_time: f64) {
        if self.enabled {
            self.tasks.did_process(start_time, end_time);
        }
    }

    /// Current page counters and durations, regardless of the enabled flag.
    pub fn page_metrics(&self) -> PageMetrics {
        PageMetrics::collect(&self.phases, &self.tasks)
    }

    /// Assemble the ordered metric list.
    ///
    /// Empty while disabled. Otherwise instance counters come first, then
    /// the page metrics, then the document timings if a document exists.
    pub fn snapshot(
        &self,
        counters: &dyn InstanceCounterSource,
        document: &dyn DocumentTimingSource,
    ) -> Vec<Metric> {
        if !self.enabled {
            return Vec::new();
        }

        let mut metrics = counters.counters();
        self.page_metrics().append_to(&mut metrics);

        if let Some(timing) = document.document_timing() {
            metrics.push(Metric::new(
                names::FIRST_MEANINGFUL_PAINT,
                timing.first_meaningful_paint,
            ));
            metrics.push(Metric::new(names::DOM_CONTENT_LOADED, timing.dom_content_loaded));
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::metric_value;
    use crate::source::{DocumentTiming, NoDocument, NoInstanceCounters};

    struct FixedCounters;

    impl InstanceCounterSource for FixedCounters {
        fn counters(&self) -> Vec<Metric> {
            vec![Metric::new("DocumentCount", 1.0), Metric::new("NodeCount", 42.0)]
        }
    }

    fn names_of(metrics: &[Metric]) -> Vec<&str> {
        metrics.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_new_registry_is_disabled() {
        let registry = MetricsRegistry::new();
        assert!(!registry.is_enabled());
        assert!(registry.snapshot(&FixedCounters, &NoDocument).is_empty());
    }

    #[test]
    fn test_enable_disable_transitions() {
        let mut registry = MetricsRegistry::new();
        assert!(registry.enable());
        assert!(!registry.enable());
        assert!(registry.disable());
        assert!(!registry.disable());
    }

    #[test]
    fn test_snapshot_order_without_document() {
        let mut registry = MetricsRegistry::new();
        registry.enable();

        let metrics = registry.snapshot(&FixedCounters, &NoDocument);
        assert_eq!(
            names_of(&metrics),
            vec![
                "DocumentCount",
                "NodeCount",
                "LayoutCount",
                "RecalcStyleCount",
                "LayoutDuration",
                "RecalcStyleDuration",
                "ScriptDuration",
                "TaskDuration",
            ]
        );
    }

    #[test]
    fn test_snapshot_appends_document_timing() {
        let mut registry = MetricsRegistry::new();
        registry.enable();
        let timing = DocumentTiming {
            first_meaningful_paint: 1.5,
            dom_content_loaded: 0.75,
        };

        let metrics = registry.snapshot(&NoInstanceCounters, &timing);
        assert_eq!(metrics.len(), 8);
        assert_eq!(metrics[6].name, "FirstMeaningfulPaint");
        assert_eq!(metrics[6].value, 1.5);
        assert_eq!(metrics[7].name, "DomContentLoaded");
        assert_eq!(metrics[7].value, 0.75);
    }

    #[test]
    fn test_notifications_ignored_while_disabled() {
        let mut registry = MetricsRegistry::new();
        assert!(!registry.will_phase(PhaseKind::Layout));
        registry.did_phase(PhaseKind::Layout, 1.0);
        registry.will_process_task(1.0);
        registry.did_process_task(1.0, 2.0);

        assert_eq!(registry.page_metrics(), PageMetrics::default());
    }

    #[test]
    fn test_history_survives_disable() {
        let mut registry = MetricsRegistry::new();
        registry.enable();
        for _ in 0..3 {
            registry.will_phase(PhaseKind::Layout);
            registry.did_phase(PhaseKind::Layout, 0.5);
        }
        registry.disable();
        assert!(registry.snapshot(&NoInstanceCounters, &NoDocument).is_empty());

        registry.enable();
        let metrics = registry.snapshot(&NoInstanceCounters, &NoDocument);
        assert_eq!(metric_value(&metrics, "LayoutCount"), Some(3.0));
        assert_eq!(metric_value(&metrics, "LayoutDuration"), Some(1.5));
    }

    #[test]
    fn test_enable_resets_task_window() {
        let mut registry = MetricsRegistry::new();
        registry.enable();
        registry.will_process_task(10.0);
        registry.disable();
        registry.enable();

        // The window opened before the disable no longer matches
        registry.did_process_task(10.0, 12.0);
        assert_eq!(registry.page_metrics().task_duration, 0.0);
    }

    #[test]
    fn test_zero_start_matches_after_enable() {
        let mut registry = MetricsRegistry::new();
        registry.enable();

        // No will_process_task since enabling; the reset window starts at 0
        registry.did_process_task(0.0, 0.25);
        assert_eq!(registry.page_metrics().task_duration, 0.25);
    }

    #[test]
    fn test_disable_closes_open_phases() {
        let mut registry = MetricsRegistry::new();
        registry.enable();
        registry.will_phase(PhaseKind::Layout);
        registry.disable();
        registry.enable();

        assert!(registry.will_phase(PhaseKind::Layout));
        registry.did_phase(PhaseKind::Layout, 2.0);
        assert_eq!(registry.page_metrics().layout_count, 1);
        assert_eq!(registry.page_metrics().layout_duration, 2.0);
    }
}
