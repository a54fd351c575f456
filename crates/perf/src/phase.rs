//! Nesting-aware accumulation of instrumented execution phases.
//!
//! Hosts report every phase as a begin/end pair. Script and layout phases can
//! re-enter themselves (a layout forced from inside a layout, a function call
//! made while a script executes), so only the outermost pair of a nest is
//! timed. Style recalculation never nests and every pair is timed.

use serde::{Deserialize, Serialize};

/// Kind of execution phase reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    /// A script function invoked by the host
    FunctionCall,
    /// Evaluation of a whole script
    ScriptExecute,
    /// Style recalculation
    StyleRecalc,
    /// Layout update
    Layout,
}

const PHASE_KINDS: usize = 4;
const DEPTH_GROUPS: usize = 2;

impl PhaseKind {
    #[inline]
    fn index(self) -> usize {
        match self {
            PhaseKind::FunctionCall => 0,
            PhaseKind::ScriptExecute => 1,
            PhaseKind::StyleRecalc => 2,
            PhaseKind::Layout => 3,
        }
    }

    /// Slot of the nesting counter this kind shares, `None` for kinds that
    /// never nest.
    ///
    /// Function calls and script execution share one counter: either one
    /// running inside the other is inner script work.
    #[inline]
    fn depth_slot(self) -> Option<usize> {
        match self {
            PhaseKind::FunctionCall | PhaseKind::ScriptExecute => Some(0),
            PhaseKind::Layout => Some(1),
            PhaseKind::StyleRecalc => None,
        }
    }

    /// Short lowercase label used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::FunctionCall => "function_call",
            PhaseKind::ScriptExecute => "script_execute",
            PhaseKind::StyleRecalc => "style_recalc",
            PhaseKind::Layout => "layout",
        }
    }
}

/// Count and cumulative duration of one phase kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAccumulator {
    /// Number of timed (outermost) occurrences
    pub count: u64,
    /// Sum of their elapsed times, in seconds
    pub total_duration: f64,
}

impl PhaseAccumulator {
    fn record(&mut self, elapsed: f64) {
        self.count += 1;
        self.total_duration += sanitize_elapsed(elapsed);
    }
}

/// Negative or non-finite elapsed values would make the total go backwards.
#[inline]
pub(crate) fn sanitize_elapsed(elapsed: f64) -> f64 {
    if elapsed.is_finite() && elapsed > 0.0 {
        elapsed
    } else {
        0.0
    }
}

/// Collapses begin/end notifications into one sample per outermost phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    accumulators: [PhaseAccumulator; PHASE_KINDS],
    depths: [u32; DEPTH_GROUPS],
}

impl PhaseTimer {
    /// Create a timer with zeroed accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a phase.
    ///
    /// Returns `true` when this begin opens an outermost interval, i.e. when
    /// the caller's probe should capture its start time.
    pub fn begin(&mut self, kind: PhaseKind) -> bool {
        match kind.depth_slot() {
            Some(slot) => {
                let depth = &mut self.depths[slot];
                *depth = depth.saturating_add(1);
                *depth == 1
            }
            None => true,
        }
    }

    /// Record the end of a phase with the elapsed time its probe measured.
    ///
    /// The elapsed value is accumulated only if this end closes the outermost
    /// interval. Returns `true` when a sample was recorded.
    pub fn end(&mut self, kind: PhaseKind, elapsed: f64) -> bool {
        if let Some(slot) = kind.depth_slot() {
            let depth = &mut self.depths[slot];
            if *depth == 0 {
                tracing::debug!(
                    target: "perf::phase",
                    phase = kind.as_str(),
                    "unbalanced phase end ignored"
                );
                return false;
            }
            *depth -= 1;
            if *depth > 0 {
                return false;
            }
        }

        self.accumulators[kind.index()].record(elapsed);
        tracing::trace!(
            target: "perf::phase",
            phase = kind.as_str(),
            elapsed_s = elapsed,
            "phase recorded"
        );
        true
    }

    /// Accumulated count and duration for a phase kind.
    pub fn accumulator(&self, kind: PhaseKind) -> PhaseAccumulator {
        self.accumulators[kind.index()]
    }

    #[cfg(test)]
    fn depth(&self, kind: PhaseKind) -> u32 {
        kind.depth_slot().map_or(0, |slot| self.depths[slot])
    }

    /// Combined duration of function calls and script execution.
    pub fn script_duration(&self) -> f64 {
        self.accumulator(PhaseKind::FunctionCall).total_duration
            + self.accumulator(PhaseKind::ScriptExecute).total_duration
    }

    /// Forget open intervals without touching the accumulators.
    pub fn clear_depths(&mut self) {
        self.depths = [0; DEPTH_GROUPS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_layout_is_timed() {
        let mut timer = PhaseTimer::new();
        assert!(timer.begin(PhaseKind::Layout));
        assert!(timer.end(PhaseKind::Layout, 0.25));

        let acc = timer.accumulator(PhaseKind::Layout);
        assert_eq!(acc.count, 1);
        assert_eq!(acc.total_duration, 0.25);
        assert_eq!(timer.depth(PhaseKind::Layout), 0);
    }

    #[test]
    fn test_nested_layout_keeps_outermost_elapsed() {
        let mut timer = PhaseTimer::new();
        assert!(timer.begin(PhaseKind::Layout));
        assert!(!timer.begin(PhaseKind::Layout));
        assert!(!timer.end(PhaseKind::Layout, 5.0));
        assert!(timer.end(PhaseKind::Layout, 7.0));

        let acc = timer.accumulator(PhaseKind::Layout);
        assert_eq!(acc.count, 1);
        assert_eq!(acc.total_duration, 7.0);
    }

    #[test]
    fn test_unbalanced_end_is_ignored() {
        let mut timer = PhaseTimer::new();
        assert!(!timer.end(PhaseKind::Layout, 3.0));
        assert_eq!(timer.depth(PhaseKind::Layout), 0);
        assert_eq!(timer.accumulator(PhaseKind::Layout), PhaseAccumulator::default());

        // Later measurements are unaffected
        timer.begin(PhaseKind::Layout);
        timer.end(PhaseKind::Layout, 1.5);
        assert_eq!(timer.accumulator(PhaseKind::Layout).count, 1);
        assert_eq!(timer.accumulator(PhaseKind::Layout).total_duration, 1.5);
    }

    #[test]
    fn test_style_recalc_times_every_pair() {
        let mut timer = PhaseTimer::new();
        assert!(timer.begin(PhaseKind::StyleRecalc));
        assert!(timer.begin(PhaseKind::StyleRecalc));
        assert!(timer.end(PhaseKind::StyleRecalc, 1.0));
        assert!(timer.end(PhaseKind::StyleRecalc, 2.0));
        // No matching begin, still counted
        assert!(timer.end(PhaseKind::StyleRecalc, 0.5));

        let acc = timer.accumulator(PhaseKind::StyleRecalc);
        assert_eq!(acc.count, 3);
        assert_eq!(acc.total_duration, 3.5);
        assert_eq!(timer.depth(PhaseKind::StyleRecalc), 0);
    }

    #[test]
    fn test_script_kinds_share_nesting() {
        let mut timer = PhaseTimer::new();
        assert!(timer.begin(PhaseKind::ScriptExecute));
        assert!(!timer.begin(PhaseKind::FunctionCall));
        assert!(!timer.end(PhaseKind::FunctionCall, 0.1));
        assert!(timer.end(PhaseKind::ScriptExecute, 0.4));

        assert_eq!(timer.accumulator(PhaseKind::FunctionCall).count, 0);
        assert_eq!(timer.accumulator(PhaseKind::ScriptExecute).count, 1);
        assert_eq!(timer.script_duration(), 0.4);
    }

    #[test]
    fn test_script_duration_sums_both_kinds() {
        let mut timer = PhaseTimer::new();
        timer.begin(PhaseKind::FunctionCall);
        timer.end(PhaseKind::FunctionCall, 0.5);
        timer.begin(PhaseKind::ScriptExecute);
        timer.end(PhaseKind::ScriptExecute, 0.25);

        assert_eq!(timer.script_duration(), 0.75);
    }

    #[test]
    fn test_layout_and_script_nest_independently() {
        let mut timer = PhaseTimer::new();
        timer.begin(PhaseKind::FunctionCall);
        assert!(timer.begin(PhaseKind::Layout));
        assert!(timer.end(PhaseKind::Layout, 0.2));
        assert!(timer.end(PhaseKind::FunctionCall, 0.6));

        assert_eq!(timer.accumulator(PhaseKind::Layout).total_duration, 0.2);
        assert_eq!(timer.script_duration(), 0.6);
    }

    #[test]
    fn test_invalid_elapsed_counts_as_zero() {
        let mut timer = PhaseTimer::new();
        timer.begin(PhaseKind::Layout);
        timer.end(PhaseKind::Layout, -4.0);
        timer.begin(PhaseKind::Layout);
        timer.end(PhaseKind::Layout, f64::NAN);

        let acc = timer.accumulator(PhaseKind::Layout);
        assert_eq!(acc.count, 2);
        assert_eq!(acc.total_duration, 0.0);
    }

    #[test]
    fn test_clear_depths_keeps_totals() {
        let mut timer = PhaseTimer::new();
        timer.begin(PhaseKind::Layout);
        timer.end(PhaseKind::Layout, 1.0);
        timer.begin(PhaseKind::Layout);
        timer.clear_depths();

        assert_eq!(timer.depth(PhaseKind::Layout), 0);
        assert_eq!(timer.accumulator(PhaseKind::Layout).count, 1);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Begin,
        End(f64),
    }

    fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
        prop::collection::vec(
            prop_oneof![Just(Step::Begin), (0.0f64..10.0).prop_map(Step::End)],
            0..64,
        )
    }

    proptest! {
        #[test]
        fn outermost_intervals_only(steps in arb_steps()) {
            let mut timer = PhaseTimer::new();
            let mut depth: u32 = 0;
            let mut expected_total = 0.0;
            let mut expected_count = 0u64;

            for step in &steps {
                match *step {
                    Step::Begin => {
                        let outermost = timer.begin(PhaseKind::Layout);
                        depth += 1;
                        prop_assert_eq!(outermost, depth == 1);
                    }
                    Step::End(elapsed) => {
                        timer.end(PhaseKind::Layout, elapsed);
                        if depth > 0 {
                            depth -= 1;
                            if depth == 0 {
                                expected_total += elapsed;
                                expected_count += 1;
                            }
                        }
                    }
                }
                prop_assert_eq!(timer.depth(PhaseKind::Layout), depth);
            }

            let acc = timer.accumulator(PhaseKind::Layout);
            prop_assert_eq!(acc.count, expected_count);
            prop_assert!((acc.total_duration - expected_total).abs() < 1e-9);
        }

        #[test]
        fn totals_never_decrease(steps in arb_steps()) {
            let mut timer = PhaseTimer::new();
            let mut last = PhaseAccumulator::default();
            for step in &steps {
                match *step {
                    Step::Begin => { timer.begin(PhaseKind::ScriptExecute); }
                    Step::End(elapsed) => { timer.end(PhaseKind::ScriptExecute, elapsed); }
                }
                let acc = timer.accumulator(PhaseKind::ScriptExecute);
                prop_assert!(acc.count >= last.count);
                prop_assert!(acc.total_duration >= last.total_duration);
                last = acc;
            }
        }
    }
}
