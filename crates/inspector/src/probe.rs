//! Probes measuring instrumented phases.

use crate::bus::InstrumentationBus;
use perf::PhaseKind;
use std::cell::Cell;
use std::time::Instant;

/// One instrumented occurrence of a phase.
///
/// The start time is captured lazily: only when an observer reports that
/// this begin opens an outermost interval. Inner occurrences of a nested
/// phase never read the clock.
///
/// # Example
///
/// ```rust
/// use inspector::{InstrumentationBus, PhaseProbe};
/// use perf::PhaseKind;
///
/// let bus = InstrumentationBus::new();
/// let probe = PhaseProbe::new(PhaseKind::Layout);
/// bus.will(&probe);
/// // ... layout ...
/// bus.did(&probe);
/// ```
#[derive(Debug)]
pub struct PhaseProbe {
    kind: PhaseKind,
    start: Cell<Option<Instant>>,
}

impl PhaseProbe {
    /// Create a probe for the given phase kind.
    #[inline]
    pub fn new(kind: PhaseKind) -> Self {
        Self {
            kind,
            start: Cell::new(None),
        }
    }

    /// Phase kind being measured.
    #[inline]
    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    /// Capture the start time unless it was already captured.
    #[inline]
    pub fn capture_start_time(&self) {
        if self.start.get().is_none() {
            self.start.set(Some(Instant::now()));
        }
    }

    /// Whether a start time has been captured.
    #[inline]
    pub fn start_captured(&self) -> bool {
        self.start.get().is_some()
    }

    /// Seconds since the captured start, or 0 if nothing was captured.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.start
            .get()
            .map_or(0.0, |start| start.elapsed().as_secs_f64())
    }
}

/// RAII guard reporting a phase to the bus for the length of a scope.
///
/// Notifies observers of the begin on creation and of the end on drop.
#[must_use = "the phase ends when the scope guard is dropped"]
pub struct PhaseScope<'a> {
    bus: &'a InstrumentationBus,
    probe: PhaseProbe,
}

impl<'a> PhaseScope<'a> {
    pub(crate) fn new(bus: &'a InstrumentationBus, kind: PhaseKind) -> Self {
        let probe = PhaseProbe::new(kind);
        bus.will(&probe);
        Self { bus, probe }
    }

    /// The probe measuring this scope.
    pub fn probe(&self) -> &PhaseProbe {
        &self.probe
    }
}

impl Drop for PhaseScope<'_> {
    fn drop(&mut self) {
        self.bus.did(&self.probe);
    }
}

/// Report the rest of the enclosing scope as a phase.
///
/// # Example
///
/// ```rust
/// use inspector::{probe_scope, InstrumentationBus};
/// use perf::PhaseKind;
///
/// fn update_layout(bus: &InstrumentationBus) {
///     probe_scope!(bus, PhaseKind::Layout);
///     // ... layout work ...
/// }
/// ```
#[macro_export]
macro_rules! probe_scope {
    ($bus:expr, $kind:expr) => {
        let _probe_scope = $bus.scope($kind);
    };
}
