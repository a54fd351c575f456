//! Instrumentation bus connecting host call sites to agents.
//!
//! Call sites report phases and tasks to the bus; the bus forwards them to
//! every subscribed observer. A subscription is an owned token and the
//! observer stays attached exactly as long as the token lives.

use crate::probe::{PhaseProbe, PhaseScope};
use perf::PhaseKind;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

/// Receives instrumentation notifications from the bus.
pub trait InstrumentationObserver: Send + Sync {
    /// A phase begins. Return `true` if the probe should capture its start time.
    fn will_phase(&self, kind: PhaseKind) -> bool;

    /// A phase ended after `elapsed` seconds.
    fn did_phase(&self, kind: PhaseKind, elapsed: f64);

    /// A top-level task is about to run.
    fn will_process_task(&self, _start_time: f64) {}

    /// A top-level task finished.
    fn did_process_task(&self, _start_time: f64, _end_time: f64) {}
}

type ObserverList = Vec<(u64, Arc<dyn InstrumentationObserver>)>;

struct BusInner {
    next_id: AtomicU64,
    observers: Mutex<ObserverList>,
    epoch: Instant,
}

impl BusInner {
    fn observers(&self) -> MutexGuard<'_, ObserverList> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dispatches instrumentation notifications to subscribed observers.
///
/// Cloning the bus yields another handle to the same subscriber list.
#[derive(Clone)]
pub struct InstrumentationBus {
    inner: Arc<BusInner>,
}

impl Default for InstrumentationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstrumentationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentationBus")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl InstrumentationBus {
    /// Create a bus with no observers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                observers: Mutex::new(Vec::new()),
                epoch: Instant::now(),
            }),
        }
    }

    /// Attach an observer until the returned subscription is dropped.
    pub fn subscribe(&self, observer: Arc<dyn InstrumentationObserver>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers().push((id, observer));
        tracing::trace!(target: "perf::bus", subscription = id, "observer subscribed");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers().len()
    }

    /// Whether any observer is attached.
    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    // Dispatch works on a copy so observers may subscribe or unsubscribe
    // while being notified.
    fn snapshot(&self) -> Vec<Arc<dyn InstrumentationObserver>> {
        self.inner
            .observers()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    /// Report a phase begin. Returns `true` if any observer wants its start timed.
    pub fn phase_begin(&self, kind: PhaseKind) -> bool {
        self.snapshot()
            .iter()
            .fold(false, |capture, observer| observer.will_phase(kind) | capture)
    }

    /// Report a phase end with an externally measured elapsed time, in seconds.
    pub fn phase_end(&self, kind: PhaseKind, elapsed: f64) {
        for observer in self.snapshot() {
            observer.did_phase(kind, elapsed);
        }
    }

    /// Report the begin of a probed phase.
    pub fn will(&self, probe: &PhaseProbe) {
        if self.phase_begin(probe.kind()) {
            probe.capture_start_time();
        }
    }

    /// Report the end of a probed phase.
    pub fn did(&self, probe: &PhaseProbe) {
        if !self.has_observers() {
            return;
        }
        self.phase_end(probe.kind(), probe.duration());
    }

    /// Report a phase for as long as the returned guard lives.
    pub fn scope(&self, kind: PhaseKind) -> PhaseScope<'_> {
        PhaseScope::new(self, kind)
    }

    /// Report that a top-level task is about to run.
    pub fn will_process_task(&self, start_time: f64) {
        for observer in self.snapshot() {
            observer.will_process_task(start_time);
        }
    }

    /// Report that a top-level task finished.
    pub fn did_process_task(&self, start_time: f64, end_time: f64) {
        for observer in self.snapshot() {
            observer.did_process_task(start_time, end_time);
        }
    }

    /// Seconds since the bus was created.
    pub fn monotonic_time(&self) -> f64 {
        self.inner.epoch.elapsed().as_secs_f64()
    }

    /// Run `f` as a top-level task, timestamped with [`monotonic_time`](Self::monotonic_time).
    pub fn run_task<R>(&self, f: impl FnOnce() -> R) -> R {
        let start_time = self.monotonic_time();
        self.will_process_task(start_time);
        let result = f();
        self.did_process_task(start_time, self.monotonic_time());
        result
    }
}

/// Owned registration of an observer on a bus.
///
/// Dropping the subscription detaches the observer. It holds no strong
/// reference to the bus, so it may outlive it.
#[must_use = "the observer is detached when the subscription is dropped"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Identifier of this subscription, unique per bus.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.observers().retain(|(id, _)| *id != self.id);
            tracing::trace!(target: "perf::bus", subscription = self.id, "observer unsubscribed");
        }
    }
}
