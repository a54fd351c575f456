//! The performance agent.

use crate::bus::{InstrumentationBus, InstrumentationObserver, Subscription};
use crate::config::AgentConfig;
use crate::frontend::{MetricsEvent, MetricsFrontend, NullFrontend};
use crate::state::AgentState;
use perf::{
    DocumentTimingSource, InstanceCounterSource, Metric, MetricsRegistry, NoDocument,
    NoInstanceCounters, PageMetrics, PhaseKind,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock(registry: &Mutex<MetricsRegistry>) -> MutexGuard<'_, MetricsRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Feeds bus notifications into the agent's registry.
struct RegistryObserver {
    registry: Arc<Mutex<MetricsRegistry>>,
}

impl InstrumentationObserver for RegistryObserver {
    fn will_phase(&self, kind: PhaseKind) -> bool {
        lock(&self.registry).will_phase(kind)
    }

    fn did_phase(&self, kind: PhaseKind, elapsed: f64) {
        lock(&self.registry).did_phase(kind, elapsed);
    }

    fn will_process_task(&self, start_time: f64) {
        lock(&self.registry).will_process_task(start_time);
    }

    fn did_process_task(&self, start_time: f64, end_time: f64) {
        lock(&self.registry).did_process_task(start_time, end_time);
    }
}

/// Collects page performance metrics while enabled.
///
/// Enabling persists the flag and subscribes the registry to the
/// instrumentation bus; disabling persists the flag and drops the
/// subscription. Collected values survive a disable.
///
/// # Example
///
/// ```rust
/// use inspector::{AgentConfig, InstrumentationBus, MemoryState, MetricsAgent};
/// use perf::{metric_value, PhaseKind};
///
/// let bus = InstrumentationBus::new();
/// let state = Box::new(MemoryState::new());
/// let mut agent = MetricsAgent::new(AgentConfig::default(), bus.clone(), state);
/// agent.enable();
///
/// bus.phase_begin(PhaseKind::StyleRecalc);
/// bus.phase_end(PhaseKind::StyleRecalc, 0.002);
///
/// let metrics = agent.get_metrics();
/// assert_eq!(metric_value(&metrics, "RecalcStyleCount"), Some(1.0));
/// ```
pub struct MetricsAgent {
    config: AgentConfig,
    registry: Arc<Mutex<MetricsRegistry>>,
    bus: InstrumentationBus,
    subscription: Option<Subscription>,
    state: Box<dyn AgentState>,
    counters: Arc<dyn InstanceCounterSource>,
    document: Arc<dyn DocumentTimingSource>,
    frontend: Box<dyn MetricsFrontend>,
}

impl fmt::Debug for MetricsAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsAgent")
            .field("config", &self.config)
            .field("enabled", &self.is_enabled())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl MetricsAgent {
    /// Create a disabled agent with no instance counters, no document, and
    /// a frontend that drops events.
    pub fn new(config: AgentConfig, bus: InstrumentationBus, state: Box<dyn AgentState>) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(MetricsRegistry::new())),
            bus,
            subscription: None,
            state,
            counters: Arc::new(NoInstanceCounters),
            document: Arc::new(NoDocument),
            frontend: Box::new(NullFrontend),
        }
    }

    /// Report instance counters from `counters`.
    pub fn with_instance_counters(mut self, counters: Arc<dyn InstanceCounterSource>) -> Self {
        self.counters = counters;
        self
    }

    /// Report document timings from `document`.
    pub fn with_document(mut self, document: Arc<dyn DocumentTimingSource>) -> Self {
        self.document = document;
        self
    }

    /// Send time stamp events to `frontend`.
    pub fn with_frontend(mut self, frontend: Box<dyn MetricsFrontend>) -> Self {
        self.frontend = frontend;
        self
    }

    /// Re-enable collection if it was enabled when the state was last saved.
    ///
    /// Called once when a client attaches.
    pub fn restore(&mut self) {
        if self.state.boolean_property(&self.config.state_key, false) {
            tracing::debug!(target: "perf::agent", "restoring enabled performance agent");
            self.enable();
        }
    }

    /// Start collecting. Idempotent and always succeeds.
    pub fn enable(&mut self) {
        if !lock(&self.registry).enable() {
            return;
        }
        self.persist(true);
        let observer = Arc::new(RegistryObserver {
            registry: Arc::clone(&self.registry),
        });
        self.subscription = Some(self.bus.subscribe(observer));
        tracing::info!(target: "perf::agent", "performance agent enabled");
    }

    /// Stop collecting, keeping what was collected. Idempotent and always succeeds.
    pub fn disable(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.persist(false);
        // Detach before flipping the flag so no notification lands in between.
        self.subscription = None;
        lock(&self.registry).disable();
        tracing::info!(target: "perf::agent", "performance agent disabled");
    }

    fn persist(&mut self, enabled: bool) {
        if let Err(e) = self.state.set_boolean(&self.config.state_key, enabled) {
            tracing::warn!(
                target: "perf::agent",
                key = %self.config.state_key,
                enabled,
                "Failed to persist agent state: {}",
                e
            );
        }
    }

    /// Whether metrics are being collected.
    pub fn is_enabled(&self) -> bool {
        lock(&self.registry).is_enabled()
    }

    /// Current metrics in report order; empty while disabled.
    pub fn get_metrics(&self) -> Vec<Metric> {
        lock(&self.registry).snapshot(self.counters.as_ref(), self.document.as_ref())
    }

    /// Current page counters and durations, whether enabled or not.
    pub fn page_metrics(&self) -> PageMetrics {
        lock(&self.registry).page_metrics()
    }

    /// Push the current metrics to the frontend under `title`.
    ///
    /// Does nothing while disabled. Collected values are not reset.
    pub fn time_stamp(&mut self, title: &str) {
        if !self.is_enabled() {
            return;
        }
        let event = MetricsEvent::new(self.get_metrics(), title);
        if let Err(e) = self.frontend.metrics(event) {
            tracing::warn!(target: "perf::agent", title, "Failed to deliver metrics event: {}", e);
        }
    }

    /// The persisted state store.
    pub fn state(&self) -> &dyn AgentState {
        self.state.as_ref()
    }

    /// The bus this agent subscribes to.
    pub fn bus(&self) -> &InstrumentationBus {
        &self.bus
    }
}
