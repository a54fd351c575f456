//! Performance Inspector Agent
//!
//! This crate connects the metrics registry of the `perf` crate to a running
//! host and to an inspecting client:
//!
//! - An instrumentation bus that host call sites report phases and tasks to
//! - Probes and scope guards that time phases lazily
//! - The metrics agent: enable/disable lifecycle, persisted enabled flag,
//!   metric queries, and labeled time stamp events
//! - Default collaborators: instance counters, inspected document timing,
//!   persisted state stores, and frontends
//! - Replay of recorded JSON-lines traces
//!
//! # Example
//!
//! ```rust
//! use inspector::{
//!     probe_scope, AgentConfig, ChannelFrontend, InstrumentationBus, MemoryState, MetricsAgent,
//! };
//! use perf::PhaseKind;
//!
//! let bus = InstrumentationBus::new();
//! let (frontend, mut events) = ChannelFrontend::new();
//! let state = Box::new(MemoryState::new());
//! let mut agent = MetricsAgent::new(AgentConfig::default(), bus.clone(), state)
//!     .with_frontend(Box::new(frontend));
//! agent.enable();
//!
//! bus.run_task(|| {
//!     probe_scope!(bus, PhaseKind::Layout);
//!     // ... layout ...
//! });
//!
//! agent.time_stamp("after layout");
//! let event = events.try_recv().unwrap();
//! assert_eq!(event.title, "after layout");
//! ```

mod agent;
mod bus;
mod config;
mod counters;
mod document;
mod error;
mod frontend;
mod probe;
mod replay;
mod state;

pub use agent::MetricsAgent;
pub use bus::{InstrumentationBus, InstrumentationObserver, Subscription};
pub use config::AgentConfig;
pub use counters::{CounterType, InstanceCounters};
pub use document::InspectedDocument;
pub use error::{InspectorError, InspectorResult};
pub use frontend::{
    metrics_response, ChannelFrontend, JsonLinesFrontend, MetricsEvent, MetricsFrontend,
    NullFrontend, METRICS_EVENT,
};
pub use probe::{PhaseProbe, PhaseScope};
pub use replay::{parse_trace, replay, TraceEvent};
pub use state::{AgentState, FileState, MemoryState, PERFORMANCE_AGENT_ENABLED};
