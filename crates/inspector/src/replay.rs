//! Replay of recorded instrumentation traces.
//!
//! A trace is a JSON-lines file, one event per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! {"type": "enable"}
//! {"type": "phaseBegin", "kind": "layout"}
//! {"type": "phaseEnd", "kind": "layout", "elapsed": 0.004}
//! {"type": "taskWillProcess", "startTime": 10.0}
//! {"type": "taskDidProcess", "startTime": 10.0, "endTime": 10.02}
//! {"type": "timeStamp", "label": "after first task"}
//! {"type": "getMetrics"}
//! ```
//!
//! Instrumentation events go through the agent's bus, so a trace exercises
//! the same path as a live host.

use crate::agent::MetricsAgent;
use crate::error::{InspectorError, InspectorResult};
use perf::{Metric, PhaseKind};
use serde::{Deserialize, Serialize};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TraceEvent {
    /// Client enables the agent
    Enable,
    /// Client disables the agent
    Disable,
    /// A phase begins
    PhaseBegin {
        /// Phase kind
        kind: PhaseKind,
    },
    /// A phase ends after `elapsed` seconds
    PhaseEnd {
        /// Phase kind
        kind: PhaseKind,
        /// Elapsed seconds reported by the probe
        elapsed: f64,
    },
    /// A top-level task is about to run
    TaskWillProcess {
        /// Scheduler start time
        start_time: f64,
    },
    /// A top-level task finished
    TaskDidProcess {
        /// Scheduler start time
        start_time: f64,
        /// Scheduler end time
        end_time: f64,
    },
    /// Host requests a labeled snapshot
    TimeStamp {
        /// Label of the snapshot
        label: String,
    },
    /// Client queries the metrics
    GetMetrics,
}

/// Parse a JSON-lines trace.
pub fn parse_trace(input: &str) -> InspectorResult<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| InspectorError::InvalidTrace {
            line: index + 1,
            message: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Apply `events` to `agent`.
///
/// `on_metrics` receives the result of every `getMetrics` as it is reached,
/// so its output interleaves with time stamp events sent to the frontend.
/// Returns the number of queries answered.
pub fn replay(
    agent: &mut MetricsAgent,
    events: &[TraceEvent],
    mut on_metrics: impl FnMut(Vec<Metric>),
) -> usize {
    let bus = agent.bus().clone();
    let mut queries = 0;

    for event in events {
        match event {
            TraceEvent::Enable => agent.enable(),
            TraceEvent::Disable => agent.disable(),
            TraceEvent::PhaseBegin { kind } => {
                bus.phase_begin(*kind);
            }
            TraceEvent::PhaseEnd { kind, elapsed } => bus.phase_end(*kind, *elapsed),
            TraceEvent::TaskWillProcess { start_time } => bus.will_process_task(*start_time),
            TraceEvent::TaskDidProcess {
                start_time,
                end_time,
            } => bus.did_process_task(*start_time, *end_time),
            TraceEvent::TimeStamp { label } => agent.time_stamp(label),
            TraceEvent::GetMetrics => {
                queries += 1;
                on_metrics(agent.get_metrics());
            }
        }
    }

    tracing::debug!(
        target: "perf::replay",
        events = events.len(),
        queries,
        "trace replayed"
    );
    queries
}
