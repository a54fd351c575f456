//! Delivery of metrics events to the client.

use crate::error::{InspectorError, InspectorResult};
use perf::Metric;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tokio::sync::mpsc;

/// Protocol name of the metrics event.
pub const METRICS_EVENT: &str = "Performance.metrics";

/// A labeled metrics snapshot pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsEvent {
    /// Snapshot at the time of the event
    pub metrics: Vec<Metric>,
    /// Label given by the host
    pub title: String,
}

impl MetricsEvent {
    /// Create a new event.
    pub fn new(metrics: Vec<Metric>, title: impl Into<String>) -> Self {
        Self {
            metrics,
            title: title.into(),
        }
    }

    /// Wrap the event in a `{ "method", "params" }` envelope.
    pub fn to_message(&self) -> InspectorResult<String> {
        let message = serde_json::json!({
            "method": METRICS_EVENT,
            "params": self,
        });
        Ok(serde_json::to_string(&message)?)
    }
}

/// Wrap a `getMetrics` result in an `{ "id", "result" }` response envelope.
pub fn metrics_response(id: u64, metrics: &[Metric]) -> InspectorResult<String> {
    let message = serde_json::json!({
        "id": id,
        "result": { "metrics": metrics },
    });
    Ok(serde_json::to_string(&message)?)
}

/// Receives metrics events from the agent.
pub trait MetricsFrontend: Send {
    /// Deliver one event.
    fn metrics(&mut self, event: MetricsEvent) -> InspectorResult<()>;
}

/// Frontend that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFrontend;

impl MetricsFrontend for NullFrontend {
    fn metrics(&mut self, _event: MetricsEvent) -> InspectorResult<()> {
        Ok(())
    }
}

/// Frontend forwarding events into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelFrontend {
    sender: mpsc::UnboundedSender<MetricsEvent>,
}

impl ChannelFrontend {
    /// Create a frontend and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MetricsEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MetricsFrontend for ChannelFrontend {
    fn metrics(&mut self, event: MetricsEvent) -> InspectorResult<()> {
        self.sender
            .send(event)
            .map_err(|_| InspectorError::FrontendClosed)
    }
}

/// Frontend writing one protocol message per line.
#[derive(Debug)]
pub struct JsonLinesFrontend<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesFrontend<W> {
    /// Write messages to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MetricsFrontend for JsonLinesFrontend<W> {
    fn metrics(&mut self, event: MetricsEvent) -> InspectorResult<()> {
        let line = event.to_message()?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}
