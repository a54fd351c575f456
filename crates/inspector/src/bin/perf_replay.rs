//! Replays a recorded instrumentation trace through a performance agent.
//!
//! Usage: `perf_replay [TRACE] [CONFIG]`
//!
//! Reads the trace from `TRACE` (or stdin when absent or `-`), optionally an
//! agent config from `CONFIG`, and prints one JSON line per output in trace
//! order. Time stamps are `Performance.metrics` events; `getMetrics` results
//! are `{"id", "result"}` responses numbered from 1.

use anyhow::Context;
use inspector::{
    metrics_response, parse_trace, replay, AgentConfig, InstrumentationBus, JsonLinesFrontend,
    MetricsAgent,
};
use std::io::Read;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let trace_arg = args.next();
    let config = match args.next() {
        Some(path) => AgentConfig::load(Path::new(&path))
            .with_context(|| format!("failed to load config from {}", path))?,
        None => AgentConfig::default(),
    };

    let input = match trace_arg.as_deref() {
        None | Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read trace from stdin")?;
            buffer
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trace from {}", path))?,
    };

    let events = parse_trace(&input)?;
    tracing::info!(events = events.len(), "replaying trace");

    let state = config.open_state()?;
    // Both outputs share the process-wide stdout buffer, so lines keep trace order.
    let mut agent = MetricsAgent::new(config, InstrumentationBus::new(), state)
        .with_frontend(Box::new(JsonLinesFrontend::new(std::io::stdout())));
    agent.restore();

    let mut next_id = 1;
    let mut failure = None;
    replay(&mut agent, &events, |metrics| {
        if failure.is_some() {
            return;
        }
        match metrics_response(next_id, &metrics) {
            Ok(line) => println!("{}", line),
            Err(e) => failure = Some(e),
        }
        next_id += 1;
    });

    if let Some(e) = failure {
        return Err(e).context("failed to write metrics response");
    }
    Ok(())
}
