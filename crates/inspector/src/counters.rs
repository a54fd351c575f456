//! Live-object instance counters.

use perf::{InstanceCounterSource, Metric};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! counter_types {
    ($($name:ident),* $(,)?) => {
        /// Kind of live object counted by [`InstanceCounters`], in report order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CounterType {
            $(
                #[allow(missing_docs)]
                $name,
            )*
        }

        /// Number of counter types.
        const COUNTER_TYPES: usize = [$(stringify!($name)),*].len();

        impl CounterType {
            /// All counter types in declared order.
            pub const ALL: [CounterType; COUNTER_TYPES] = [$(CounterType::$name),*];

            /// Name under which the counter is reported.
            pub fn metric_name(self) -> &'static str {
                match self {
                    $(CounterType::$name => concat!(stringify!($name), "Count"),)*
                }
            }
        }
    };
}

counter_types!(
    AudioHandler,
    Document,
    Frame,
    JSEventListener,
    LayoutObject,
    MediaKeySession,
    MediaKeys,
    Node,
    Resource,
    ScriptPromise,
    SuspendableObject,
    V8PerContextData,
    WorkerGlobalScope,
);

/// Process-wide counts of live objects, updated from constructors and
/// destructors of the counted types.
#[derive(Debug, Default)]
pub struct InstanceCounters {
    values: [AtomicU64; COUNTER_TYPES],
}

impl InstanceCounters {
    /// Create counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, counter: CounterType) -> &AtomicU64 {
        &self.values[counter as usize]
    }

    /// An object of the given type was created.
    pub fn increment(&self, counter: CounterType) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    /// An object of the given type was destroyed. Never goes below zero.
    pub fn decrement(&self, counter: CounterType) {
        let _ = self
            .slot(counter)
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Current count for a type.
    pub fn value(&self, counter: CounterType) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }
}

impl InstanceCounterSource for InstanceCounters {
    fn counters(&self) -> Vec<Metric> {
        CounterType::ALL
            .iter()
            .map(|&counter| Metric::new(counter.metric_name(), self.value(counter) as f64))
            .collect()
    }
}
