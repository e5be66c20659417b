//! Test helpers shared by the pipeline tests

use metrics::{
    Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

type Totals = Arc<Mutex<BTreeMap<String, u64>>>;

/// Recorder that sums counter increments per metric name and label set
#[derive(Clone, Default)]
pub struct CounterCapture {
    totals: Totals,
}

impl CounterCapture {
    /// Total for a counter; labelled series read as `name{key=value}`
    pub fn total(&self, key: &str) -> u64 {
        self.totals.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Drive `future` to completion on this thread with the recorder installed
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        metrics::with_local_recorder(self, || {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(future)
        })
    }
}

struct Series {
    key: String,
    totals: Totals,
}

impl CounterFn for Series {
    fn increment(&self, value: u64) {
        *self.totals.lock().unwrap().entry(self.key.clone()).or_default() += value;
    }

    fn absolute(&self, value: u64) {
        self.totals.lock().unwrap().insert(self.key.clone(), value);
    }
}

impl Recorder for CounterCapture {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let key = if labels.is_empty() {
            key.name().to_string()
        } else {
            format!("{}{{{}}}", key.name(), labels.join(","))
        };

        Counter::from_arc(Arc::new(Series {
            key,
            totals: self.totals.clone(),
        }))
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
