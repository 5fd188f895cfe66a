//! Shared test helpers.
//!
//! `TestHandler` is a configurable [`EventHandler`] used across the
//! scheduler and dispatcher tests: it counts invocations, can announce each
//! invocation on a channel, block on a semaphore gate, fail, panic, or
//! return a response override. `recorded_gauges` installs a process-wide
//! metrics recorder that captures gauge values for assertion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use metrics::{Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use tokio::sync::{Semaphore, mpsc};

use crate::dispatch::DispatchContext;
use crate::handler::{EventHandler, HandlerError, HookResponse};

/// Gauge values captured by the test recorder, keyed by metric name.
pub struct GaugeStore {
    values: Mutex<HashMap<String, f64>>,
}

impl GaugeStore {
    /// Current value of the named gauge; 0 if it was never touched.
    pub fn value(&self, name: &str) -> f64 {
        self.values.lock().unwrap().get(name).copied().unwrap_or(0.0)
    }
}

struct StoreGauge {
    name: String,
    store: &'static GaugeStore,
}

impl GaugeFn for StoreGauge {
    fn increment(&self, value: f64) {
        let mut values = self.store.values.lock().unwrap();
        *values.entry(self.name.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        let mut values = self.store.values.lock().unwrap();
        *values.entry(self.name.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.store.values.lock().unwrap().insert(self.name.clone(), value);
    }
}

struct TestRecorder;

impl Recorder for TestRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(StoreGauge {
            name: key.name().to_string(),
            store: recorded_gauges(),
        }))
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Installs the capturing recorder (once per test process) and returns the
/// store it writes gauge values into. Schedulers only emit gauges when
/// built with scheduling metrics enabled, so tests that do not opt in leave
/// the store untouched.
pub fn recorded_gauges() -> &'static GaugeStore {
    static STORE: OnceLock<GaugeStore> = OnceLock::new();
    let store = STORE.get_or_init(|| GaugeStore {
        values: Mutex::new(HashMap::new()),
    });

    static INSTALL: OnceLock<()> = OnceLock::new();
    INSTALL.get_or_init(|| {
        let _ = metrics::set_global_recorder(TestRecorder);
    });
    store
}

pub struct TestHandler {
    events: Vec<String>,
    calls: AtomicUsize,
    started: Option<mpsc::UnboundedSender<String>>,
    gate: Option<Arc<Semaphore>>,
    fail_message: Option<&'static str>,
    panic_message: Option<&'static str>,
    response: Option<HookResponse>,
}

impl TestHandler {
    pub fn new(events: &[&str]) -> Self {
        TestHandler {
            events: events.iter().map(|e| e.to_string()).collect(),
            calls: AtomicUsize::new(0),
            started: None,
            gate: None,
            fail_message: None,
            panic_message: None,
            response: None,
        }
    }

    /// Sends the delivery id on `tx` at the start of each invocation.
    pub fn notifying(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.started = Some(tx);
        self
    }

    /// Blocks each invocation until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Makes every invocation return an error with this message.
    pub fn failing(mut self, message: &'static str) -> Self {
        self.fail_message = Some(message);
        self
    }

    /// Makes every invocation panic with this message.
    pub fn panicking(mut self, message: &'static str) -> Self {
        self.panic_message = Some(message);
        self
    }

    /// Makes every invocation return this response override.
    pub fn responding(mut self, response: HookResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// Number of times `handle` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventHandler for TestHandler {
    fn handles(&self) -> Vec<String> {
        self.events.clone()
    }

    async fn handle(
        &self,
        _ctx: &DispatchContext,
        _event_type: &str,
        delivery_id: &str,
        _payload: &[u8],
    ) -> Result<Option<HookResponse>, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = &self.started {
            let _ = tx.send(delivery_id.to_string());
        }

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate semaphore closed").forget();
        }

        if let Some(message) = self.panic_message {
            panic!("{message}");
        }

        if let Some(message) = self.fail_message {
            return Err(message.into());
        }

        Ok(self.response.clone())
    }
}
