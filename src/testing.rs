//! Scripted fixtures, strategies and units shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::lifecycle::{Fixture, Strategy, TestUnit, Verification};
use crate::models::{ParamValue, Parameters, Step, TestResult, TestStatus};

#[derive(Clone, Copy, Debug)]
pub enum Hook {
    Ok,
    Fail(&'static str),
    Panic,
}

impl Hook {
    fn fire(self) -> anyhow::Result<()> {
        match self {
            Hook::Ok => Ok(()),
            Hook::Fail(msg) => Err(anyhow::anyhow!(msg)),
            Hook::Panic => panic!("scripted panic"),
        }
    }
}

/// Ordered record of hook invocations
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    pub fn record(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

pub struct ScriptedFixture {
    initialize: Hook,
    verdict: Verification,
    cleanup: Hook,
    calls: CallLog,
}

impl ScriptedFixture {
    pub fn passing() -> Self {
        Self {
            initialize: Hook::Ok,
            verdict: Verification::pass("within limits"),
            cleanup: Hook::Ok,
            calls: CallLog::default(),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            verdict: Verification::fail(detail),
            ..Self::passing()
        }
    }

    pub fn initialize(mut self, hook: Hook) -> Self {
        self.initialize = hook;
        self
    }

    pub fn cleanup(mut self, hook: Hook) -> Self {
        self.cleanup = hook;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

#[async_trait]
impl Fixture for ScriptedFixture {
    async fn initialize(&self, _params: &Parameters) -> anyhow::Result<()> {
        self.calls.record("initialize");
        self.initialize.fire()
    }

    fn verify(&self, _params: &Parameters) -> Verification {
        self.calls.record("verify");
        self.verdict.clone()
    }

    async fn cleanup(&self, _params: &Parameters) -> anyhow::Result<()> {
        self.calls.record("cleanup");
        self.cleanup.fire()
    }
}

pub struct ScriptedStrategy {
    outcome: Hook,
    writes: Vec<(String, ParamValue)>,
    runs: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    pub fn ok() -> Self {
        Self {
            outcome: Hook::Ok,
            writes: Vec::new(),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(msg: &'static str) -> Self {
        Self {
            outcome: Hook::Fail(msg),
            ..Self::ok()
        }
    }

    pub fn panicking() -> Self {
        Self {
            outcome: Hook::Panic,
            ..Self::ok()
        }
    }

    pub fn writes(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.writes.push((key.to_string(), value.into()));
        self
    }

    pub fn runs(&self) -> Arc<AtomicUsize> {
        self.runs.clone()
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    async fn run_test(&self, params: &mut Parameters) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        for (key, value) in &self.writes {
            params.set(key.clone(), value.clone());
        }
        self.outcome.fire()
    }
}

/// Unit that fails a fixed number of times before passing
pub struct FlakyUnit {
    id: String,
    failures: usize,
    failure_status: TestStatus,
    attempts: Arc<AtomicUsize>,
}

impl FlakyUnit {
    pub fn new(id: &str, failures: usize) -> Self {
        Self {
            id: id.to_string(),
            failures,
            failure_status: TestStatus::Fail,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn always_failing(id: &str) -> Self {
        Self::new(id, usize::MAX)
    }

    pub fn erroring(mut self) -> Self {
        self.failure_status = TestStatus::Error;
        self
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        self.attempts.clone()
    }
}

#[async_trait]
impl TestUnit for FlakyUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "flaky"
    }

    async fn run(&mut self) -> TestResult {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mut result = TestResult::begin(&self.id, "flaky");
        result.push_step(Step::new("initialize", true, "ok"));
        if attempt > self.failures {
            result.push_step(Step::new("verify", true, format!("attempt {attempt}")));
            result.set_status(TestStatus::Pass);
        } else {
            result.push_step(Step::new("verify", false, format!("attempt {attempt}")));
            result.error_message = Some(format!("attempt {attempt} failed"));
            result.set_status(self.failure_status);
        }
        result.push_step(Step::new("cleanup", true, "ok"));
        result.finish()
    }
}

/// Shared gauges for observing concurrent units
#[derive(Clone, Default)]
pub struct Gauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    order: Arc<Mutex<Vec<String>>>,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

/// Unit that holds a concurrency slot for a while
pub struct GaugedUnit {
    id: String,
    hold: Duration,
    status: TestStatus,
    gauge: Gauge,
}

impl GaugedUnit {
    pub fn new(id: impl Into<String>, hold_ms: u64, gauge: &Gauge) -> Self {
        Self {
            id: id.into(),
            hold: Duration::from_millis(hold_ms),
            status: TestStatus::Pass,
            gauge: gauge.clone(),
        }
    }

    pub fn with_status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }
}

#[async_trait]
impl TestUnit for GaugedUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "gauged"
    }

    async fn run(&mut self) -> TestResult {
        let mut result = TestResult::begin(&self.id, "gauged");
        self.gauge.order.lock().unwrap().push(self.id.clone());
        let now = self.gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;

        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
        result.push_step(Step::new("initialize", true, "ok"));
        result.push_step(Step::new("cleanup", true, "ok"));
        result.set_status(self.status);
        result.finish()
    }
}
