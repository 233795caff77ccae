//! Definition interpreter
//!
//! Turns a [`TestDefinition`] into a runnable, decorated [`TestUnit`]:
//! resolve the type tag, build the fixture, attach the registered strategy,
//! then wrap with retry (when enabled) and timing (always, outermost).

mod fixtures;

pub use fixtures::{CommunicationFixture, Measurand, ToleranceFixture, CURRENT, VOLTAGE};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::RetrySettings;
use crate::decorators::{DecoratorChain, Retry, Timing};
use crate::lifecycle::{Fixture, Strategy, TestCase, TestUnit};
use crate::models::{ParamError, TestDefinition};
use crate::strategies::{SimulatedCommunication, SimulatedSupply};

/// Per-definition interpretation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error("Unsupported test type '{kind}' in {id}")]
    UnsupportedType { id: String, kind: String },

    #[error("Invalid parameter in {id}: {source}")]
    InvalidParameter {
        id: String,
        #[source]
        source: ParamError,
    },
}

impl InterpretError {
    pub fn test_id(&self) -> &str {
        match self {
            InterpretError::UnsupportedType { id, .. } | InterpretError::InvalidParameter { id, .. } => id,
        }
    }
}

/// Test kinds with a built-in fixture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Voltage,
    Current,
    Communication,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::Voltage => "voltage",
            TestKind::Current => "current",
            TestKind::Communication => "communication",
        }
    }

    pub fn all() -> [TestKind; 3] {
        [TestKind::Voltage, TestKind::Current, TestKind::Communication]
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "voltage" => Ok(TestKind::Voltage),
            "current" => Ok(TestKind::Current),
            "communication" | "cancomm" | "can" => Ok(TestKind::Communication),
            other => Err(format!("unknown test type: {other}")),
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps definitions to decorated units
#[derive(Clone)]
pub struct Interpreter {
    strategies: HashMap<TestKind, Arc<dyn Strategy>>,
    retry: RetrySettings,
}

impl Interpreter {
    /// Interpreter with no strategies registered
    pub fn new(retry: RetrySettings) -> Self {
        Self {
            strategies: HashMap::new(),
            retry,
        }
    }

    /// Interpreter backed by the simulated bench
    pub fn simulated(retry: RetrySettings) -> Self {
        Self::new(retry)
            .register(TestKind::Voltage, SimulatedSupply::voltage())
            .register(TestKind::Current, SimulatedSupply::current())
            .register(TestKind::Communication, SimulatedCommunication::default())
    }

    pub fn register(self, kind: TestKind, strategy: impl Strategy + 'static) -> Self {
        self.register_shared(kind, Arc::new(strategy))
    }

    pub fn register_shared(mut self, kind: TestKind, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    /// Kind for a tag, if a strategy is registered for it
    pub fn resolve(&self, tag: &str) -> Option<TestKind> {
        tag.parse::<TestKind>()
            .ok()
            .filter(|kind| self.strategies.contains_key(kind))
    }

    pub fn interpret(&self, def: &TestDefinition) -> Result<Box<dyn TestUnit>, InterpretError> {
        debug!("Interpreting {}", def);

        let unsupported = || InterpretError::UnsupportedType {
            id: def.id.clone(),
            kind: def.kind.clone(),
        };
        let kind = self.resolve(&def.kind).ok_or_else(unsupported)?;
        let strategy = self.strategies.get(&kind).cloned().ok_or_else(unsupported)?;

        let invalid = |source| InterpretError::InvalidParameter {
            id: def.id.clone(),
            source,
        };
        let fixture: Box<dyn Fixture> = match kind {
            TestKind::Voltage => {
                Box::new(ToleranceFixture::new(VOLTAGE, &def.parameters).map_err(invalid)?)
            }
            TestKind::Current => {
                Box::new(ToleranceFixture::new(CURRENT, &def.parameters).map_err(invalid)?)
            }
            TestKind::Communication => Box::new(
                CommunicationFixture::new(def.expected_results.as_ref()).map_err(invalid)?,
            ),
        };

        let unit = TestCase::new(
            def.id.clone(),
            def.name.clone(),
            def.parameters.clone(),
            fixture,
            strategy,
        );

        Ok(self.decorators(def)?.apply(Box::new(unit)))
    }

    fn decorators(&self, def: &TestDefinition) -> Result<DecoratorChain, InterpretError> {
        let mut chain = DecoratorChain::new();

        if def.enable_retry {
            let invalid = |source| InterpretError::InvalidParameter {
                id: def.id.clone(),
                source,
            };
            let max_retries = def
                .parameters
                .count_or::<u32>("maxRetries", self.retry.default_max_retries)
                .map_err(invalid)?;
            let delay_ms = def
                .parameters
                .count_or::<u64>("retryDelayMs", self.retry.delay_ms)
                .map_err(invalid)?;

            chain = chain.layer(Retry::new(max_retries, delay_ms).with_policy(self.retry.policy));
        }

        Ok(chain.layer(Timing))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::simulated(RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Parameters, TestStatus};
    use crate::testing::ScriptedStrategy;

    fn no_delay() -> RetrySettings {
        RetrySettings {
            delay_ms: 0,
            ..Default::default()
        }
    }

    fn voltage_def(measured: f64) -> (TestDefinition, ScriptedStrategy) {
        let def = TestDefinition::new("V001", "Nominal voltage output", "voltage").with_parameters(
            Parameters::new()
                .with("targetVoltage", 12.0)
                .with("tolerance", 0.2),
        );
        (def, ScriptedStrategy::ok().writes("measuredVoltage", measured))
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Voltage".parse::<TestKind>(), Ok(TestKind::Voltage));
        assert_eq!("CANComm".parse::<TestKind>(), Ok(TestKind::Communication));
        assert!("pressure".parse::<TestKind>().is_err());
    }

    #[tokio::test]
    async fn test_voltage_scenario_pass() {
        let (def, strategy) = voltage_def(12.1);
        let interpreter = Interpreter::new(no_delay()).register(TestKind::Voltage, strategy);

        let mut unit = interpreter.interpret(&def).unwrap();
        assert_eq!(unit.id(), "V001");
        let result = unit.run().await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_voltage_scenario_fail() {
        let (def, strategy) = voltage_def(12.5);
        let interpreter = Interpreter::new(no_delay()).register(TestKind::Voltage, strategy);

        let result = interpreter.interpret(&def).unwrap().run().await;
        assert!(!result.success);
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.error_message.unwrap().contains("out of range"));
    }

    #[test]
    fn test_unsupported_type() {
        let interpreter = Interpreter::default();
        let def = TestDefinition::new("P001", "Pressure", "pressure");

        let err = interpreter.interpret(&def).err().unwrap();
        assert_eq!(
            err,
            InterpretError::UnsupportedType {
                id: "P001".to_string(),
                kind: "pressure".to_string(),
            }
        );
        assert_eq!(err.test_id(), "P001");
    }

    #[test]
    fn test_unregistered_kind_is_unsupported() {
        let interpreter = Interpreter::new(no_delay());
        let def = TestDefinition::new("V001", "voltage", "voltage");
        assert!(matches!(
            interpreter.interpret(&def),
            Err(InterpretError::UnsupportedType { .. })
        ));
        assert!(interpreter.resolve("voltage").is_none());
    }

    #[test]
    fn test_invalid_parameter() {
        let interpreter = Interpreter::default();
        let def = TestDefinition::new("C001", "current", "current")
            .with_retry()
            .with_parameters(Parameters::new().with("maxRetries", "many"));

        assert!(matches!(
            interpreter.interpret(&def),
            Err(InterpretError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn test_retry_scenario() {
        // Communication check that only answers on the third attempt
        struct ThirdTimeLucky(std::sync::atomic::AtomicUsize);

        #[async_trait::async_trait]
        impl Strategy for ThirdTimeLucky {
            async fn run_test(&self, params: &mut Parameters) -> anyhow::Result<()> {
                let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                params.set("responseReceived", n >= 3);
                params.set("responseData", "53 4F 43");
                Ok(())
            }
        }

        let interpreter = Interpreter::new(no_delay()).register(
            TestKind::Communication,
            ThirdTimeLucky(std::sync::atomic::AtomicUsize::new(0)),
        );
        let def = TestDefinition::new("CAN001", "BMS status request", "cancomm")
            .with_retry()
            .with_parameters(Parameters::new().with("maxRetries", 2i64));

        let result = interpreter.interpret(&def).unwrap().run().await;
        assert!(result.success);
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_disabled_runs_once() {
        let strategy = ScriptedStrategy::ok().writes("measuredCurrent", 9.0);
        let runs = strategy.runs();
        let interpreter = Interpreter::new(no_delay()).register(TestKind::Current, strategy);
        let def = TestDefinition::new("C002", "current", "current")
            .with_parameters(Parameters::new().with("targetCurrent", 5.0));

        let result = interpreter.interpret(&def).unwrap().run().await;
        assert!(!result.success);
        assert_eq!(result.attempts, 1);
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_max_retries_from_settings() {
        let strategy = ScriptedStrategy::ok().writes("measuredCurrent", 9.0);
        let runs = strategy.runs();
        let settings = RetrySettings {
            default_max_retries: 1,
            delay_ms: 0,
            ..Default::default()
        };
        let interpreter = Interpreter::new(settings).register(TestKind::Current, strategy);
        let def = TestDefinition::new("C003", "current", "current")
            .with_retry()
            .with_parameters(Parameters::new().with("targetCurrent", 5.0));

        let result = interpreter.interpret(&def).unwrap().run().await;
        assert_eq!(result.attempts, 2);
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
