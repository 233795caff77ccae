//! Test definition models
//!
//! Definitions are produced by a loader and consumed once by the interpreter.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::params::Parameters;

/// Declarative description of one test
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    /// Unique identifier within a suite (e.g. "V001")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Type tag resolved by the interpreter (voltage, current, communication)
    #[serde(rename = "type")]
    pub kind: String,

    /// Wrap the unit in a retry decorator
    #[serde(default)]
    pub enable_retry: bool,

    /// Inputs for the fixture and strategy
    #[serde(default)]
    pub parameters: Parameters,

    /// Expected observations checked during verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_results: Option<Parameters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            enable_retry: false,
            parameters: Parameters::new(),
            expected_results: None,
            description: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_retry(mut self) -> Self {
        self.enable_retry = true;
        self
    }

    pub fn with_expected(mut self, expected: Parameters) -> Self {
        self.expected_results = Some(expected);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.id, self.kind)
    }
}

/// A definition file: either a suite object or a bare list
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SuiteFile {
    Suite(TestSuite),
    List(Vec<TestDefinition>),
}

impl SuiteFile {
    pub fn into_suite(self) -> TestSuite {
        match self {
            SuiteFile::Suite(suite) => suite,
            SuiteFile::List(tests) => TestSuite {
                name: None,
                description: None,
                tests,
            },
        }
    }
}

/// Named collection of definitions
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub tests: Vec<TestDefinition>,
}

impl TestSuite {
    /// The battery management bench suite used by `hwtest sample`
    pub fn sample() -> Self {
        Self {
            name: Some("BMS functional test suite".to_string()),
            description: Some(
                "Voltage, current and communication checks for a battery management system"
                    .to_string(),
            ),
            tests: vec![
                TestDefinition::new("V001", "Nominal voltage output", "voltage")
                    .with_description("12V rail within 0.2V of target")
                    .with_retry()
                    .with_parameters(
                        Parameters::new()
                            .with("targetVoltage", 12.0)
                            .with("durationMs", 500i64)
                            .with("tolerance", 0.2)
                            .with("maxRetries", 2i64),
                    ),
                TestDefinition::new("V002", "Low voltage output", "voltage").with_parameters(
                    Parameters::new()
                        .with("targetVoltage", 3.3)
                        .with("durationMs", 300i64)
                        .with("tolerance", 0.1),
                ),
                TestDefinition::new("C001", "Nominal current output", "current")
                    .with_retry()
                    .with_parameters(
                        Parameters::new()
                            .with("targetCurrent", 5.0)
                            .with("durationMs", 500i64)
                            .with("tolerance", 0.1)
                            .with("maxRetries", 3i64),
                    ),
                TestDefinition::new("CAN001", "BMS status request", "cancomm")
                    .with_retry()
                    .with_parameters(
                        Parameters::new()
                            .with("canID", "0x18FF50E5")
                            .with("messageData", "03 22 F0 05 00 00 00 00")
                            .with("timeoutMs", 200i64)
                            .with("maxRetries", 2i64),
                    ),
                TestDefinition::new("CAN002", "Battery SOC request", "cancomm")
                    .with_description("Reply must read SOC:85")
                    .with_retry()
                    .with_parameters(
                        Parameters::new()
                            .with("canID", "0x18FF50E5")
                            .with("messageData", "03 22 F1 89 00 00 00 00")
                            .with("timeoutMs", 200i64)
                            .with("maxRetries", 2i64),
                    )
                    .with_expected(Parameters::new().with("responseData", "53 4F 43 3A 38 35")),
            ],
        }
    }
}
