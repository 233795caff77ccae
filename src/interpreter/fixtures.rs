//! Built-in fixtures for the supported test kinds
//!
//! Fixtures only arm, judge and release. The measurement itself comes from
//! the [`Strategy`](crate::lifecycle::Strategy) registered for the kind.

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::lifecycle::{Fixture, Verification};
use crate::models::{ParamError, Parameters};

/// Slack for float comparisons at the tolerance boundary
const EPSILON: f64 = 1e-9;

/// Physical quantity checked against a target with a tolerance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurand {
    pub label: &'static str,
    pub target_key: &'static str,
    pub measured_key: &'static str,
    pub unit: &'static str,
    pub default_tolerance: f64,
}

pub const VOLTAGE: Measurand = Measurand {
    label: "voltage",
    target_key: "targetVoltage",
    measured_key: "measuredVoltage",
    unit: "V",
    default_tolerance: 0.1,
};

pub const CURRENT: Measurand = Measurand {
    label: "current",
    target_key: "targetCurrent",
    measured_key: "measuredCurrent",
    unit: "A",
    default_tolerance: 0.05,
};

/// Passes when the measured value lands within `target ± tolerance`
#[derive(Clone, Debug)]
pub struct ToleranceFixture {
    measurand: Measurand,
    tolerance: f64,
}

impl ToleranceFixture {
    pub fn new(measurand: Measurand, params: &Parameters) -> Result<Self, ParamError> {
        let tolerance = params.f64_or("tolerance", measurand.default_tolerance)?;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ParamError::Invalid {
                key: "tolerance".to_string(),
                reason: format!("{tolerance} is not a non-negative number"),
            });
        }
        Ok(Self {
            measurand,
            tolerance,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[async_trait]
impl Fixture for ToleranceFixture {
    async fn initialize(&self, params: &Parameters) -> anyhow::Result<()> {
        let target = params
            .f64(self.measurand.target_key)
            .with_context(|| format!("cannot arm {} test", self.measurand.label))?;
        debug!(
            "Arming {} test: target {:.3}{} ± {:.3}{}",
            self.measurand.label, target, self.measurand.unit, self.tolerance, self.measurand.unit
        );
        Ok(())
    }

    fn verify(&self, params: &Parameters) -> Verification {
        let m = &self.measurand;
        let target = match params.f64(m.target_key) {
            Ok(v) => v,
            Err(e) => return Verification::fail(e.to_string()),
        };
        let measured = match params.f64(m.measured_key) {
            Ok(v) => v,
            Err(ParamError::Missing { .. }) => {
                return Verification::fail(format!("no {} measurement recorded", m.label))
            }
            Err(e) => return Verification::fail(e.to_string()),
        };

        let low = target - self.tolerance;
        let high = target + self.tolerance;
        let window = format!("{low:.3}{unit}..{high:.3}{unit}", unit = m.unit);

        if (measured - target).abs() <= self.tolerance + EPSILON {
            Verification::pass(format!(
                "measured {measured:.3}{} within {window}",
                m.unit
            ))
        } else {
            Verification::fail(format!(
                "{} out of range: measured {measured:.3}{}, accepted {window}",
                m.label, m.unit
            ))
        }
    }

    async fn cleanup(&self, _params: &Parameters) -> anyhow::Result<()> {
        debug!("Releasing {} output", self.measurand.label);
        Ok(())
    }
}

/// Passes when the device answered, and answered what was expected
#[derive(Clone, Debug, Default)]
pub struct CommunicationFixture {
    expected_response: Option<String>,
}

impl CommunicationFixture {
    pub fn new(expected: Option<&Parameters>) -> Result<Self, ParamError> {
        let expected_response = match expected {
            Some(expected) if expected.contains("responseData") => {
                Some(expected.str("responseData")?.to_string())
            }
            _ => None,
        };
        Ok(Self { expected_response })
    }
}

#[async_trait]
impl Fixture for CommunicationFixture {
    async fn initialize(&self, params: &Parameters) -> anyhow::Result<()> {
        let timeout_ms = params
            .i64_or("timeoutMs", 0)
            .context("cannot open communication channel")?;
        if timeout_ms < 0 {
            anyhow::bail!("timeoutMs must not be negative, got {timeout_ms}");
        }
        debug!("Opening communication channel (timeout {}ms)", timeout_ms);
        Ok(())
    }

    fn verify(&self, params: &Parameters) -> Verification {
        match params.bool("responseReceived") {
            Ok(true) => {}
            Ok(false) => return Verification::fail("no response received (communication timeout)"),
            Err(ParamError::Missing { .. }) => {
                return Verification::fail("no response recorded")
            }
            Err(e) => return Verification::fail(e.to_string()),
        }

        let response = match params.str("responseData") {
            Ok(data) if !data.trim().is_empty() => data,
            Ok(_) | Err(ParamError::Missing { .. }) => {
                return Verification::fail("response received but empty")
            }
            Err(e) => return Verification::fail(e.to_string()),
        };

        match &self.expected_response {
            Some(expected) if !expected.eq_ignore_ascii_case(response) => Verification::fail(
                format!("unexpected response: got '{response}', expected '{expected}'"),
            ),
            _ => Verification::pass(format!("response: {response}")),
        }
    }

    async fn cleanup(&self, _params: &Parameters) -> anyhow::Result<()> {
        debug!("Closing communication channel");
        Ok(())
    }
}
