use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use crate::interpreter::{Measurand, CURRENT, VOLTAGE};
use crate::lifecycle::Strategy;
use crate::models::Parameters;

/// Canned reply for status requests
const SIMULATED_RESPONSE: &str = "53 4F 43 3A 38 35";

/// Programmable supply that settles for `durationMs` and reads back
/// `target ± noise`
#[derive(Clone, Debug)]
pub struct SimulatedSupply {
    measurand: Measurand,
    noise: f64,
}

impl SimulatedSupply {
    pub fn voltage() -> Self {
        Self {
            measurand: VOLTAGE,
            noise: 0.1,
        }
    }

    pub fn current() -> Self {
        Self {
            measurand: CURRENT,
            noise: 0.05,
        }
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.abs();
        self
    }
}

#[async_trait]
impl Strategy for SimulatedSupply {
    async fn run_test(&self, params: &mut Parameters) -> anyhow::Result<()> {
        let target = params.f64(self.measurand.target_key)?;
        let duration_ms = params.count_or::<u64>("durationMs", 0)?;

        debug!(
            "Driving {} to {:.3}{} for {}ms",
            self.measurand.label, target, self.measurand.unit, duration_ms
        );
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        let offset = if self.noise > 0.0 {
            rand::rng().random_range(-self.noise..self.noise)
        } else {
            0.0
        };
        let measured = target + offset;
        params.set(self.measurand.measured_key, measured);

        debug!(
            "Measured {} {:.3}{}",
            self.measurand.label, measured, self.measurand.unit
        );
        Ok(())
    }
}

/// Bus transceiver that answers with a fixed probability
#[derive(Clone, Debug)]
pub struct SimulatedCommunication {
    success_rate: f64,
}

impl SimulatedCommunication {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedCommunication {
    fn default() -> Self {
        Self::new(0.9)
    }
}

#[async_trait]
impl Strategy for SimulatedCommunication {
    async fn run_test(&self, params: &mut Parameters) -> anyhow::Result<()> {
        let timeout_ms = params.count_or::<u64>("timeoutMs", 200)?;
        let (wait_ms, received) = {
            let mut rng = rand::rng();
            let wait_ms = rng.random_range(0..=timeout_ms.max(1)).min(timeout_ms);
            (wait_ms, rng.random_bool(self.success_rate))
        };

        if let Ok(can_id) = params.str("canID") {
            debug!("Sending frame to {}", can_id);
        }
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;

        params.set("responseReceived", received);
        if received {
            params.set("responseData", SIMULATED_RESPONSE);
            debug!("Response received: {}", SIMULATED_RESPONSE);
        } else {
            params.remove("responseData");
            debug!("No response within {}ms", timeout_ms);
        }
        Ok(())
    }
}
