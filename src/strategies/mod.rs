//! Simulated bench strategies
//!
//! Real measurement code is supplied by the embedding system through the
//! [`Strategy`](crate::lifecycle::Strategy) trait. These stand-ins generate
//! plausible readings so suites can be exercised without hardware.

mod simulated;

pub use simulated::{SimulatedCommunication, SimulatedSupply};
