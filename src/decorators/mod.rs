//! Cross-cutting wrappers around test units
//!
//! A decorator takes a boxed [`TestUnit`] and returns another one with the
//! same identity. Layers compose through [`DecoratorChain`], which applies
//! them innermost first, so the last layer added runs outermost.

mod retry;
mod timing;

pub use retry::{RetryDecorator, RetryPolicy};
pub use timing::TimingDecorator;

use crate::lifecycle::TestUnit;

/// A layer that wraps a unit
pub trait Decorator: Send + Sync {
    fn wrap(&self, unit: Box<dyn TestUnit>) -> Box<dyn TestUnit>;
}

/// Layer that applies [`TimingDecorator`]
#[derive(Clone, Copy, Debug, Default)]
pub struct Timing;

impl Decorator for Timing {
    fn wrap(&self, unit: Box<dyn TestUnit>) -> Box<dyn TestUnit> {
        Box::new(TimingDecorator::new(unit))
    }
}

/// Layer that applies [`RetryDecorator`]
#[derive(Clone, Copy, Debug)]
pub struct Retry {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub policy: RetryPolicy,
}

impl Retry {
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay_ms,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Decorator for Retry {
    fn wrap(&self, unit: Box<dyn TestUnit>) -> Box<dyn TestUnit> {
        Box::new(
            RetryDecorator::new(unit, self.max_retries, self.delay_ms).with_policy(self.policy),
        )
    }
}

/// Ordered list of layers
#[derive(Default)]
pub struct DecoratorChain {
    layers: Vec<Box<dyn Decorator>>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer outside every layer added so far
    pub fn layer(mut self, decorator: impl Decorator + 'static) -> Self {
        self.layers.push(Box::new(decorator));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn apply(&self, unit: Box<dyn TestUnit>) -> Box<dyn TestUnit> {
        self.layers
            .iter()
            .fold(unit, |inner, decorator| decorator.wrap(inner))
    }
}
