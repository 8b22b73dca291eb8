//! Configuration schema.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::order::{FallbackPolicy, OrderingEngine};

/// Root configuration, read from `.testchain.yml`.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub barrier: BarrierConfig,
    pub ordering: OrderingConfig,
    pub steps: StepsConfig,
}

/// Group barrier timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Interval between registry checks while waiting, in milliseconds.
    pub poll_interval_ms: u64,
    /// Default wait timeout, in seconds.
    pub wait_timeout_secs: u64,
}

impl BarrierConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            wait_timeout_secs: 360,
        }
    }
}

/// Fallback policies for items without a declared priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    pub steps: FallbackPolicy,
    pub groups: FallbackPolicy,
}

impl OrderingConfig {
    /// Engine for steps within a chain.
    pub fn step_engine(&self) -> OrderingEngine {
        OrderingEngine::new(self.steps)
    }

    /// Engine for groups.
    pub fn group_engine(&self) -> OrderingEngine {
        OrderingEngine::new(self.groups)
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            steps: FallbackPolicy::Front,
            groups: FallbackPolicy::End,
        }
    }
}

/// Step execution defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsConfig {
    /// Default deadline for async steps, in milliseconds. Unset or 0 means none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl StepsConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
