//! Cross-group barrier.
//!
//! A process-wide registry of named groups with an active flag. A group is
//! marked active while it executes and inactive once it finishes; other
//! groups poll the registry to wait for it.
//!
//! - [`GroupBarrier`] - The registry and its wait primitives
//! - [`GroupRegistration`] - Scoped registration released on drop
//! - [`GroupState`] - Per-group state as seen by waiters

mod registration;

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

pub use registration::GroupRegistration;

use crate::config::BarrierConfig;
use crate::error::GroupWaitTimeout;

/// Default interval between registry checks while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default wait timeout for [`GroupBarrier::wait_for_default`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(360);

static GLOBAL: LazyLock<GroupBarrier> = LazyLock::new(GroupBarrier::new);

/// State of a group in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Never registered.
    Unregistered,
    /// Registered and still executing.
    Active,
    /// Registered and finished.
    Inactive,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupState::Unregistered => write!(f, "unregistered"),
            GroupState::Active => write!(f, "active"),
            GroupState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Registry of group activity.
///
/// Entries are created on first registration and never removed, only flipped
/// to inactive. Waiting on a group that never registers times out.
///
/// Use [`GroupBarrier::global`] to coordinate groups across a process;
/// separate instances are independent.
#[derive(Debug)]
pub struct GroupBarrier {
    groups: RwLock<HashMap<String, bool>>,
    poll_interval: Duration,
    default_timeout: Duration,
}

impl GroupBarrier {
    /// Create a registry with default timings.
    pub fn new() -> Self {
        Self::with_timings(DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }

    /// Create a registry with explicit timings.
    pub fn with_timings(poll_interval: Duration, default_timeout: Duration) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            poll_interval,
            default_timeout,
        }
    }

    /// Create a registry from configuration.
    pub fn from_config(config: &BarrierConfig) -> Self {
        Self::with_timings(config.poll_interval(), config.wait_timeout())
    }

    /// The process-wide registry.
    ///
    /// Lives for the whole process and is never reset.
    pub fn global() -> &'static GroupBarrier {
        &GLOBAL
    }

    /// Interval between registry checks while waiting.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Timeout used by [`wait_for_default`](Self::wait_for_default).
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Mark `name` as executing.
    pub fn register(&self, name: &str) {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), true);
        info!("Group '{}' registered", name);
    }

    /// Mark `name` as finished.
    ///
    /// Unregistering a group that never registered still records it as
    /// finished, so its waiters are released.
    pub fn unregister(&self, name: &str) {
        let previous = self
            .groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), false);
        match previous {
            Some(true) => info!("Group '{}' completed", name),
            Some(false) => debug!("Group '{}' was already inactive", name),
            None => warn!("Group '{}' unregistered without registering", name),
        }
    }

    /// Register `name` until the returned guard is dropped.
    pub fn register_scoped(&self, name: impl Into<String>) -> GroupRegistration<'_> {
        GroupRegistration::new(self, name.into())
    }

    /// Current state of `name`.
    pub fn state(&self, name: &str) -> GroupState {
        match self
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            None => GroupState::Unregistered,
            Some(true) => GroupState::Active,
            Some(false) => GroupState::Inactive,
        }
    }

    /// Check if `name` registered and has finished.
    pub fn is_finished(&self, name: &str) -> bool {
        self.state(name) == GroupState::Inactive
    }

    /// Block the calling thread until `name` has finished or `timeout` elapses.
    ///
    /// The registry is re-checked every poll interval, so a wait may return
    /// up to one interval after the group finished.
    pub fn wait_for(&self, name: &str, timeout: Duration) -> Result<(), GroupWaitTimeout> {
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        debug!("Waiting up to {:?} for group '{}'", timeout, name);

        loop {
            if self.is_finished(name) {
                debug!("Group '{}' finished, continuing", name);
                return Ok(());
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.timed_out(name, timeout));
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            std::thread::sleep(pause);
        }
    }

    /// [`wait_for`](Self::wait_for) with the registry's default timeout.
    pub fn wait_for_default(&self, name: &str) -> Result<(), GroupWaitTimeout> {
        self.wait_for(name, self.default_timeout)
    }

    /// Like [`wait_for`](Self::wait_for), but yields to the async runtime
    /// between checks instead of blocking the thread.
    pub async fn wait_for_async(&self, name: &str, timeout: Duration) -> Result<(), GroupWaitTimeout> {
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        debug!("Waiting up to {:?} for group '{}'", timeout, name);

        loop {
            if self.is_finished(name) {
                debug!("Group '{}' finished, continuing", name);
                return Ok(());
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return Err(self.timed_out(name, timeout));
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    fn timed_out(&self, name: &str, timeout: Duration) -> GroupWaitTimeout {
        warn!(
            "Gave up waiting for group '{}' after {:?} (state: {})",
            name,
            timeout,
            self.state(name)
        );
        GroupWaitTimeout {
            group: name.to_string(),
            timeout,
        }
    }
}

impl Default for GroupBarrier {
    fn default() -> Self {
        Self::new()
    }
}
