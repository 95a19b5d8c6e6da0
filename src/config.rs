//! Runtime configuration for the dispatcher and its managers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Strategy for handling a slow or unreachable consumer when a publication
/// is ready to send.
///
/// The [`crate::publication::PublicationManager`] never buffers more than
/// one in-flight publication per entry (see spec invariants); this strategy
/// only governs what happens to that single slot when it is still occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum BackpressureStrategy {
    /// Block the scheduler tick until the previous send completes.
    #[default]
    Block,
    /// Drop the previous unsent publication and keep only the newest value.
    DropOldest,
    /// Surface an error instead of sending, leaving retry policy to the
    /// [`crate::transport::Router`] collaborator.
    Error,
}

/// Error returned by [`RpcConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// `dispatch_workers` must be greater than 0.
    InvalidDispatchWorkers,
    /// `default_channel_buffer` must be greater than 0.
    InvalidChannelBuffer,
    /// `reply_sweep_interval` must be greater than zero.
    InvalidReplySweepInterval,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDispatchWorkers => write!(f, "dispatch_workers must be greater than 0"),
            Self::InvalidChannelBuffer => {
                write!(f, "default_channel_buffer must be greater than 0")
            }
            Self::InvalidReplySweepInterval => {
                write!(f, "reply_sweep_interval must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Plugin-wide configuration.
///
/// # Example
/// ```
/// use rpcbus::config::{RpcConfig, BackpressureStrategy};
///
/// let config = RpcConfig::new()
///     .with_dispatch_workers(8)
///     .with_backpressure_strategy(BackpressureStrategy::DropOldest);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Number of workers draining the Dispatcher's inbound queue.
    pub dispatch_workers: usize,
    /// Default bounded-channel capacity between a publication source and
    /// the transport send path.
    pub default_channel_buffer: usize,
    /// Strategy applied when a publication can't be sent immediately.
    pub backpressure_strategy: BackpressureStrategy,
    /// How often the `ReplyCallerDirectory` sweeper scans for expired
    /// entries; clamped to the smallest outstanding TTL at runtime.
    pub reply_sweep_interval: Duration,
    /// Path to the subscription-request persistence file. `None` disables
    /// persistence (subscriptions do not survive a restart).
    pub subscription_store_path: Option<PathBuf>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            dispatch_workers: 4,
            default_channel_buffer: 32,
            backpressure_strategy: BackpressureStrategy::default(),
            reply_sweep_interval: Duration::from_millis(100),
            subscription_store_path: None,
        }
    }
}

impl RpcConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch worker pool size.
    pub fn with_dispatch_workers(mut self, workers: usize) -> Self {
        self.dispatch_workers = workers;
        self
    }

    /// Set the default channel buffer size.
    pub fn with_channel_buffer(mut self, buffer: usize) -> Self {
        self.default_channel_buffer = buffer;
        self
    }

    /// Set the backpressure strategy.
    pub fn with_backpressure_strategy(mut self, strategy: BackpressureStrategy) -> Self {
        self.backpressure_strategy = strategy;
        self
    }

    /// Set the reply sweep interval.
    pub fn with_reply_sweep_interval(mut self, interval: Duration) -> Self {
        self.reply_sweep_interval = interval;
        self
    }

    /// Enable persistence at the given path.
    pub fn with_subscription_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.subscription_store_path = Some(path.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.dispatch_workers == 0 {
            return Err(ConfigValidationError::InvalidDispatchWorkers);
        }
        if self.default_channel_buffer == 0 {
            return Err(ConfigValidationError::InvalidChannelBuffer);
        }
        if self.reply_sweep_interval.is_zero() {
            return Err(ConfigValidationError::InvalidReplySweepInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RpcConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = RpcConfig::new().with_dispatch_workers(0);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidDispatchWorkers)
        );
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let config = RpcConfig::new().with_channel_buffer(0);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidChannelBuffer)
        );
    }
}
