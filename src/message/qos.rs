//! Quality-of-service parameters for requests and subscriptions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error returned by the `SubscriptionQos` validated constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum QosValidationError {
    /// `min_interval_ms` was greater than `max_interval_ms`.
    #[error("min_interval_ms ({min}) must not exceed max_interval_ms ({max})")]
    MinExceedsMax {
        /// Requested minimum interval, in milliseconds.
        min: u64,
        /// Requested maximum interval, in milliseconds.
        max: u64,
    },
}

/// Round-trip timing parameters for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingQos {
    /// How long the caller waits for a reply before it times out.
    pub ttl: Duration,
}

impl MessagingQos {
    /// Build a `MessagingQos` with the given time-to-live.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for MessagingQos {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
        }
    }
}

/// Scheduling policy for an attribute or event subscription.
///
/// Mirrors the three QoS shapes the original system defines for an
/// attribute subscription: fixed-period, change-driven, and change-driven
/// with a keep-alive upper bound. `alert_after: None` (the wire form's
/// `alertAfterIntervalMs == 0`) disables missed-publication alerting;
/// `expires_at: None` (`validityMs == 0`) means the subscription never
/// expires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionQos {
    /// Publish unconditionally every `period`.
    Periodic {
        /// Interval between publications.
        period: Duration,
        /// How long the subscription remains active.
        expires_at: Option<Duration>,
        /// Time without any *sent* publication after which the subscriber
        /// should raise a missed-publication alert.
        alert_after: Option<Duration>,
    },
    /// Publish only when the attribute value changes, no sooner than
    /// `min_interval` apart.
    OnChange {
        /// Minimum spacing between two publications.
        min_interval: Duration,
        /// How long the subscription remains active.
        expires_at: Option<Duration>,
    },
    /// Publish on change (subject to `min_interval`), but also publish the
    /// current value every `max_interval` if nothing changed, and raise an
    /// alert if `alert_after` elapses with no publication at all.
    OnChangeWithKeepAlive {
        /// Minimum spacing between two change-driven publications.
        min_interval: Duration,
        /// Maximum spacing before a keep-alive publication is forced.
        max_interval: Duration,
        /// How long the subscription remains active.
        expires_at: Option<Duration>,
        /// Time without any publication after which the subscriber should
        /// raise a missed-publication alert.
        alert_after: Option<Duration>,
    },
}

impl SubscriptionQos {
    /// Build a periodic QoS.
    pub fn periodic(period: Duration, expires_at: Option<Duration>, alert_after: Option<Duration>) -> Result<Self, QosValidationError> {
        Ok(Self::Periodic {
            period,
            expires_at,
            alert_after,
        })
    }

    /// Build an on-change QoS.
    pub fn on_change(min_interval: Duration, expires_at: Option<Duration>) -> Self {
        Self::OnChange {
            min_interval,
            expires_at,
        }
    }

    /// Build an on-change-with-keep-alive QoS, validating `min_interval <=
    /// max_interval`.
    pub fn on_change_with_keep_alive(
        min_interval: Duration,
        max_interval: Duration,
        expires_at: Option<Duration>,
        alert_after: Option<Duration>,
    ) -> Result<Self, QosValidationError> {
        if min_interval > max_interval {
            return Err(QosValidationError::MinExceedsMax {
                min: min_interval.as_millis() as u64,
                max: max_interval.as_millis() as u64,
            });
        }
        Ok(Self::OnChangeWithKeepAlive {
            min_interval,
            max_interval,
            expires_at,
            alert_after,
        })
    }

    /// The alert interval configured for this QoS, if any.
    pub fn alert_after(&self) -> Option<Duration> {
        match self {
            Self::Periodic { alert_after, .. } => *alert_after,
            Self::OnChange { .. } => None,
            Self::OnChangeWithKeepAlive { alert_after, .. } => *alert_after,
        }
    }

    /// The subscription's expiry, if any.
    pub fn expires_at(&self) -> Option<Duration> {
        match self {
            Self::Periodic { expires_at, .. } => *expires_at,
            Self::OnChange { expires_at, .. } => *expires_at,
            Self::OnChangeWithKeepAlive { expires_at, .. } => *expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alive_rejects_min_above_max() {
        let result = SubscriptionQos::on_change_with_keep_alive(
            Duration::from_millis(200),
            Duration::from_millis(100),
            None,
            None,
        );
        assert!(matches!(result, Err(QosValidationError::MinExceedsMax { .. })));
    }

    #[test]
    fn keep_alive_accepts_well_formed_bounds() {
        let qos = SubscriptionQos::on_change_with_keep_alive(
            Duration::from_millis(100),
            Duration::from_millis(200),
            None,
            Some(Duration::from_millis(80)),
        )
        .unwrap();
        assert_eq!(qos.alert_after(), Some(Duration::from_millis(80)));
    }

    #[test]
    fn periodic_accepts_any_alert_interval() {
        let qos = SubscriptionQos::periodic(Duration::from_secs(10), None, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(qos.alert_after(), Some(Duration::from_secs(5)));
    }
}
