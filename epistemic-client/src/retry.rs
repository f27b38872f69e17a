//! Retry policy for the request layer.
//!
//! Retries are off by default. When enabled, idempotent calls are retried
//! automatically; writes are retried only when the caller opts in per call
//! (see [`CallOptions::retry_writes`](crate::request::CallOptions)).

use retry::delay::{Exponential, Fixed};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, time::Duration};

use crate::error::ClientError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Wait `base_delay_ms` before every retry
    #[default]
    Fixed,
    /// Double the delay on each retry, capped at `max_delay_ms`
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt
    #[serde(default)]
    pub retries: u32,

    /// Delay schedule
    #[serde(default)]
    pub backoff: Backoff,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for exponential backoff, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// HTTP statuses that are worth another attempt
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: BTreeSet<u16>,
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_retryable_statuses() -> BTreeSet<u16> {
    [429, 502, 503, 504].into_iter().collect()
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            backoff: Backoff::default(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// A fixed-delay policy with `retries` retries.
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Fixed,
            base_delay_ms: delay.as_millis() as u64,
            ..Self::default()
        }
    }

    /// An exponential policy starting at `base` and capped at `max`.
    pub fn exponential(retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Exponential,
            base_delay_ms: base.as_millis() as u64,
            max_delay_ms: max.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Total attempts allowed for a call.
    ///
    /// Calls that are not retry-eligible always get exactly one attempt.
    pub fn max_attempts(&self, eligible: bool) -> u32 {
        if eligible {
            self.retries.saturating_add(1)
        } else {
            1
        }
    }

    /// Delays to wait before each retry, in order.
    ///
    /// Yields exactly `retries` items, each capped at `max_delay_ms`.
    pub fn delays(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let max = Duration::from_millis(self.max_delay_ms);
        let schedule: Box<dyn Iterator<Item = Duration> + Send> = match self.backoff {
            Backoff::Fixed => Box::new(Fixed::from_millis(self.base_delay_ms)),
            Backoff::Exponential => Box::new(Exponential::from_millis_with_factor(
                self.base_delay_ms,
                2.0,
            )),
        };
        Box::new(schedule.map(move |d| d.min(max)).take(self.retries as usize))
    }

    /// Whether `err` is a failure another attempt could fix.
    pub fn is_retryable(&self, err: &ClientError) -> bool {
        match err {
            ClientError::Network(_) | ClientError::Timeout(_) => true,
            ClientError::HttpStatus { status, .. } => self.retryable_statuses.contains(status),
            _ => false,
        }
    }
}
