//! Bounded retry with optional exponential backoff.
//!
//! [`RetryPolicy`] is the user-facing budget: how many retries a fetch may
//! spend and the connect/read timeout pair. It derives two [`RetryConfig`]s,
//! one for connection failures inside the session transport and one for read
//! timeouts in `open`. Both are driven by [`retry_async`].

use crate::config::NetworkConfig;
use crate::{FetchError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry budget and timeout pair applied to a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    max_retries: u32,
    connect_timeout: Duration,
    read_timeout: Duration,
    connect_backoff: Duration,
    connect_backoff_max: Duration,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: NetworkConfig::MAX_RETRIES,
            connect_timeout: NetworkConfig::CONNECT_TIMEOUT,
            read_timeout: NetworkConfig::READ_TIMEOUT,
            connect_backoff: NetworkConfig::CONNECT_RETRY_BASE_DELAY,
            connect_backoff_max: NetworkConfig::CONNECT_RETRY_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of retries allowed after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the connect/read timeout pair. Both must be non-zero.
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Result<Self> {
        if connect.is_zero() || read.is_zero() {
            return Err(FetchError::config(format!(
                "timeouts must be positive (connect={:?}, read={:?})",
                connect, read
            )));
        }
        self.connect_timeout = connect;
        self.read_timeout = read;
        Ok(self)
    }

    /// Set the backoff between connection retries.
    pub fn with_connect_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.connect_backoff = base;
        self.connect_backoff_max = max;
        self
    }

    /// Enable or disable jitter on connection retry delays.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Attempts allowed in total, counting the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Retry behavior for connection failures in the transport.
    pub fn connect_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(self.max_attempts())
            .with_base_delay(self.connect_backoff)
            .with_max_delay(self.connect_backoff_max)
            .with_jitter(self.jitter)
            .with_warnings(false)
    }

    /// Retry behavior for read timeouts in `open`. Retries immediately.
    pub fn read_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(self.max_attempts())
            .with_base_delay(Duration::ZERO)
            .with_jitter(false)
            .with_warnings(true)
    }
}

/// Configuration for a single retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
    /// Log each retry at warn level instead of debug.
    pub warn_on_retry: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::MAX_RETRIES + 1,
            base_delay: NetworkConfig::CONNECT_RETRY_BASE_DELAY,
            max_delay: NetworkConfig::CONNECT_RETRY_MAX_DELAY,
            jitter: true,
            warn_on_retry: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_warnings(mut self, warn_on_retry: bool) -> Self {
        self.warn_on_retry = warn_on_retry;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        // base * 2^attempt, capped
        let multiplier = 2f64.powi(attempt.min(31) as i32);
        let delay_secs = self.base_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());

        let final_secs = if self.jitter {
            // Scale by 0.5..1.5 so concurrent callers spread out without
            // collapsing to near-zero delays.
            let jitter_factor = rand::rng().random_range(0.5..1.5);
            (capped_secs * jitter_factor).min(self.max_delay.as_secs_f64())
        } else {
            capped_secs
        };

        Duration::from_secs_f64(final_secs)
    }
}

/// Statistics about a retry operation.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Number of attempts made.
    pub attempts: u32,
    /// Number of retries announced (one log line each).
    pub retries: u32,
    /// Total delay accumulated.
    pub total_delay: Duration,
    /// Whether the operation ultimately succeeded.
    pub success: bool,
    /// Whether the loop stopped because the attempt budget ran out.
    pub exhausted: bool,
    /// Last error message if failed.
    pub last_error: Option<String>,
}

/// Retry an async operation while `should_retry` accepts its error.
///
/// `label` names the operation in log lines. A retry is announced before each
/// re-attempt, never after the final one, so a loop that runs out of attempts
/// announces `max_attempts - 1` retries. With `warn_on_retry` set, the warn
/// lines emitted equal `stats.retries`.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> (std::result::Result<T, E>, RetryStats)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut stats = RetryStats::default();
    let mut attempt = 0;

    loop {
        stats.attempts = attempt + 1;

        let error = match operation().await {
            Ok(value) => {
                stats.success = true;
                if attempt > 0 {
                    debug!("{} succeeded after {} attempts", label, attempt + 1);
                }
                return (Ok(value), stats);
            }
            Err(e) => e,
        };

        stats.last_error = Some(error.to_string());

        if !should_retry(&error) {
            debug!("{}: error is not retryable: {}", label, error);
            return (Err(error), stats);
        }

        if attempt + 1 >= config.max_attempts {
            // The caller reports the failure; only retries are logged at warn.
            stats.exhausted = true;
            debug!(
                "{}: all {} attempts exhausted. Last error: {}",
                label, config.max_attempts, error
            );
            return (Err(error), stats);
        }

        let remaining = config.max_attempts - attempt - 1;
        let delay = config.calculate_delay(attempt);
        stats.total_delay += delay;
        stats.retries += 1;

        if config.warn_on_retry {
            warn!(
                "{}: {}, retrying. {} retries remain.",
                label, error, remaining
            );
        } else {
            debug!(
                "{}: {}, retrying in {:?}. {} retries remain.",
                label, error, delay, remaining
            );
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}
