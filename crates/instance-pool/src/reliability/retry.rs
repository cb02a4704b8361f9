//! Retry policy and the backoff driver

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

/// Backoff configuration for retrying a fallible async operation
///
/// Used by the pool both for acquiring an instance while the pool is full
/// and for waiting on busy instances during graceful shutdown.
///
/// # Example
///
/// ```
/// use instance_pool::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential()
///     .with_max_attempts(5)
///     .with_initial_interval(Duration::from_millis(50))
///     .with_max_interval(Duration::from_secs(2));
///
/// // First retry after 50ms
/// // Second retry after 100ms
/// // Third retry after 200ms
/// // etc.
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including initial)
    pub max_attempts: u32,

    /// Delay before the first retry
    #[serde(with = "duration_millis")]
    pub initial_interval: Duration,

    /// Maximum delay between retries
    #[serde(with = "duration_millis")]
    pub max_interval: Duration,

    /// Backoff multiplier (e.g., 2.0 for exponential)
    pub backoff_coefficient: f64,

    /// Jitter factor (0.0-1.0) to add randomness
    ///
    /// A value of 0.1 means ±10% randomness.
    #[serde(default)]
    pub jitter: f64,

    /// Give up once this much time has elapsed since the first attempt
    #[serde(default, with = "option_duration_millis")]
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl RetryPolicy {
    /// Create an exponential backoff retry policy
    ///
    /// - 10 max attempts
    /// - 100ms initial interval
    /// - 30 second max interval
    /// - 2x backoff coefficient
    /// - no jitter
    pub fn exponential() -> Self {
        Self {
            max_attempts: 10,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(30),
            backoff_coefficient: 2.0,
            jitter: 0.0,
            max_elapsed: None,
        }
    }

    /// Create a policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            backoff_coefficient: 1.0,
            jitter: 0.0,
            max_elapsed: None,
        }
    }

    /// Create a policy with fixed intervals (no backoff)
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: interval,
            max_interval: interval,
            backoff_coefficient: 1.0,
            jitter: 0.0,
            max_elapsed: None,
        }
    }

    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the initial retry interval
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the maximum retry interval
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the backoff coefficient
    pub fn with_backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient.max(1.0);
        self
    }

    /// Set the jitter factor (0.0-1.0)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Bound the total time spent retrying
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Calculate delay for a given attempt number (1-based)
    ///
    /// Returns the duration to wait before that attempt. Fields set directly
    /// or deserialized are held to the same bounds as the builders: the
    /// coefficient is at least 1.0 and jitter lies in 0.0-1.0.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let retry_num = attempt - 1;
        let coefficient = self.backoff_coefficient.max(1.0);
        let exponent = i32::try_from(retry_num - 1).unwrap_or(i32::MAX);
        let base = self.initial_interval.as_secs_f64() * coefficient.powi(exponent);
        let capped = base.min(self.max_interval.as_secs_f64()).max(0.0);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let jittered = if jitter > 0.0 && capped > 0.0 {
            let mut rng = rand::thread_rng();
            let jitter_range = capped * jitter;
            let jitter_offset = rng.gen_range(-jitter_range..jitter_range);
            (capped + jitter_offset).max(0.0)
        } else {
            capped
        };

        Duration::try_from_secs_f64(jittered).unwrap_or(self.max_interval)
    }

    /// Check if there are remaining attempts
    pub fn has_attempts_remaining(&self, current_attempt: u32) -> bool {
        current_attempt < self.max_attempts
    }
}

/// Run a fallible async operation under `policy`
///
/// `operation` receives the 1-based attempt number. An error is retried
/// when `should_retry` accepts it and the policy still has attempts and
/// time left; otherwise the last error is returned. The predicate is
/// supplied by the caller; the pool passes
/// [`PoolError::is_retryable`](crate::PoolError::is_retryable).
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !should_retry(&error) || !policy.has_attempts_remaining(attempt) {
            return Err(error);
        }

        let delay = policy.delay_for_attempt(attempt + 1);
        if let Some(max_elapsed) = policy.max_elapsed {
            if started.elapsed() + delay > max_elapsed {
                trace!(attempt, "Retry budget elapsed");
                return Err(error);
            }
        }

        trace!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod option_duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_millis().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_defaults() {
        let policy = RetryPolicy::exponential();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.initial_interval, Duration::from_millis(100));
        assert_eq!(policy.backoff_coefficient, 2.0);
        assert!(policy.max_elapsed.is_none());
    }

    #[test]
    fn test_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.has_attempts_remaining(1));
    }

    #[test]
    fn test_fixed_interval() {
        let policy = RetryPolicy::fixed(Duration::from_millis(250), 3);

        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(250));
    }

    #[test]
    fn test_delay_for_attempt() {
        let policy = RetryPolicy::exponential();

        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(400));
    }

    #[test]
    fn test_max_interval_cap() {
        let policy = RetryPolicy::exponential().with_max_interval(Duration::from_secs(1));

        assert_eq!(policy.delay_for_attempt(20), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::fixed(Duration::from_millis(100), 5).with_jitter(0.5);

        for _ in 0..50 {
            let delay = policy.delay_for_attempt(2);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_deserialized_coefficient_below_one_is_clamped() {
        let json = r#"{"max_attempts":5,"initial_interval":10,"max_interval":1000,"backoff_coefficient":-2.0}"#;
        let policy: RetryPolicy = serde_json::from_str(json).unwrap();

        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(10));
    }

    #[test]
    fn test_out_of_range_jitter_field_is_clamped() {
        let mut policy = RetryPolicy::fixed(Duration::from_millis(100), 5);
        policy.jitter = 7.5;

        for _ in 0..50 {
            assert!(policy.delay_for_attempt(2) <= Duration::from_millis(200));
        }

        policy.jitter = -1.0;
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(100));
    }

    #[test]
    fn test_serialization() {
        let policy = RetryPolicy::exponential()
            .with_max_attempts(4)
            .with_max_elapsed(Duration::from_secs(3));

        let json = serde_json::to_string(&policy).unwrap();
        let parsed: RetryPolicy = serde_json::from_str(&json).unwrap();

        assert_eq!(policy, parsed);
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{"max_attempts":3,"initial_interval":20,"max_interval":500,"backoff_coefficient":1.5}"#;
        let policy: RetryPolicy = serde_json::from_str(json).unwrap();

        assert_eq!(policy.initial_interval, Duration::from_millis(20));
        assert_eq!(policy.jitter, 0.0);
        assert!(policy.max_elapsed.is_none());
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(Duration::from_millis(1), 5);

        let result: Result<u32, String> = retry(
            &policy,
            |_| true,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("attempt {attempt} failed"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(Duration::from_millis(1), 4);

        let result: Result<(), String> = retry(
            &policy,
            |_| true,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("attempt {attempt} failed")) }
            },
        )
        .await;

        assert_eq!(result, Err("attempt 4 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_stops_on_rejected_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(Duration::from_millis(1), 10);

        let result: Result<(), String> = retry(
            &policy,
            |e: &String| e != "fatal",
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal".to_string()) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_honours_max_elapsed() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(Duration::from_millis(20), 1_000)
            .with_max_elapsed(Duration::from_millis(100));

        let result: Result<(), String> = retry(
            &policy,
            |_| true,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("busy".to_string()) }
            },
        )
        .await;

        assert!(result.is_err());
        let calls = calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected a few attempts, got {calls}");
        assert!(calls <= 6, "expected the time budget to stop retries, got {calls}");
    }
}
