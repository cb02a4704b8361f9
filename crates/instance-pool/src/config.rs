//! Pool configuration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reliability::RetryPolicy;

/// Pool configuration
///
/// # Example
///
/// ```
/// use instance_pool::{PoolConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = PoolConfig::new(4)
///     .with_name("renderers")
///     .with_eager_instances(true)
///     .with_retry(RetryPolicy::fixed(Duration::from_millis(50), 20));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Name used in log fields (generated if not provided)
    #[serde(default = "default_name")]
    pub name: String,

    /// Maximum number of live instances
    pub max_instances: usize,

    /// Create every instance up front instead of on first use
    #[serde(default)]
    pub eager_instances: bool,

    /// Default retry policy for acquisition and graceful shutdown
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_name() -> String {
    format!("pool-{}", Uuid::now_v7())
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_instances: 10,
            eager_instances: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Create a configuration with the given capacity
    pub fn new(max_instances: usize) -> Self {
        Self::default().with_max_instances(max_instances)
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the maximum number of instances
    pub fn with_max_instances(mut self, max: usize) -> Self {
        self.max_instances = max.max(1);
        self
    }

    /// Create instances eagerly at construction
    pub fn with_eager_instances(mut self, eager: bool) -> Self {
        self.eager_instances = eager;
        self
    }

    /// Set the default retry policy
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert!(config.name.starts_with("pool-"));
        assert_eq!(config.max_instances, 10);
        assert!(!config.eager_instances);
        assert_eq!(config.retry, RetryPolicy::exponential());
    }

    #[test]
    fn test_config_builder() {
        let config = PoolConfig::new(3)
            .with_name("workers")
            .with_eager_instances(true)
            .with_retry(RetryPolicy::no_retry());

        assert_eq!(config.name, "workers");
        assert_eq!(config.max_instances, 3);
        assert!(config.eager_instances);
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(PoolConfig::new(0).max_instances, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PoolConfig = serde_json::from_value(serde_json::json!({
            "max_instances": 5,
            "retry": {
                "max_attempts": 3,
                "initial_interval": 10,
                "max_interval": 40,
                "backoff_coefficient": 2.0
            }
        }))
        .unwrap();

        assert!(config.name.starts_with("pool-"));
        assert_eq!(config.max_instances, 5);
        assert!(!config.eager_instances);
        assert_eq!(config.retry.initial_interval, Duration::from_millis(10));
        assert_eq!(config.retry.max_interval, Duration::from_millis(40));
    }
}
