//! Reliability patterns for the pool
//!
//! This module provides:
//! - [`RetryPolicy`] - Configurable retry with exponential backoff
//! - [`retry`] - Drives a fallible async operation under a policy

mod retry;

pub use retry::{retry, RetryPolicy};
