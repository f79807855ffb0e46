//! Centralized retry policy for backend calls
//!
//! Applied at the composer and indexer boundaries rather than scattered
//! through call sites.

use crate::error::Result;
use std::future::Future;

/// Fixed-attempt retry policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; values below 1 are treated as 1
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run the operation, retrying with unchanged input until it succeeds
    /// or attempts are exhausted
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(attempt, max = self.max_attempts, error = %e, "backend call failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("at least one attempt"))
    }
}
