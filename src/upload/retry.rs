use crate::config::PipelineConfig;
use crate::upload::error::PipelineError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Bounded whole-attempt retry. Every attempt starts from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Run `attempt` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `attempt` receives the 1-based attempt number. On success returns the
    /// value and the number of attempts used.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        run_id: &str,
        mut attempt: F,
    ) -> Result<(T, u32), PipelineError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let mut number = 1;
        loop {
            match attempt(number).await {
                Ok(value) => return Ok((value, number)),
                Err(e) if !e.is_retryable() => {
                    error!(
                        "[Upload {}] {} attempt {} failed permanently: {}",
                        run_id, operation, number, e
                    );
                    return Err(e);
                }
                Err(e) if number >= self.max_attempts => {
                    error!(
                        "[Upload {}] {} attempt {}/{} failed, giving up: {}",
                        run_id, operation, number, self.max_attempts, e
                    );
                    return Err(PipelineError::AttemptsExhausted {
                        operation,
                        attempts: number,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(
                        "[Upload {}] {} attempt {}/{} failed, retrying: {}",
                        run_id, operation, number, self.max_attempts, e
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    number += 1;
                }
            }
        }
    }
}
