// file: src/enrich/retry.rs
// description: bounded retry state machine and capped exponential backoff
// reference: per-attempt classification, strictly sequential retries per record

use crate::config::ScraperConfig;
use std::time::Duration;

/// States of the per-record fetch attempt machine. Terminal states are
/// `Success`, `PermanentFailure`, and `ExhaustedRetries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    Attempting,
    Success,
    TransientFailure,
    PermanentFailure,
    ExhaustedRetries,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Success | AttemptState::PermanentFailure | AttemptState::ExhaustedRetries
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.backoff_base(),
            cap: config.backoff_cap(),
        }
    }

    pub fn attempts_allowed(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after `completed_attempts` failed attempts:
    /// base * 2^(n-1), capped.
    pub fn backoff_delay(&self, completed_attempts: u32) -> Duration {
        let exponent = completed_attempts.saturating_sub(1).min(16);
        let multiplier = 1u32 << exponent;
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.cap)
            .min(self.cap)
    }
}
