use std::time::Duration;

use certx_core::constants::{DEFAULT_LEDGER_TIMEOUT_MS, SECONDS_PER_DAY};

/// Issuance policy.
#[derive(Clone, Debug)]
pub struct IssuanceConfig {
    /// Validity window stamped onto new certificates as `expires_at`.
    /// `None` issues certificates that never lapse on their own.
    pub validity_secs: Option<i64>,
    /// Bound on each completion, quiz and directory read.
    pub ledger_timeout: Duration,
}

impl IssuanceConfig {
    pub fn with_validity_days(mut self, days: Option<u32>) -> Self {
        self.validity_secs = days.map(|d| i64::from(d) * SECONDS_PER_DAY);
        self
    }
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            validity_secs: None,
            ledger_timeout: Duration::from_millis(DEFAULT_LEDGER_TIMEOUT_MS),
        }
    }
}
