use std::future::Future;
use std::time::Duration;

use certx_core::error::CertxError;
use thiserror::Error;

/// Failure talking to an upstream ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{ledger} unreachable: {reason}")]
    Unavailable { ledger: &'static str, reason: String },

    #[error("{ledger} returned a malformed response: {reason}")]
    Malformed { ledger: &'static str, reason: String },

    #[error("{ledger} did not answer within {timeout_ms} ms")]
    TimedOut { ledger: &'static str, timeout_ms: u128 },
}

impl LedgerError {
    pub fn unavailable(ledger: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable { ledger, reason: reason.into() }
    }

    pub fn malformed(ledger: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed { ledger, reason: reason.into() }
    }
}

/// Any ledger failure leaves the caller unable to decide; it is never turned
/// into a negative verdict.
impl From<LedgerError> for CertxError {
    fn from(e: LedgerError) -> Self {
        CertxError::DependencyUnavailable(e.to_string())
    }
}

/// Run one ledger read, failing with [`LedgerError::TimedOut`] once `timeout`
/// elapses.
pub async fn bounded<T, F>(ledger: &'static str, timeout: Duration, call: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::TimedOut { ledger, timeout_ms: timeout.as_millis() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_call_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, LedgerError>(1)
        };
        let err = bounded("quiz ledger", Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, LedgerError::TimedOut { ledger: "quiz ledger", .. }));
        assert!(CertxError::from(err).is_retryable());
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let v = bounded("directory", Duration::from_secs(1), async { Ok::<_, LedgerError>(7) })
            .await
            .unwrap();
        assert_eq!(v, 7);
    }
}
