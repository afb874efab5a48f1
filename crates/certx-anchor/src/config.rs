use std::time::Duration;

use certx_core::constants::{DEFAULT_ANCHOR_IMAGE_URI, DEFAULT_MINT_TIMEOUT_MS, MINT_LEASE_TTL_SECS};
use certx_core::error::CertxError;

#[derive(Clone, Debug)]
pub struct AnchorConfig {
    /// Bound on one round trip to the minting network.
    pub mint_timeout: Duration,
    /// Artwork referenced by minted assets.
    pub image_uri: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            mint_timeout: Duration::from_millis(DEFAULT_MINT_TIMEOUT_MS),
            image_uri: DEFAULT_ANCHOR_IMAGE_URI.to_string(),
        }
    }
}

impl AnchorConfig {
    /// A mint must finish, or be abandoned, while its lease is still live.
    /// Otherwise a second caller could take over the lease and broadcast again.
    pub fn validate(&self) -> Result<(), CertxError> {
        let lease_ttl = Duration::from_secs(MINT_LEASE_TTL_SECS.unsigned_abs());
        if self.mint_timeout.is_zero() || self.mint_timeout >= lease_ttl {
            return Err(CertxError::InvalidInput(format!(
                "mint timeout must be between 1 ms and {lease_ttl:?} (the mint lease TTL), got {:?}",
                self.mint_timeout
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AnchorConfig::default().validate().unwrap();
    }

    #[test]
    fn mint_timeout_must_stay_under_lease_ttl() {
        let ttl = Duration::from_secs(MINT_LEASE_TTL_SECS as u64);
        for bad in [Duration::ZERO, ttl, ttl + Duration::from_secs(1)] {
            let config = AnchorConfig { mint_timeout: bad, ..AnchorConfig::default() };
            assert!(matches!(config.validate(), Err(CertxError::InvalidInput(_))), "{bad:?}");
        }
        let config = AnchorConfig { mint_timeout: ttl - Duration::from_secs(1), ..AnchorConfig::default() };
        config.validate().unwrap();
    }
}
