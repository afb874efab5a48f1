use serde::{Deserialize, Serialize};

use crate::constants::{ASSET_NAME_PREFIX, MAX_ASSET_NAME_BYTES, MINT_LEASE_TTL_SECS};
use crate::types::{CertificateId, Timestamp};

/// Immutable proof that a certificate was minted as an on-chain asset.
///
/// Written once, after the minting network confirmed the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAnchor {
    pub certificate_id: CertificateId,
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    pub image_uri: String,
    pub minted_at: Timestamp,
    /// Wallet address that received the asset.
    pub destination_address: String,
    /// Certificate fingerprint embedded in the asset metadata at mint time.
    pub content_digest: String,
}

/// Marker held while a mint call for one certificate is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintLease {
    pub certificate_id: CertificateId,
    pub acquired_at: Timestamp,
}

impl MintLease {
    pub fn new(certificate_id: CertificateId, acquired_at: Timestamp) -> Self {
        Self { certificate_id, acquired_at }
    }

    /// A lease outlives any mint call after `MINT_LEASE_TTL_SECS`; past that
    /// its holder is assumed gone.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        now - self.acquired_at >= MINT_LEASE_TTL_SECS
    }
}

/// On-chain asset name for a certificate: `CERT<base58 id>`, capped at the
/// network's asset name limit.
pub fn asset_name_for(id: &CertificateId) -> String {
    let mut name = format!("{ASSET_NAME_PREFIX}{}", id.to_b58());
    name.truncate(MAX_ASSET_NAME_BYTES);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_name_fits_network_limit() {
        let id = CertificateId::from_bytes([0xff; 16]);
        let name = asset_name_for(&id);
        assert!(name.starts_with(ASSET_NAME_PREFIX));
        assert!(name.len() <= MAX_ASSET_NAME_BYTES);
    }

    #[test]
    fn lease_goes_stale_after_ttl() {
        let lease = MintLease::new(CertificateId::from_bytes([1; 16]), 1_000);
        assert!(!lease.is_stale(1_000 + MINT_LEASE_TTL_SECS - 1));
        assert!(lease.is_stale(1_000 + MINT_LEASE_TTL_SECS));
    }
}
