use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use certx_core::anchor::CertificateAnchor;
use certx_core::error::CertxError;
use certx_core::types::{CertificateId, Timestamp};

// ── Wire types ───────────────────────────────────────────────────────────────

/// Metadata embedded in the minted asset. `content_digest` is what lets a
/// relying party check the off-chain record against the chain later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    pub image: String,
    pub certificate_id: CertificateId,
    pub student_name: String,
    pub course_name: String,
    pub completion_date: Timestamp,
    pub issue_date: Timestamp,
    pub content_digest: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub asset_name: String,
    pub destination_address: String,
    pub metadata: AssetMetadata,
}

/// Confirmation returned once the mint transaction is on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    #[serde(default)]
    pub image_uri: String,
}

/// An asset as seen by an independent chain explorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainAsset {
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    /// Digest found in the asset's on-chain metadata, if any.
    #[serde(default)]
    pub content_digest: Option<String>,
}

impl OnChainAsset {
    /// The chain agrees with the stored anchor on transaction, policy and
    /// embedded fingerprint.
    pub fn corroborates(&self, anchor: &CertificateAnchor) -> bool {
        self.asset_id == anchor.asset_id
            && self.tx_hash == anchor.tx_hash
            && self.policy_id == anchor.policy_id
            && self.content_digest.as_deref() == Some(anchor.content_digest.as_str())
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MintError {
    #[error("minting network unreachable: {0}")]
    Transport(String),

    #[error("minting network rejected the request: {0}")]
    Rejected(String),

    #[error("minting network returned a malformed response: {0}")]
    Malformed(String),
}

impl From<MintError> for CertxError {
    fn from(e: MintError) -> Self {
        CertxError::MintFailed { reason: e.to_string() }
    }
}

// ── Capabilities ─────────────────────────────────────────────────────────────

/// Broadcasts a mint transaction and waits for confirmation.
#[async_trait]
pub trait MintingNetwork: Send + Sync {
    async fn mint(&self, request: &MintRequest) -> Result<MintReceipt, MintError>;
}

/// Read-only view of the chain, independent of the anchor rows we store.
#[async_trait]
pub trait ChainExplorer: Send + Sync {
    async fn lookup_asset(&self, asset_id: &str) -> Result<Option<OnChainAsset>, MintError>;
}
