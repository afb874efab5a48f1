use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::network::{ChainExplorer, MintError, MintReceipt, MintRequest, MintingNetwork, OnChainAsset};

/// Policy ids are 28-byte hashes; the simulated one is derived from a fixed
/// seed so it is stable across runs.
const SIMULATED_POLICY_SEED: &[u8] = b"certx.simulated-policy";

/// In-process minting network with deterministic output.
///
/// Keeps every minted asset so it can double as a [`ChainExplorer`]. Failures
/// and latency can be injected.
pub struct SimulatedMintingNetwork {
    policy_id: String,
    delay: Option<Duration>,
    fail_next: AtomicU32,
    calls: AtomicU32,
    assets: Mutex<HashMap<String, OnChainAsset>>,
}

impl Default for SimulatedMintingNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedMintingNetwork {
    pub fn new() -> Self {
        let policy = blake3::hash(SIMULATED_POLICY_SEED);
        Self {
            policy_id: hex::encode(&policy.as_bytes()[..28]),
            delay: None,
            fail_next: AtomicU32::new(0),
            calls: AtomicU32::new(0),
            assets: Mutex::new(HashMap::new()),
        }
    }

    /// Every mint call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The next `n` mint calls fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of mint calls received, failed ones included.
    pub fn mint_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replace the digest recorded on chain for `asset_id`, as if the anchor
    /// pointed at some other asset.
    pub fn overwrite_onchain_digest(&self, asset_id: &str, digest: &str) {
        if let Some(asset) = self.assets().get_mut(asset_id) {
            asset.content_digest = Some(digest.to_string());
        }
    }

    fn assets(&self) -> MutexGuard<'_, HashMap<String, OnChainAsset>> {
        self.assets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl MintingNetwork for SimulatedMintingNetwork {
    async fn mint(&self, request: &MintRequest) -> Result<MintReceipt, MintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.take_failure() {
            return Err(MintError::Transport("simulated network failure".into()));
        }

        let asset_id = format!("{}{}", self.policy_id, hex::encode(request.asset_name.as_bytes()));
        let encoded = serde_json::to_vec(request).map_err(|e| MintError::Malformed(e.to_string()))?;
        let tx_hash = blake3::hash(&encoded).to_hex().to_string();

        self.assets().insert(
            asset_id.clone(),
            OnChainAsset {
                policy_id: self.policy_id.clone(),
                asset_id: asset_id.clone(),
                asset_name: request.asset_name.clone(),
                tx_hash: tx_hash.clone(),
                content_digest: Some(request.metadata.content_digest.clone()),
            },
        );

        Ok(MintReceipt {
            policy_id: self.policy_id.clone(),
            asset_id,
            asset_name: request.asset_name.clone(),
            tx_hash,
            image_uri: request.metadata.image.clone(),
        })
    }
}

#[async_trait]
impl ChainExplorer for SimulatedMintingNetwork {
    async fn lookup_asset(&self, asset_id: &str) -> Result<Option<OnChainAsset>, MintError> {
        Ok(self.assets().get(asset_id).cloned())
    }
}
