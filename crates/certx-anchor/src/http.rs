use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::network::{ChainExplorer, MintError, MintReceipt, MintRequest, MintingNetwork, OnChainAsset};

/// Minting gateway reached over HTTP.
///
///   POST {base}/mint               MintRequest → MintReceipt
///   GET  {base}/assets/{asset_id}  → OnChainAsset (404 = unknown)
///
/// A 4xx answer to `mint` is a rejection; anything else that is not a 2xx
/// is treated as the network being unavailable.
pub struct HttpMintingNetwork {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpMintingNetwork {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MintError> {
        let base_url = Url::parse(base_url).map_err(|e| MintError::Malformed(format!("bad base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MintError::Malformed("base url cannot carry a path".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MintError::Transport(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl MintingNetwork for HttpMintingNetwork {
    async fn mint(&self, request: &MintRequest) -> Result<MintReceipt, MintError> {
        let url = self.url(&["mint"]);
        debug!(%url, asset_name = %request.asset_name, "submitting mint");
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| MintError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<MintReceipt>().await.map_err(|e| MintError::Malformed(e.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(MintError::Rejected(format!("HTTP {status}: {body}")))
        } else {
            Err(MintError::Transport(format!("HTTP {status}: {body}")))
        }
    }
}

#[async_trait]
impl ChainExplorer for HttpMintingNetwork {
    async fn lookup_asset(&self, asset_id: &str) -> Result<Option<OnChainAsset>, MintError> {
        let resp = self
            .client
            .get(self.url(&["assets", asset_id]))
            .send()
            .await
            .map_err(|e| MintError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json::<OnChainAsset>()
                .await
                .map(Some)
                .map_err(|e| MintError::Malformed(e.to_string())),
            s => Err(MintError::Transport(format!("HTTP {s}"))),
        }
    }
}
