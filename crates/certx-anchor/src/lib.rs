//! certx-anchor
//!
//! Binds certificates to on-chain assets. The minting network is an injected
//! capability: [`HttpMintingNetwork`] talks to a minting gateway,
//! [`SimulatedMintingNetwork`] answers in-process for tests and development
//! nodes.

pub mod config;
pub mod http;
pub mod network;
pub mod service;
pub mod simulated;

pub use config::AnchorConfig;
pub use http::HttpMintingNetwork;
pub use network::{AssetMetadata, ChainExplorer, MintError, MintReceipt, MintRequest, MintingNetwork, OnChainAsset};
pub use service::{LedgerAnchorService, MintOutcome};
pub use simulated::SimulatedMintingNetwork;
