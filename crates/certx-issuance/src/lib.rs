pub mod config;
pub mod store;

pub use config::IssuanceConfig;
pub use store::{CertificateStore, IssueOutcome};
