pub mod service;

pub use service::VerificationService;
