pub mod anchor;
pub mod certificate;
pub mod constants;
pub mod error;
pub mod records;
pub mod types;
pub mod verification;

pub use anchor::*;
pub use certificate::*;
pub use constants::*;
pub use error::CertxError;
pub use records::*;
pub use types::*;
pub use verification::*;
