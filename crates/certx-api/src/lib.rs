//! certx REST API
//!
//! ## Endpoints
//!
//! ### Issuance
//! - POST /certificate - Issue (or return) the certificate for a user and course
//! - GET /certificate/:certificate_id - Get a certificate
//! - GET /certificates/user/:user_id - List a user's certificates
//! - POST /certificate/:certificate_id/status - Revoke or expire (administrative)
//! - POST /certificate/:certificate_id/metadata - Attach a metadata entry
//!
//! ### Verification (public)
//! - GET /verify-certificate/:certificate_id - Verify a certificate
//!
//! ### Anchoring
//! - POST /certificate/:certificate_id/mint - Mint the certificate on chain
//! - GET /certificate-nft/by-certificate/:certificate_id - Get the anchor
//!
//! ### Operations
//! - GET /health - Liveness and counters

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use dto::*;
pub use error::*;
pub use routes::create_router;
pub use server::*;
pub use state::*;
