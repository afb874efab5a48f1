//! certx-ledger
//!
//! Read-only views of the upstream systems certificates are derived from:
//!   CompletionLedger  — lesson units per course, completions per learner
//!   QuizResultLedger  — quizzes per course, scored attempts per learner
//!   Directory         — learner display names, course titles
//!
//! Two implementations are provided: [`MemoryLedger`] (fixtures, tests,
//! development nodes) and [`HttpLedger`] (the remote course platform API).

pub mod error;
pub mod fixtures;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{bounded, LedgerError};
pub use fixtures::LedgerFixtures;
pub use http::HttpLedger;
pub use memory::MemoryLedger;
pub use traits::{CompletionLedger, Directory, QuizResultLedger};
