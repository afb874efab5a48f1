//! certx-eligibility
//!
//! Decides whether a learner has earned the certificate of a course by
//! combining the completion ledger (every lesson finished) with the quiz
//! ledger (at least one passing attempt).

pub mod evaluator;

pub use evaluator::{completion_percentage, Eligibility, EligibilityEvaluator};
