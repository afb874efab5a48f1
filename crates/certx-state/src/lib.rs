//! certx-state
//!
//! Persistent storage for issued certificates, their on-chain anchors and
//! in-flight mint leases. All uniqueness guarantees of the service live here:
//! callers never run check-then-act sequences of their own.

pub mod db;

pub use db::{InsertOutcome, StateDb};
