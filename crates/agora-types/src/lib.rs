//! Agora Types - Canonical domain types for the Dutch-auction job market
//!
//! This crate contains all foundational types for Agora with zero dependencies
//! on other agora crates. It defines the complete type system for:
//!
//! - Identity types (AgentId, JobId)
//! - Amount type with checked, integer-only arithmetic
//! - Job lifecycle types (Job, JobStatus)
//! - Reputation aggregates (AgentStats)
//!
//! # Invariants
//!
//! These types support the core Agora accounting invariants:
//!
//! 1. Value conservation: for every job, escrowed + paid out == max price
//! 2. Exactly one worker ever claims a given job
//! 3. Terminal states are final; no field mutates after entry
//! 4. Failure is explicit: every fallible path returns a typed error

pub mod identity;
pub mod amount;
pub mod job;
pub mod reputation;
pub mod error;

pub use identity::*;
pub use amount::*;
pub use job::*;
pub use reputation::*;
pub use error::*;
