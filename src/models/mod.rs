//! # Models
//!
//! Persistent data model: contacts and the call attempt audit log.

pub mod call_attempt;
pub mod contact;

pub use call_attempt::{CallAttempt, CallLogEntry, NewCallAttempt};
pub use contact::{ClaimOutcome, Contact, ContactTransition};
