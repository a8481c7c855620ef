#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Autodialer
//!
//! Sequential outbound call dispatcher. Contacts are dialed one at a time;
//! the telephony provider's status callback for one call starts the next.
//!
//! ## Architecture
//!
//! A contact's `status` column is the only shared mutable state:
//!
//! ```text
//! pending ──dispatch──► in_progress ──provider status──► completed | busy | no-answer | ...
//!    ▲                      │
//!    │                      ├──placement failed──► failed
//!    │                      └──no callback (sweep)──► failed | retry ──dispatch──► in_progress
//!    └──────── free-text trigger (requeue) ─────────────┘
//! ```
//!
//! - Claims are compare-and-swap writes, so a duplicate dispatch is a no-op.
//! - At most one contact is `in_progress` at any time.
//! - Placement failures mark the contact `failed` and move on; one bad number
//!   never stalls the queue.
//! - Every placement, failure and outcome is appended to the call audit log.
//!
//! ## Module Organization
//!
//! - [`models`] - contacts and the call attempt audit log
//! - [`state_machine`] - contact status transitions
//! - [`store`] - Postgres and in-memory persistence
//! - [`queue`] - dispatch work queue
//! - [`provider`] - call placement clients and the voice prompt
//! - [`orchestration`] - dispatch engine, status callbacks, triggers, sweeper
//! - [`web`] - axum HTTP surface
//! - [`config`] - layered configuration
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autodialer::config::DialerConfig;
//! use autodialer::orchestration::DialerSystem;
//!
//! # async fn example() -> autodialer::Result<()> {
//! let config = DialerConfig::load(None)?;
//! let system = DialerSystem::bootstrap(config).await?;
//! system
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                            # In-memory store, queue and provider
//! cargo test --features postgres-tests  # Postgres store (needs DATABASE_URL)
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod phone;
pub mod provider;
pub mod queue;
pub mod state_machine;
pub mod store;
pub mod web;

pub use config::DialerConfig;
pub use error::{DialerError, Result};
pub use models::{CallAttempt, CallLogEntry, Contact, NewCallAttempt};
pub use orchestration::{
    BatchTrigger, DialerSystem, DispatchEngine, DispatchWorker, StalenessSweeper,
    StatusCallbackHandler,
};
pub use provider::{CallPlacementClient, PlaceCallRequest, ProviderPlacementError};
pub use queue::{DispatchCommand, DispatchQueue, DispatchReason};
pub use state_machine::{ContactEvent, ContactStatus};
pub use store::{CallLogStore, ContactStore, DialerStore};
