//! # Dispatch Orchestration
//!
//! The sequential dialing core.
//!
//! ## Architecture
//!
//! ```text
//! BatchTrigger ──┐
//! StatusCallbackHandler ──┼─► DispatchQueue ─► DispatchWorker ─► DispatchEngine ─► CallPlacementClient
//! StalenessSweeper ──┘                                                 │
//!        ▲                                                             └─► (on failure) DispatchQueue
//!        └──────────── provider callback ◄── call ends ◄─────────────────── provider
//! ```
//!
//! Entry points only enqueue; the worker places calls out of band. One call
//! ends, its callback enqueues the next pending contact, and the chain runs
//! until nothing is pending.
//!
//! ## Core Components
//!
//! - [`DispatchEngine`] - claim one contact, place its call, absorb failures
//! - [`StatusCallbackHandler`] - apply provider statuses, advance the queue
//! - [`BatchTrigger`] - start the batch, or dial a number found in free text
//! - [`DispatchWorker`] - drain the queue into the engine
//! - [`StalenessSweeper`] - reclaim calls that never reported back
//! - [`DialerSystem`] - wire everything from configuration

pub mod batch_trigger;
pub mod bootstrap;
pub mod dispatch_engine;
pub mod dispatch_worker;
pub mod staleness_sweeper;
pub mod status_callback;
pub mod types;

pub use batch_trigger::BatchTrigger;
pub use bootstrap::DialerSystem;
pub use dispatch_engine::DispatchEngine;
pub use dispatch_worker::DispatchWorker;
pub use staleness_sweeper::{StalenessSweeper, SweepReport};
pub use status_callback::StatusCallbackHandler;
pub use types::{
    CallbackEndpoints, CallbackOutcome, DispatchOutcome, IgnoreReason, SkipReason, StatusReport,
    TriggerOutcome,
};
