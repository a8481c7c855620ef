// Contact status state machine
//
// Contacts move pending -> in_progress -> <terminal>, with retry as a second
// dispatchable state for calls the staleness sweep gave up on.

pub mod contact_state_machine;
pub mod errors;
pub mod events;
pub mod states;

pub use contact_state_machine::ContactStateMachine;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ContactEvent;
pub use states::{ContactStatus, ProviderStatusKind};
