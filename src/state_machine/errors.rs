use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Another contact is already in progress")]
    LineBusy,
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
