use super::{
    errors::{StateMachineError, StateMachineResult},
    events::ContactEvent,
    states::{ContactStatus, ProviderStatusKind},
};

/// Transition rules for a contact's status.
///
/// Pure: stores call [`ContactStateMachine::determine_target_state`] inside
/// their own conditional write so the rules live in one place.
pub struct ContactStateMachine;

impl ContactStateMachine {
    pub fn determine_target_state(
        current: &ContactStatus,
        event: &ContactEvent,
    ) -> StateMachineResult<ContactStatus> {
        let target = match (current, event) {
            (ContactStatus::Pending | ContactStatus::Retry, ContactEvent::Dispatch) => {
                ContactStatus::InProgress
            }

            (ContactStatus::InProgress, ContactEvent::PlacementFailed(_)) => ContactStatus::Failed,

            // Last write wins: a late or duplicate callback still overwrites.
            (_, ContactEvent::ProviderStatus(provider_status)) => {
                let target = ContactStatus::from(provider_status.as_str());
                let owned_by_dispatcher = matches!(
                    target,
                    ContactStatus::Pending | ContactStatus::InProgress | ContactStatus::Retry
                );
                if owned_by_dispatcher
                    || ProviderStatusKind::classify(provider_status) == ProviderStatusKind::Interim
                {
                    return Err(invalid(current, event));
                }
                target
            }

            (ContactStatus::InProgress, ContactEvent::StaleTimeout { retry: true }) => {
                ContactStatus::Retry
            }
            (ContactStatus::InProgress, ContactEvent::StaleTimeout { retry: false }) => {
                ContactStatus::Failed
            }

            (from, ContactEvent::Requeue) if !from.is_active() => ContactStatus::Pending,

            _ => return Err(invalid(current, event)),
        };

        Ok(target)
    }

    /// Statuses a contact may hold for `event` to apply, used as the
    /// compare-and-swap precondition by stores. `None` means any status.
    pub fn required_source_states(event: &ContactEvent) -> Option<Vec<ContactStatus>> {
        match event {
            ContactEvent::Dispatch => Some(vec![ContactStatus::Pending, ContactStatus::Retry]),
            ContactEvent::PlacementFailed(_) | ContactEvent::StaleTimeout { .. } => {
                Some(vec![ContactStatus::InProgress])
            }
            ContactEvent::ProviderStatus(_) | ContactEvent::Requeue => None,
        }
    }
}

fn invalid(current: &ContactStatus, event: &ContactEvent) -> StateMachineError {
    StateMachineError::InvalidTransition {
        from: current.to_string(),
        event: event.event_type().to_string(),
    }
}
