//! State machine trait for closed sets of states.
//!
//! Gives every state enum the same way of declaring its legal moves and
//! validating a requested move before it is applied.

use super::{DomainError, ErrorCode};

/// Trait for enums that represent state machines.
///
/// Implementors list the legal targets of each state; validation and
/// terminal checks come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for StateKind {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             StateKind::SelectReturn => vec![StateKind::SelectOption, StateKind::End],
///             // ... etc
///         }
///     }
/// }
///
/// let next = StateKind::SelectReturn.transition_to(StateKind::End)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
