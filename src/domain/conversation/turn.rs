//! One turn of a conversation and the transition protocol.
//!
//! A `Turn` works on a copy of the session and tracks the active state.
//! States call [`Turn::transition_to`] to move on; when the new state is
//! [`Continuable`](super::Continuable) its continuation runs immediately and
//! may transition again, so one inbound message can walk several states.
//! Nothing is written back to the context unless the whole turn succeeds.

use std::sync::Arc;

use crate::domain::foundation::StateMachine;
use crate::ports::{ContractRepository, ReportGenerator};

use super::{ConversationError, ConversationState, MessageBatch, Session, StateKind};

/// Collaborators a turn may call.
#[derive(Clone)]
pub struct TurnServices {
    pub contracts: Arc<dyn ContractRepository>,
    pub reports: Arc<dyn ReportGenerator>,
}

impl TurnServices {
    pub fn new(contracts: Arc<dyn ContractRepository>, reports: Arc<dyn ReportGenerator>) -> Self {
        Self { contracts, reports }
    }
}

/// Result of a completed turn, ready to commit to the context.
pub(crate) struct TurnOutcome {
    pub session: Session,
    pub state: Arc<dyn ConversationState>,
    pub trail: Vec<StateKind>,
}

pub struct Turn<'a> {
    services: &'a TurnServices,
    session: Session,
    active: Arc<dyn ConversationState>,
    trail: Vec<StateKind>,
    depth: usize,
}

impl<'a> Turn<'a> {
    pub(crate) fn new(
        services: &'a TurnServices,
        session: Session,
        active: Arc<dyn ConversationState>,
    ) -> Self {
        Self {
            services,
            session,
            active,
            trail: Vec::new(),
            depth: 0,
        }
    }

    pub fn contracts(&self) -> &dyn ContractRepository {
        self.services.contracts.as_ref()
    }

    pub fn reports(&self) -> &dyn ReportGenerator {
        self.services.reports.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn active_kind(&self) -> StateKind {
        self.active.kind()
    }

    pub(crate) fn active_state(&self) -> Arc<dyn ConversationState> {
        Arc::clone(&self.active)
    }

    /// Replaces the active state and runs its continuation, if it has one.
    ///
    /// Returns the continuation's messages, or an empty batch for states
    /// that wait for user input.
    pub async fn transition_to(
        &mut self,
        target: StateKind,
    ) -> Result<MessageBatch, ConversationError> {
        let from = self.active.kind();
        from.transition_to(target)
            .map_err(|_| ConversationError::IllegalTransition { from, to: target })?;

        if self.depth >= StateKind::COUNT {
            return Err(ConversationError::ChainTooDeep {
                at: target,
                limit: StateKind::COUNT,
            });
        }

        let state = target.instantiate();
        self.active = Arc::clone(&state);
        self.trail.push(target);
        tracing::debug!(from = ?from, to = ?target, "state transition");

        let Some(continuable) = state.as_continuable() else {
            return Ok(MessageBatch::new());
        };

        self.depth += 1;
        let result = continuable.auto_respond(self).await;
        self.depth -= 1;
        result
    }

    pub(crate) fn finish(self) -> TurnOutcome {
        TurnOutcome {
            session: self.session,
            state: self.active,
            trail: self.trail,
        }
    }
}
