//! Conversation state graph.
//!
//! `StateKind` names the closed set of states. The full transition table
//! lives in the `StateMachine` impl; the subset taken automatically by
//! auto-continuations is declared separately and checked acyclic at
//! compile time, so no state addition can introduce an endless chain.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

use super::states::{
    ConversationState, EndState, GenerateReportState, GetCallUpdatesState, GetCallsState,
    SelectCallState, SelectOptionState, SelectReturnState, StartState,
};

/// Identity of a conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    /// Waiting for a greeting or a contract number.
    #[default]
    Start,
    /// Main menu: list tickets or generate a report.
    SelectOption,
    /// Lists the contract's tickets, then asks for one.
    GetCalls,
    /// Waiting for a ticket number.
    SelectCall,
    /// Shows the selected ticket's latest update.
    GetCallUpdates,
    /// Back to menu or end the session.
    SelectReturn,
    /// Builds the ticket report and replies with its link.
    GenerateReport,
    /// Session closed; resets itself to `Start`.
    End,
}

impl StateKind {
    pub const COUNT: usize = 8;

    pub const ALL: [StateKind; StateKind::COUNT] = [
        StateKind::Start,
        StateKind::SelectOption,
        StateKind::GetCalls,
        StateKind::SelectCall,
        StateKind::GetCallUpdates,
        StateKind::SelectReturn,
        StateKind::GenerateReport,
        StateKind::End,
    ];

    /// Targets an auto-continuation of this state may transition to.
    pub const fn auto_successors(self) -> &'static [StateKind] {
        match self {
            StateKind::GetCalls => &[StateKind::SelectCall],
            StateKind::GetCallUpdates => &[StateKind::SelectReturn],
            StateKind::GenerateReport => &[StateKind::End, StateKind::SelectOption],
            StateKind::End => &[StateKind::Start],
            StateKind::Start
            | StateKind::SelectOption
            | StateKind::SelectCall
            | StateKind::SelectReturn => &[],
        }
    }

    /// Builds a fresh instance of the state.
    pub fn instantiate(self) -> Arc<dyn ConversationState> {
        match self {
            StateKind::Start => Arc::new(StartState),
            StateKind::SelectOption => Arc::new(SelectOptionState),
            StateKind::GetCalls => Arc::new(GetCallsState),
            StateKind::SelectCall => Arc::new(SelectCallState),
            StateKind::GetCallUpdates => Arc::new(GetCallUpdatesState),
            StateKind::SelectReturn => Arc::new(SelectReturnState),
            StateKind::GenerateReport => Arc::new(GenerateReportState),
            StateKind::End => Arc::new(EndState),
        }
    }
}

impl StateMachine for StateKind {
    fn valid_transitions(&self) -> Vec<Self> {
        use StateKind::*;
        match self {
            Start => vec![SelectOption],
            SelectOption => vec![GetCalls, GenerateReport],
            GetCalls => vec![SelectCall],
            SelectCall => vec![GetCallUpdates],
            GetCallUpdates => vec![SelectReturn],
            SelectReturn => vec![SelectOption, End],
            GenerateReport => vec![End, SelectOption],
            End => vec![Start],
        }
    }
}

/// Transitive closure of the auto-continuation graph.
const fn auto_reachability() -> [[bool; StateKind::COUNT]; StateKind::COUNT] {
    const N: usize = StateKind::COUNT;
    let mut reach = [[false; N]; N];

    let mut i = 0;
    while i < N {
        let successors = StateKind::ALL[i].auto_successors();
        let mut s = 0;
        while s < successors.len() {
            reach[i][successors[s] as usize] = true;
            s += 1;
        }
        i += 1;
    }

    let mut k = 0;
    while k < N {
        let mut i = 0;
        while i < N {
            if reach[i][k] {
                let mut j = 0;
                while j < N {
                    if reach[k][j] {
                        reach[i][j] = true;
                    }
                    j += 1;
                }
            }
            i += 1;
        }
        k += 1;
    }
    reach
}

const fn auto_chain_is_acyclic() -> bool {
    let reach = auto_reachability();
    let mut i = 0;
    while i < StateKind::COUNT {
        if reach[i][i] {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    auto_chain_is_acyclic(),
    "auto-continuation graph must be acyclic"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_start() {
        assert_eq!(StateKind::default(), StateKind::Start);
    }

    #[test]
    fn all_lists_every_state_at_its_discriminant() {
        for (i, kind) in StateKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&StateKind::GetCallUpdates).unwrap();
        assert_eq!(json, "\"get_call_updates\"");
    }

    #[test]
    fn auto_successors_are_legal_transitions() {
        for kind in StateKind::ALL {
            for target in kind.auto_successors() {
                assert!(
                    kind.can_transition_to(target),
                    "{:?} -> {:?} is automatic but not a legal transition",
                    kind,
                    target
                );
            }
        }
    }

    #[test]
    fn no_state_is_terminal() {
        for kind in StateKind::ALL {
            assert!(!kind.is_terminal(), "{:?} should have an exit", kind);
        }
    }

    #[test]
    fn auto_graph_has_no_self_reachability() {
        let reach = auto_reachability();
        for kind in StateKind::ALL {
            assert!(!reach[kind as usize][kind as usize]);
        }
    }

    #[test]
    fn report_chain_reaches_start_through_end() {
        let reach = auto_reachability();
        let from = StateKind::GenerateReport as usize;
        assert!(reach[from][StateKind::End as usize]);
        assert!(reach[from][StateKind::Start as usize]);
        assert!(!reach[from][StateKind::GetCalls as usize]);
    }

    #[test]
    fn instantiate_returns_matching_kind() {
        for kind in StateKind::ALL {
            assert_eq!(kind.instantiate().kind(), kind);
        }
    }
}
