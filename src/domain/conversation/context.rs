//! Per-conversation session object.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::foundation::{ChannelAddress, ContractId, TicketId, Timestamp};

use super::{
    ConversationError, ConversationState, MessageBatch, Session, StartState, StateKind, Turn,
    TurnServices,
};

/// How a turn collects auto-continuation output.
///
/// `Authoritative` trusts the batch returned through the transitions.
/// `ReplayActive` additionally re-runs the continuation of whichever state
/// is active once `handle` returns, which duplicates prompts the way older
/// deployments did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationMode {
    #[default]
    Authoritative,
    ReplayActive,
}

/// One conversation: its identity, reply address, active state and selections.
#[derive(Debug)]
pub struct ConversationContext {
    identity: ChannelAddress,
    reply_from: ChannelAddress,
    state: Arc<dyn ConversationState>,
    session: Session,
    mode: ContinuationMode,
    last_activity: Timestamp,
    last_trail: Vec<StateKind>,
    turns: u64,
}

impl ConversationContext {
    /// Creates a conversation in the `Start` state.
    pub fn new(identity: ChannelAddress, reply_from: ChannelAddress, mode: ContinuationMode) -> Self {
        Self {
            identity,
            reply_from,
            state: Arc::new(StartState),
            session: Session::default(),
            mode,
            last_activity: Timestamp::now(),
            last_trail: Vec::new(),
            turns: 0,
        }
    }

    /// Processes one inbound message and returns every reply it produced.
    ///
    /// On error the context is left exactly as it was before the call.
    pub async fn request(
        &mut self,
        services: &TurnServices,
        message: &str,
    ) -> Result<MessageBatch, ConversationError> {
        self.last_activity = Timestamp::now();

        let mut turn = Turn::new(services, self.session.clone(), Arc::clone(&self.state));
        let mut batch = self.state.handle(&mut turn, message).await?;

        if self.mode == ContinuationMode::ReplayActive {
            let active = turn.active_state();
            if let Some(continuable) = active.as_continuable() {
                batch.extend(continuable.auto_respond(&mut turn).await?);
            }
        }

        let outcome = turn.finish();
        self.session = outcome.session;
        self.state = outcome.state;
        self.last_trail = outcome.trail;
        self.turns += 1;

        tracing::debug!(
            conversation = %self.identity,
            state = ?self.state.kind(),
            messages = batch.len(),
            "turn complete"
        );
        Ok(batch)
    }

    pub fn identity(&self) -> &ChannelAddress {
        &self.identity
    }

    pub fn reply_from(&self) -> &ChannelAddress {
        &self.reply_from
    }

    /// Updates the address replies are sent from.
    pub fn set_reply_from(&mut self, reply_from: ChannelAddress) {
        self.reply_from = reply_from;
    }

    pub fn state_kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn contract_id(&self) -> Option<ContractId> {
        self.session.contract_id()
    }

    pub fn call_number(&self) -> Option<TicketId> {
        self.session.call_number()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// States entered during the most recent successful turn, in order.
    pub fn last_trail(&self) -> &[StateKind] {
        &self.last_trail
    }

    /// Number of successful turns.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn mode(&self) -> ContinuationMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{Contract, Ticket};
    use crate::domain::conversation::script;
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::{
        ContractRepository, ReportArtifact, ReportError, ReportFormat, ReportGenerator,
        ReportRequest,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::sync::Mutex;

    // ─────────────────────────────────────────────────────────────────────
    // Test doubles
    // ─────────────────────────────────────────────────────────────────────

    struct MockContracts {
        contracts: Vec<Contract>,
        tickets: Vec<Ticket>,
        fail: bool,
    }

    impl MockContracts {
        fn with_tickets(tickets: Vec<Ticket>) -> Self {
            Self {
                contracts: vec![Contract::new(ContractId::new(1), "CT-1001")],
                tickets,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                contracts: vec![],
                tickets: vec![],
                fail: true,
            }
        }

        fn check(&self) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::new(ErrorCode::DatabaseError, "db down"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ContractRepository for MockContracts {
        async fn find_contract_by_number(
            &self,
            number: &str,
        ) -> Result<Option<Contract>, DomainError> {
            self.check()?;
            Ok(self
                .contracts
                .iter()
                .find(|c| c.contract_number == number)
                .cloned())
        }

        async fn list_tickets(&self, contract_id: ContractId) -> Result<Vec<Ticket>, DomainError> {
            self.check()?;
            Ok(self
                .tickets
                .iter()
                .filter(|t| t.contract_id == contract_id)
                .cloned()
                .collect())
        }

        async fn find_ticket(
            &self,
            contract_id: ContractId,
            ticket_id: TicketId,
        ) -> Result<Option<Ticket>, DomainError> {
            self.check()?;
            Ok(self
                .tickets
                .iter()
                .find(|t| t.contract_id == contract_id && t.id == ticket_id)
                .cloned())
        }
    }

    struct MockReports {
        requests: Mutex<Vec<ReportRequest>>,
    }

    impl MockReports {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReportGenerator for MockReports {
        async fn generate(&self, request: &ReportRequest) -> Result<ReportArtifact, ReportError> {
            self.requests.lock().unwrap().push(request.clone());
            if request.tickets.is_empty() {
                return Err(ReportError::NoData);
            }
            Ok(ReportArtifact {
                file_name: "report_1_abc.pdf".to_string(),
                format: ReportFormat::Pdf,
                download_url: "https://desk.example.com/reports/report_1_abc.pdf".to_string(),
                checksum: String::new(),
            })
        }
    }

    fn ticket(id: i64, description: &str) -> Ticket {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap());
        Ticket {
            id: TicketId::new(id),
            contract_id: ContractId::new(1),
            description: description.to_string(),
            opened_at: at,
            updated_at: at,
            last_update: "Em andamento".to_string(),
        }
    }

    fn services(contracts: MockContracts) -> TurnServices {
        TurnServices::new(Arc::new(contracts), Arc::new(MockReports::new()))
    }

    fn context(mode: ContinuationMode) -> ConversationContext {
        ConversationContext::new(
            ChannelAddress::new("+5511999990000").unwrap(),
            ChannelAddress::new("+5511333330000").unwrap(),
            mode,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Start
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn greeting_yields_welcome_without_transition() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);

        let batch = ctx.request(&services, "oi").await.unwrap();

        assert_eq!(batch.bodies(), vec![script::WELCOME]);
        assert_eq!(ctx.state_kind(), StateKind::Start);
        assert!(ctx.last_trail().is_empty());
    }

    #[tokio::test]
    async fn known_contract_confirms_then_prompts_menu() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);

        let batch = ctx.request(&services, "CT-1001").await.unwrap();

        assert_eq!(
            batch.bodies(),
            vec![script::CONTRACT_VERIFIED, script::MAIN_MENU]
        );
        assert_eq!(ctx.state_kind(), StateKind::SelectOption);
        assert_eq!(ctx.contract_id(), Some(ContractId::new(1)));
    }

    #[tokio::test]
    async fn contract_lookup_is_case_sensitive() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);

        let batch = ctx.request(&services, "ct-1001").await.unwrap();

        assert_eq!(batch.bodies(), vec![script::CONTRACT_NOT_FOUND]);
        assert_eq!(ctx.state_kind(), StateKind::Start);
        assert_eq!(ctx.contract_id(), None);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ticket listing and selection
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn option_one_without_tickets_lands_in_select_call() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();

        let batch = ctx.request(&services, "1").await.unwrap();

        assert_eq!(
            batch.bodies(),
            vec![
                script::FETCHING_TICKETS,
                script::NO_TICKETS,
                script::ASK_TICKET_NUMBER
            ]
        );
        assert_eq!(ctx.state_kind(), StateKind::SelectCall);
        assert_eq!(
            ctx.last_trail(),
            &[StateKind::GetCalls, StateKind::SelectCall]
        );
    }

    #[tokio::test]
    async fn option_one_lists_tickets() {
        let services = services(MockContracts::with_tickets(vec![
            ticket(12, "Impressora"),
            ticket(7, "Rede"),
        ]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();

        let batch = ctx.request(&services, "1").await.unwrap();

        assert_eq!(batch.bodies()[1], "12: Impressora\n7: Rede");
    }

    #[tokio::test]
    async fn non_integer_ticket_number_keeps_select_call() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();
        ctx.request(&services, "1").await.unwrap();

        let batch = ctx.request(&services, "doze").await.unwrap();

        assert_eq!(batch.bodies(), vec![script::INVALID_TICKET_NUMBER]);
        assert_eq!(ctx.state_kind(), StateKind::SelectCall);
        assert_eq!(ctx.call_number(), None);
    }

    #[tokio::test]
    async fn ticket_number_shows_updates_and_return_options() {
        let services = services(MockContracts::with_tickets(vec![ticket(12, "Impressora")]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();
        ctx.request(&services, "1").await.unwrap();

        let batch = ctx.request(&services, "12").await.unwrap();

        let bodies = batch.bodies();
        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[0], script::TICKET_ACCEPTED);
        assert!(bodies[1].starts_with("Últimas atualizações do chamado 12: Chamado 12: Impressora"));
        assert_eq!(bodies[2], script::RETURN_OPTIONS);
        assert_eq!(ctx.state_kind(), StateKind::SelectReturn);
        assert_eq!(ctx.call_number(), Some(TicketId::new(12)));
    }

    #[tokio::test]
    async fn unknown_ticket_number_reports_not_found() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();
        ctx.request(&services, "1").await.unwrap();

        let batch = ctx.request(&services, "99").await.unwrap();

        assert_eq!(batch.bodies()[1], script::ticket_not_found(99));
        assert_eq!(ctx.state_kind(), StateKind::SelectReturn);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Return menu and ending
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn return_to_menu_prompts_menu_once() {
        let services = services(MockContracts::with_tickets(vec![ticket(12, "Impressora")]));
        let mut ctx = context(ContinuationMode::Authoritative);
        for input in ["CT-1001", "1", "12"] {
            ctx.request(&services, input).await.unwrap();
        }

        let batch = ctx.request(&services, "1").await.unwrap();

        assert_eq!(
            batch.bodies(),
            vec![script::RETURNING_TO_MENU, script::MAIN_MENU]
        );
        assert_eq!(ctx.state_kind(), StateKind::SelectOption);
    }

    #[tokio::test]
    async fn ending_passes_through_end_and_resets() {
        let services = services(MockContracts::with_tickets(vec![ticket(12, "Impressora")]));
        let mut ctx = context(ContinuationMode::Authoritative);
        for input in ["CT-1001", "1", "12"] {
            ctx.request(&services, input).await.unwrap();
        }

        let batch = ctx.request(&services, "2").await.unwrap();

        assert_eq!(batch.bodies(), vec![script::CLOSING_SESSION]);
        assert_eq!(ctx.last_trail(), &[StateKind::End, StateKind::Start]);
        assert_eq!(ctx.state_kind(), StateKind::Start);
        assert_eq!(ctx.contract_id(), None);
        assert_eq!(ctx.call_number(), None);

        let batch = ctx.request(&services, "oi").await.unwrap();
        assert_eq!(batch.bodies(), vec![script::WELCOME]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn report_replies_with_link_and_ends_session() {
        let services = services(MockContracts::with_tickets(vec![ticket(12, "Impressora")]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();

        let batch = ctx.request(&services, "2").await.unwrap();

        let messages: Vec<_> = batch.iter().collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0]
            .body
            .ends_with("https://desk.example.com/reports/report_1_abc.pdf"));
        assert_eq!(
            messages[0].media_url.as_deref(),
            Some("https://desk.example.com/reports/report_1_abc.pdf")
        );
        assert_eq!(
            ctx.last_trail(),
            &[StateKind::GenerateReport, StateKind::End, StateKind::Start]
        );
        assert_eq!(ctx.state_kind(), StateKind::Start);
    }

    #[tokio::test]
    async fn report_without_tickets_returns_to_menu() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&services, "CT-1001").await.unwrap();

        let batch = ctx.request(&services, "2").await.unwrap();

        assert_eq!(
            batch.bodies(),
            vec![script::NO_REPORT_DATA, script::MAIN_MENU]
        );
        assert_eq!(ctx.state_kind(), StateKind::SelectOption);
        assert_eq!(ctx.contract_id(), Some(ContractId::new(1)));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Continuation modes and failure atomicity
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn replay_active_repeats_active_continuation() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::ReplayActive);

        let batch = ctx.request(&services, "CT-1001").await.unwrap();

        assert_eq!(
            batch.bodies(),
            vec![script::CONTRACT_VERIFIED, script::MAIN_MENU, script::MAIN_MENU]
        );
    }

    #[tokio::test]
    async fn replay_active_adds_nothing_for_input_states() {
        let services = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::ReplayActive);
        ctx.request(&services, "CT-1001").await.unwrap();

        let batch = ctx.request(&services, "1").await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(ctx.state_kind(), StateKind::SelectCall);
    }

    #[tokio::test]
    async fn failed_turn_leaves_context_untouched() {
        let services = services(MockContracts::failing());
        let mut ctx = context(ContinuationMode::Authoritative);

        let result = ctx.request(&services, "CT-1001").await;

        assert!(matches!(result, Err(ConversationError::Repository(_))));
        assert_eq!(ctx.state_kind(), StateKind::Start);
        assert_eq!(ctx.turns(), 0);
    }

    #[tokio::test]
    async fn failure_mid_chain_does_not_commit_selection() {
        let ok = services(MockContracts::with_tickets(vec![]));
        let mut ctx = context(ContinuationMode::Authoritative);
        ctx.request(&ok, "CT-1001").await.unwrap();
        ctx.request(&ok, "1").await.unwrap();

        let broken = services(MockContracts::failing());
        let result = ctx.request(&broken, "12").await;

        assert!(result.is_err());
        assert_eq!(ctx.state_kind(), StateKind::SelectCall);
        assert_eq!(ctx.call_number(), None);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invalid input never mutates the context
    // ─────────────────────────────────────────────────────────────────────

    async fn context_in(kind: StateKind, services: &TurnServices) -> ConversationContext {
        let mut ctx = context(ContinuationMode::Authoritative);
        let path: &[&str] = match kind {
            StateKind::Start => &[],
            StateKind::SelectOption => &["CT-1001"],
            StateKind::SelectCall => &["CT-1001", "1"],
            StateKind::SelectReturn => &["CT-1001", "1", "12"],
            other => panic!("{:?} is never active between turns", other),
        };
        for input in path {
            ctx.request(services, input).await.unwrap();
        }
        assert_eq!(ctx.state_kind(), kind);
        ctx
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invalid_input_is_idempotent(input in "[a-z ]{1,12}", repeats in 1usize..4) {
            prop_assume!(!script::is_greeting(&input));
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let services = services(MockContracts::with_tickets(vec![ticket(12, "Impressora")]));
                for kind in [StateKind::Start, StateKind::SelectOption, StateKind::SelectCall, StateKind::SelectReturn] {
                    let mut ctx = context_in(kind, &services).await;
                    let before = ctx.session().clone();
                    for _ in 0..repeats {
                        let batch = ctx.request(&services, &input).await.unwrap();
                        assert_eq!(batch.len(), 1);
                    }
                    assert_eq!(ctx.state_kind(), kind);
                    assert_eq!(ctx.session(), &before);
                }
            });
        }
    }
}
