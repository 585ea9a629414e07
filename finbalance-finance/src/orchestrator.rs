//! Webhook orchestration: payload → classification → persistence → reply.
//!
//! The log entry is written before any transaction insert. Store and gateway
//! failures never fail the request; they turn into a failure reply (for
//! transaction inserts) or a log line (everything else).

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use finbalance_core::{
    DataSource, GatewayCredentials, NewExpense, NewIncome, NewMessageLog, ParsedIntent,
    TransactionDraft,
};
use finbalance_ingest::{InboundMessage, WebhookPayload};
use tracing::{error, info, warn};

use crate::category_rules::FALLBACK_CATEGORY;
use crate::classifier::MessageClassifier;
use crate::gateway::OutboundGateway;
use crate::store::RecordStore;
use crate::summary::{FinancialSummaryEngine, brl};

pub const UNREGISTERED_NOTICE: &str =
    "⚠️ Número não cadastrado. Acesse o FinBalance AI para vincular seu WhatsApp.";
pub const EXPENSE_FAILED: &str = "❌ Erro ao registrar gasto. Tente novamente.";
pub const INCOME_FAILED: &str = "❌ Erro ao registrar ganho. Tente novamente.";

/// Values injected at construction instead of read from the environment
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    /// Used when the sender has no usable gateway settings of their own,
    /// including unregistered senders
    pub fallback_gateway: Option<GatewayCredentials>,
}

/// What the endpoint reports back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// The payload was a connectivity test
    Test,
    /// Nothing to classify
    NoMessage,
    Processed {
        parsed: ParsedIntent,
        reply: Option<String>,
    },
}

pub struct WebhookOrchestrator {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn OutboundGateway>,
    classifier: MessageClassifier,
    summary: FinancialSummaryEngine,
    settings: WebhookSettings,
}

impl WebhookOrchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn OutboundGateway>,
        settings: WebhookSettings,
    ) -> Result<Self> {
        Ok(Self {
            store,
            gateway,
            classifier: MessageClassifier::new()?,
            summary: FinancialSummaryEngine::new()?,
            settings,
        })
    }

    /// Process one webhook call. `today` dates new records and picks the
    /// month for question replies.
    pub async fn handle(&self, payload: &WebhookPayload, today: NaiveDate) -> WebhookOutcome {
        if payload.is_test() {
            info!("webhook test received");
            return WebhookOutcome::Test;
        }

        let Some(inbound) = payload.inbound() else {
            info!("no message content found in webhook");
            return WebhookOutcome::NoMessage;
        };

        let user_id = self.resolve_user(inbound.sender_phone.as_deref());
        let parsed = self.classifier.classify(&inbound.text);
        info!(
            phone = inbound.sender_phone.as_deref().unwrap_or("-"),
            registered = user_id.is_some(),
            parsed_type = ?parsed.parsed_type(),
            "message classified"
        );

        if let Err(e) = self.store.insert_message_log(NewMessageLog::new(
            user_id.clone(),
            inbound.sender_phone.clone(),
            inbound.text.as_str(),
            &parsed,
        )) {
            error!(error = %e, "failed to log message");
        }

        let reply = self.build_reply(&parsed, user_id.as_deref(), &inbound, today);

        if let Some(text) = reply.as_deref() {
            if let (Some(phone), Some(instance)) =
                (inbound.sender_phone.as_deref(), inbound.instance_id.as_deref())
            {
                self.deliver(user_id.as_deref(), phone, instance, text).await;
            }
        }

        WebhookOutcome::Processed { parsed, reply }
    }

    fn resolve_user(&self, phone: Option<&str>) -> Option<String> {
        let phone = phone?;
        match self.store.find_user_by_phone(phone) {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!(phone, error = %e, "profile lookup failed; treating sender as unregistered");
                None
            }
        }
    }

    fn build_reply(
        &self,
        parsed: &ParsedIntent,
        user_id: Option<&str>,
        inbound: &InboundMessage,
        today: NaiveDate,
    ) -> Option<String> {
        let Some(user_id) = user_id else {
            return Some(UNREGISTERED_NOTICE.to_string());
        };

        match parsed {
            ParsedIntent::Expense(draft) => Some(self.record_expense(user_id, draft, today)),
            ParsedIntent::Income(draft) => Some(self.record_income(user_id, draft, today)),
            ParsedIntent::Question => Some(self.summary.answer(
                self.store.as_ref(),
                user_id,
                &inbound.text,
                today,
            )),
            ParsedIntent::Unknown => None,
        }
    }

    fn record_expense(&self, user_id: &str, draft: &TransactionDraft, today: NaiveDate) -> String {
        let expense = NewExpense {
            user_id: user_id.to_string(),
            date: today,
            description: draft.description.clone(),
            amount: draft.amount,
            category: draft.category.unwrap_or(FALLBACK_CATEGORY),
            payment_method: draft.payment_method.unwrap_or_default(),
            source: DataSource::Whatsapp,
        };
        match self.store.insert_expense(expense) {
            Ok(record) => {
                info!(user_id, id = %record.id, amount = record.amount, "expense recorded");
                format!(
                    "✅ Gasto registrado!\n💸 {}: {}",
                    draft.description,
                    brl(draft.amount)
                )
            }
            Err(e) => {
                error!(user_id, error = %e, "failed to insert expense");
                EXPENSE_FAILED.to_string()
            }
        }
    }

    fn record_income(&self, user_id: &str, draft: &TransactionDraft, today: NaiveDate) -> String {
        let income = NewIncome {
            user_id: user_id.to_string(),
            date: today,
            description: draft.description.clone(),
            amount: draft.amount,
            source: DataSource::Whatsapp,
        };
        match self.store.insert_income(income) {
            Ok(record) => {
                info!(user_id, id = %record.id, amount = record.amount, "income recorded");
                format!(
                    "✅ Ganho registrado!\n💰 {}: {}",
                    draft.description,
                    brl(draft.amount)
                )
            }
            Err(e) => {
                error!(user_id, error = %e, "failed to insert income");
                INCOME_FAILED.to_string()
            }
        }
    }

    fn credentials(&self, user_id: Option<&str>, instance: &str) -> Option<GatewayCredentials> {
        let own = user_id.and_then(|uid| match self.store.gateway_settings(uid) {
            Ok(settings) => settings.and_then(|s| s.credentials(instance)),
            Err(e) => {
                warn!(user_id = uid, error = %e, "failed to load gateway settings");
                None
            }
        });
        own.or_else(|| self.settings.fallback_gateway.clone())
    }

    /// Best-effort send, then stamp the reply on the sender's latest log entry.
    async fn deliver(&self, user_id: Option<&str>, phone: &str, instance: &str, text: &str) {
        match self.credentials(user_id, instance) {
            Some(creds) => match self.gateway.send_text(&creds, phone, text).await {
                Ok(()) => info!(phone, instance = %creds.instance_name, "reply sent"),
                Err(e) => error!(phone, error = %e, "failed to send reply"),
            },
            None => info!(phone, "gateway settings not configured; reply not sent"),
        }

        match self.store.latest_message_log(phone) {
            Ok(Some(entry)) => {
                if let Err(e) = self.store.set_response_sent(&entry.id, text) {
                    error!(phone, error = %e, "failed to record reply on message log");
                }
            }
            Ok(None) => warn!(phone, "no message log entry to attach reply to"),
            Err(e) => error!(phone, error = %e, "failed to load latest message log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::store::{LogQuery, MemoryStore, StoreError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use finbalance_core::{
        ExpenseCategory, ExpenseRecord, GatewaySettings, IncomeRecord, MessageLogEntry,
        ParsedType, PaymentMethod, Profile,
    };
    use serde_json::json;
    use std::sync::Mutex;

    const PHONE: &str = "5511987654321";

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<(GatewayCredentials, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl OutboundGateway for RecordingGateway {
        async fn send_text(
            &self,
            credentials: &GatewayCredentials,
            number: &str,
            text: &str,
        ) -> Result<(), GatewayError> {
            self.sent
                .lock()
                .unwrap()
                .push((credentials.clone(), number.to_string(), text.to_string()));
            if self.fail {
                return Err(GatewayError::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "down".to_string(),
                });
            }
            Ok(())
        }
    }

    /// MemoryStore whose writes can be made to fail. Every write call is
    /// recorded by name, in order.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_transactions: bool,
        fail_log: bool,
        writes: Mutex<Vec<&'static str>>,
    }

    impl FlakyStore {
        fn record(&self, call: &'static str) {
            self.writes.lock().unwrap().push(call);
        }

        fn take_writes(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.writes.lock().unwrap())
        }
    }

    impl RecordStore for FlakyStore {
        fn find_user_by_phone(&self, phone: &str) -> Result<Option<String>, StoreError> {
            self.inner.find_user_by_phone(phone)
        }
        fn gateway_settings(&self, user_id: &str) -> Result<Option<GatewaySettings>, StoreError> {
            self.inner.gateway_settings(user_id)
        }
        fn expenses_between(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<ExpenseRecord>, StoreError> {
            self.inner.expenses_between(user_id, start, end)
        }
        fn incomes_between(&self, user_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<IncomeRecord>, StoreError> {
            self.inner.incomes_between(user_id, start, end)
        }
        fn insert_expense(&self, expense: NewExpense) -> Result<ExpenseRecord, StoreError> {
            self.record("insert_expense");
            if self.fail_transactions {
                return Err(StoreError::Poisoned);
            }
            self.inner.insert_expense(expense)
        }
        fn insert_income(&self, income: NewIncome) -> Result<IncomeRecord, StoreError> {
            self.record("insert_income");
            if self.fail_transactions {
                return Err(StoreError::Poisoned);
            }
            self.inner.insert_income(income)
        }
        fn insert_message_log(&self, entry: NewMessageLog) -> Result<MessageLogEntry, StoreError> {
            self.record("insert_message_log");
            if self.fail_log {
                return Err(StoreError::Poisoned);
            }
            self.inner.insert_message_log(entry)
        }
        fn latest_message_log(&self, phone: &str) -> Result<Option<MessageLogEntry>, StoreError> {
            self.inner.latest_message_log(phone)
        }
        fn set_response_sent(&self, log_id: &str, response: &str) -> Result<(), StoreError> {
            self.record("set_response_sent");
            self.inner.set_response_sent(log_id, response)
        }
        fn message_logs(&self, query: &LogQuery) -> Result<Vec<MessageLogEntry>, StoreError> {
            self.inner.message_logs(query)
        }
        fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
            self.inner.upsert_profile(profile)
        }
        fn upsert_gateway_settings(&self, settings: GatewaySettings) -> Result<(), StoreError> {
            self.inner.upsert_gateway_settings(settings)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn register(store: &dyn RecordStore, with_settings: bool) {
        store
            .upsert_profile(Profile {
                user_id: "u-1".to_string(),
                phone_number: Some(PHONE.to_string()),
                full_name: Some("Ana".to_string()),
            })
            .unwrap();
        if with_settings {
            store
                .upsert_gateway_settings(GatewaySettings {
                    user_id: "u-1".to_string(),
                    api_url: Some("http://evo.local".to_string()),
                    api_key: Some("user-key".to_string()),
                    instance_name: Some("ana-instance".to_string()),
                })
                .unwrap();
        }
    }

    fn payload(text: &str) -> WebhookPayload {
        serde_json::from_value(json!({
            "instance": "payload-instance",
            "data": {
                "key": { "remoteJid": format!("{PHONE}@s.whatsapp.net") },
                "message": { "conversation": text }
            }
        }))
        .unwrap()
    }

    fn build(
        store: Arc<dyn RecordStore>,
        gateway: Arc<RecordingGateway>,
        settings: WebhookSettings,
    ) -> WebhookOrchestrator {
        WebhookOrchestrator::new(store, gateway, settings).unwrap()
    }

    fn all_logs(store: &dyn RecordStore) -> Vec<MessageLogEntry> {
        store
            .message_logs(&LogQuery { limit: 100, ..Default::default() })
            .unwrap()
    }

    #[tokio::test]
    async fn test_test_flag_skips_store() {
        let store = Arc::new(MemoryStore::new());
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let p: WebhookPayload = serde_json::from_value(json!({ "test": true })).unwrap();
        assert_eq!(orch.handle(&p, today()).await, WebhookOutcome::Test);
        assert!(all_logs(store.as_ref()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_text_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());
        let p: WebhookPayload = serde_json::from_value(json!({ "data": { "message": {} } })).unwrap();
        assert_eq!(orch.handle(&p, today()).await, WebhookOutcome::NoMessage);
        assert!(all_logs(store.as_ref()).is_empty());
    }

    #[tokio::test]
    async fn test_expense_recorded_and_replied() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let outcome = orch.handle(&payload("gastei 50 no mercado"), today()).await;
        let expected_reply = "✅ Gasto registrado!\n💸 mercado: R$ 50.00";
        match &outcome {
            WebhookOutcome::Processed { parsed, reply } => {
                assert_eq!(parsed.parsed_type(), Some(ParsedType::Gasto));
                assert_eq!(reply.as_deref(), Some(expected_reply));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let expenses = store.expenses_between("u-1", today(), today()).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].category, ExpenseCategory::Alimentacao);
        assert_eq!(expenses[0].payment_method, PaymentMethod::Debito);
        assert_eq!(expenses[0].source, DataSource::Whatsapp);

        let sent = gw.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.api_key, "user-key");
        assert_eq!(sent[0].0.instance_name, "ana-instance");
        assert_eq!(sent[0].1, PHONE);
        assert_eq!(sent[0].2, expected_reply);

        let logs = all_logs(store.as_ref());
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user_id.as_deref(), Some("u-1"));
        assert_eq!(logs[0].parsed_data.as_ref().unwrap().description, "mercado");
        assert_eq!(logs[0].response_sent.as_deref(), Some(expected_reply));
    }

    #[tokio::test]
    async fn test_income_recorded() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());

        let outcome = orch.handle(&payload("recebi 1000 de salário"), today()).await;
        assert_eq!(
            outcome,
            WebhookOutcome::Processed {
                parsed: ParsedIntent::Income(TransactionDraft::income("salário", 1000.0)),
                reply: Some("✅ Ganho registrado!\n💰 salário: R$ 1000.00".to_string()),
            }
        );
        let incomes = store.incomes_between("u-1", today(), today()).unwrap();
        assert_eq!(incomes[0].source, DataSource::Whatsapp);
    }

    #[tokio::test]
    async fn test_confirmation_rounds_half_cent_up() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());

        let WebhookOutcome::Processed { reply, .. } =
            orch.handle(&payload("gastei 1,125 no mercado"), today()).await
        else {
            panic!("expected processed outcome");
        };
        assert_eq!(reply.as_deref(), Some("✅ Gasto registrado!\n💸 mercado: R$ 1.13"));
    }

    #[tokio::test]
    async fn test_question_uses_summary() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());

        orch.handle(&payload("recebi 1000 de salário"), today()).await;
        orch.handle(&payload("gastei 300 no mercado"), today()).await;
        let outcome = orch.handle(&payload("qual meu saldo?"), today()).await;

        let WebhookOutcome::Processed { parsed, reply } = outcome else {
            panic!("expected processed outcome");
        };
        assert_eq!(parsed, ParsedIntent::Question);
        assert!(reply.unwrap().ends_with("✅ Saldo: R$ 700.00"));

        let logs = all_logs(store.as_ref());
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].parsed_type, Some(ParsedType::Pergunta));
        assert!(logs[0].parsed_data.is_none());
    }

    #[tokio::test]
    async fn test_unregistered_sender_gets_notice_without_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let outcome = orch.handle(&payload("gastei 50 no mercado"), today()).await;
        let WebhookOutcome::Processed { parsed, reply } = outcome else {
            panic!("expected processed outcome");
        };
        assert_eq!(parsed.parsed_type(), Some(ParsedType::Gasto));
        assert_eq!(reply.as_deref(), Some(UNREGISTERED_NOTICE));

        // nothing recorded, nothing sent, but the log keeps the reply text
        assert!(gw.sent.lock().unwrap().is_empty());
        let logs = all_logs(store.as_ref());
        assert_eq!(logs[0].user_id, None);
        assert_eq!(logs[0].response_sent.as_deref(), Some(UNREGISTERED_NOTICE));
    }

    #[tokio::test]
    async fn test_unregistered_unknown_still_gets_notice_via_fallback() {
        let store = Arc::new(MemoryStore::new());
        let gw = Arc::new(RecordingGateway::default());
        let settings = WebhookSettings {
            fallback_gateway: Some(GatewayCredentials {
                base_url: "http://fallback".to_string(),
                api_key: "fallback-key".to_string(),
                instance_name: "main".to_string(),
            }),
        };
        let orch = build(store.clone(), gw.clone(), settings);

        let outcome = orch.handle(&payload("oi, bom dia"), today()).await;
        assert_eq!(
            outcome,
            WebhookOutcome::Processed {
                parsed: ParsedIntent::Unknown,
                reply: Some(UNREGISTERED_NOTICE.to_string()),
            }
        );
        let sent = gw.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.api_key, "fallback-key");
    }

    #[tokio::test]
    async fn test_unknown_from_registered_user_has_no_reply() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let outcome = orch.handle(&payload("oi, bom dia"), today()).await;
        assert_eq!(
            outcome,
            WebhookOutcome::Processed { parsed: ParsedIntent::Unknown, reply: None }
        );
        assert!(gw.sent.lock().unwrap().is_empty());
        assert_eq!(all_logs(store.as_ref())[0].response_sent, None);
    }

    #[tokio::test]
    async fn test_insert_failure_becomes_failure_reply() {
        let store = Arc::new(FlakyStore { fail_transactions: true, ..Default::default() });
        register(store.as_ref(), true);
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());

        let WebhookOutcome::Processed { reply, .. } =
            orch.handle(&payload("gastei 50 no mercado"), today()).await
        else {
            panic!("expected processed outcome");
        };
        assert_eq!(reply.as_deref(), Some(EXPENSE_FAILED));

        let WebhookOutcome::Processed { reply, .. } =
            orch.handle(&payload("recebi 10 de pix"), today()).await
        else {
            panic!("expected processed outcome");
        };
        assert_eq!(reply.as_deref(), Some(INCOME_FAILED));

        // the audit log is still written
        assert_eq!(all_logs(store.as_ref()).len(), 2);
    }

    #[tokio::test]
    async fn test_log_written_before_transaction() {
        let store = Arc::new(FlakyStore::default());
        register(store.as_ref(), true);
        let orch = build(store.clone(), Arc::new(RecordingGateway::default()), WebhookSettings::default());

        orch.handle(&payload("gastei 50 no mercado"), today()).await;
        assert_eq!(
            store.take_writes(),
            ["insert_message_log", "insert_expense", "set_response_sent"]
        );

        orch.handle(&payload("recebi 1000 de salário"), today()).await;
        assert_eq!(
            store.take_writes(),
            ["insert_message_log", "insert_income", "set_response_sent"]
        );

        orch.handle(&payload("qual meu saldo?"), today()).await;
        assert_eq!(store.take_writes(), ["insert_message_log", "set_response_sent"]);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_block_processing() {
        let store = Arc::new(FlakyStore { fail_log: true, ..Default::default() });
        register(store.as_ref(), true);
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let WebhookOutcome::Processed { reply, .. } =
            orch.handle(&payload("gastei 50 no mercado"), today()).await
        else {
            panic!("expected processed outcome");
        };
        assert!(reply.unwrap().starts_with("✅ Gasto registrado!"));
        assert_eq!(store.expenses_between("u-1", today(), today()).unwrap().len(), 1);
        assert_eq!(gw.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let gw = Arc::new(RecordingGateway { fail: true, ..Default::default() });
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let outcome = orch.handle(&payload("gastei 50 no mercado"), today()).await;
        assert!(matches!(outcome, WebhookOutcome::Processed { reply: Some(_), .. }));
        assert!(all_logs(store.as_ref())[0].response_sent.is_some());
    }

    #[tokio::test]
    async fn test_no_instance_means_no_dispatch() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), true);
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        let p: WebhookPayload = serde_json::from_value(json!({
            "data": {
                "key": { "remoteJid": format!("{PHONE}@s.whatsapp.net") },
                "message": { "conversation": "gastei 50 no mercado" }
            }
        }))
        .unwrap();
        let outcome = orch.handle(&p, today()).await;
        assert!(matches!(outcome, WebhookOutcome::Processed { reply: Some(_), .. }));
        assert!(gw.sent.lock().unwrap().is_empty());
        assert_eq!(all_logs(store.as_ref())[0].response_sent, None);
    }

    #[tokio::test]
    async fn test_payload_instance_fills_missing_settings_instance() {
        let store = Arc::new(MemoryStore::new());
        register(store.as_ref(), false);
        store
            .upsert_gateway_settings(GatewaySettings {
                user_id: "u-1".to_string(),
                api_url: Some("http://evo.local".to_string()),
                api_key: Some("user-key".to_string()),
                instance_name: None,
            })
            .unwrap();
        let gw = Arc::new(RecordingGateway::default());
        let orch = build(store.clone(), gw.clone(), WebhookSettings::default());

        orch.handle(&payload("qual meu saldo?"), today()).await;
        assert_eq!(gw.sent.lock().unwrap()[0].0.instance_name, "payload-instance");
    }
}
