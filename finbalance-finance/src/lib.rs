//! finbalance-finance: message classification, category rules, record
//! stores, monthly summaries, outbound gateway, and the webhook orchestrator

pub mod category_rules;
pub mod classifier;
pub mod gateway;
pub mod orchestrator;
pub mod sqlite_store;
pub mod store;
pub mod summary;

pub use category_rules::{categorize, detect_payment_method};
pub use classifier::{MessageClassifier, is_question};
pub use gateway::{EvolutionGateway, GatewayError, OutboundGateway};
pub use orchestrator::{WebhookOrchestrator, WebhookOutcome, WebhookSettings};
pub use sqlite_store::SqliteStore;
pub use store::{LogQuery, MemoryStore, RecordStore, StoreError};
pub use summary::{FinancialSummaryEngine, HealthStatus, MonthlyTotals, ReportKind};
