//! Record store contract consumed by the webhook and the summary engine,
//! plus an in-memory implementation.

use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use finbalance_core::{
    ExpenseRecord, GatewaySettings, IncomeRecord, MessageLogEntry, NewExpense, NewIncome,
    NewMessageLog, ParsedType, Profile,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
    #[error("store lock poisoned")]
    Poisoned,
    #[error("message log entry not found: {0}")]
    LogNotFound(String),
}

/// Filter for listing message-log history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogQuery {
    /// `Some(None)` selects unrecognized messages
    pub parsed_type: Option<Option<ParsedType>>,
    /// Case-insensitive match on the text, or substring of the phone
    pub search: Option<String>,
    pub limit: usize,
}

impl LogQuery {
    pub fn matches(&self, entry: &MessageLogEntry) -> bool {
        if let Some(t) = self.parsed_type {
            if entry.parsed_type != t {
                return false;
            }
        }
        match self.search.as_deref() {
            None | Some("") => true,
            Some(term) => {
                entry
                    .raw_message
                    .to_lowercase()
                    .contains(&term.to_lowercase())
                    || entry
                        .phone_number
                        .as_deref()
                        .is_some_and(|p| p.contains(term))
            }
        }
    }
}

/// Storage operations the core needs. Implementations synchronize
/// internally so one store can be shared across requests.
pub trait RecordStore: Send + Sync {
    /// Account linked to a phone number, if any.
    fn find_user_by_phone(&self, phone: &str) -> Result<Option<String>, StoreError>;

    fn gateway_settings(&self, user_id: &str) -> Result<Option<GatewaySettings>, StoreError>;

    /// Expenses dated within `[start, end]`, both inclusive.
    fn expenses_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, StoreError>;

    /// Incomes dated within `[start, end]`, both inclusive.
    fn incomes_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, StoreError>;

    fn insert_expense(&self, expense: NewExpense) -> Result<ExpenseRecord, StoreError>;

    fn insert_income(&self, income: NewIncome) -> Result<IncomeRecord, StoreError>;

    fn insert_message_log(&self, entry: NewMessageLog) -> Result<MessageLogEntry, StoreError>;

    /// Most recently created log entry for a phone number.
    fn latest_message_log(&self, phone: &str) -> Result<Option<MessageLogEntry>, StoreError>;

    fn set_response_sent(&self, log_id: &str, response: &str) -> Result<(), StoreError>;

    /// Newest first.
    fn message_logs(&self, query: &LogQuery) -> Result<Vec<MessageLogEntry>, StoreError>;

    fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError>;

    fn upsert_gateway_settings(&self, settings: GatewaySettings) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    profiles: Vec<Profile>,
    gateway_settings: Vec<GatewaySettings>,
    expenses: Vec<ExpenseRecord>,
    incomes: Vec<IncomeRecord>,
    message_log: Vec<MessageLogEntry>,
}

/// Vectors behind a mutex. Insertion order doubles as creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for MemoryStore {
    fn find_user_by_phone(&self, phone: &str) -> Result<Option<String>, StoreError> {
        let t = self.lock()?;
        Ok(t.profiles
            .iter()
            .find(|p| p.phone_number.as_deref() == Some(phone))
            .map(|p| p.user_id.clone()))
    }

    fn gateway_settings(&self, user_id: &str) -> Result<Option<GatewaySettings>, StoreError> {
        let t = self.lock()?;
        Ok(t.gateway_settings
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    fn expenses_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, StoreError> {
        let t = self.lock()?;
        Ok(t.expenses
            .iter()
            .filter(|e| e.user_id == user_id && e.date >= start && e.date <= end)
            .cloned()
            .collect())
    }

    fn incomes_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, StoreError> {
        let t = self.lock()?;
        Ok(t.incomes
            .iter()
            .filter(|i| i.user_id == user_id && i.date >= start && i.date <= end)
            .cloned()
            .collect())
    }

    fn insert_expense(&self, expense: NewExpense) -> Result<ExpenseRecord, StoreError> {
        let record = ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            user_id: expense.user_id,
            date: expense.date,
            description: expense.description,
            amount: expense.amount,
            category: expense.category,
            payment_method: expense.payment_method,
            source: expense.source,
            created_at: Utc::now(),
        };
        self.lock()?.expenses.push(record.clone());
        Ok(record)
    }

    fn insert_income(&self, income: NewIncome) -> Result<IncomeRecord, StoreError> {
        let record = IncomeRecord {
            id: Uuid::new_v4().to_string(),
            user_id: income.user_id,
            date: income.date,
            description: income.description,
            amount: income.amount,
            source: income.source,
            created_at: Utc::now(),
        };
        self.lock()?.incomes.push(record.clone());
        Ok(record)
    }

    fn insert_message_log(&self, entry: NewMessageLog) -> Result<MessageLogEntry, StoreError> {
        let record = MessageLogEntry {
            id: Uuid::new_v4().to_string(),
            user_id: entry.user_id,
            phone_number: entry.phone_number,
            raw_message: entry.raw_message,
            parsed_type: entry.parsed_type,
            parsed_data: entry.parsed_data,
            response_sent: None,
            created_at: Utc::now(),
        };
        self.lock()?.message_log.push(record.clone());
        Ok(record)
    }

    fn latest_message_log(&self, phone: &str) -> Result<Option<MessageLogEntry>, StoreError> {
        let t = self.lock()?;
        Ok(t.message_log
            .iter()
            .rev()
            .find(|e| e.phone_number.as_deref() == Some(phone))
            .cloned())
    }

    fn set_response_sent(&self, log_id: &str, response: &str) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        let entry = t
            .message_log
            .iter_mut()
            .find(|e| e.id == log_id)
            .ok_or_else(|| StoreError::LogNotFound(log_id.to_string()))?;
        entry.response_sent = Some(response.to_string());
        Ok(())
    }

    fn message_logs(&self, query: &LogQuery) -> Result<Vec<MessageLogEntry>, StoreError> {
        let t = self.lock()?;
        Ok(t.message_log
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        match t.profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
            Some(existing) => *existing = profile,
            None => t.profiles.push(profile),
        }
        Ok(())
    }

    fn upsert_gateway_settings(&self, settings: GatewaySettings) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        match t
            .gateway_settings
            .iter_mut()
            .find(|s| s.user_id == settings.user_id)
        {
            Some(existing) => *existing = settings,
            None => t.gateway_settings.push(settings),
        }
        Ok(())
    }
}
