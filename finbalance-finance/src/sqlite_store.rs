//! SQLite-backed record store.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use finbalance_core::{
    ExpenseRecord, GatewaySettings, IncomeRecord, MessageLogEntry, NewExpense, NewIncome,
    NewMessageLog, ParsedType, Profile, TransactionDraft,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::warn;
use uuid::Uuid;

use crate::store::{LogQuery, RecordStore, StoreError};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    phone_number TEXT,
    full_name TEXT
);
CREATE INDEX IF NOT EXISTS idx_profiles_phone ON profiles(phone_number);

CREATE TABLE IF NOT EXISTS gateway_settings (
    user_id TEXT PRIMARY KEY,
    api_url TEXT,
    api_key TEXT,
    instance_name TEXT
);

CREATE TABLE IF NOT EXISTS expenses (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL DEFAULT 'Outros',
    payment_method TEXT NOT NULL DEFAULT 'débito',
    source TEXT NOT NULL DEFAULT 'manual',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);

CREATE TABLE IF NOT EXISTS incomes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    source TEXT NOT NULL DEFAULT 'manual',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_incomes_user_date ON incomes(user_id, date);

CREATE TABLE IF NOT EXISTS message_log (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    phone_number TEXT,
    raw_message TEXT NOT NULL,
    parsed_type TEXT,
    parsed_data TEXT,
    response_sent TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_message_log_phone ON message_log(phone_number, created_at);
";

const EXPENSE_COLUMNS: &str =
    "id, user_id, date, description, amount, category, payment_method, source, created_at";
const INCOME_COLUMNS: &str = "id, user_id, date, description, amount, source, created_at";
const LOG_COLUMNS: &str =
    "id, user_id, phone_number, raw_message, parsed_type, parsed_data, response_sent, created_at";

/// One connection behind a mutex; statements are short.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(column, value))
}

fn parse_date(column: &'static str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid(column, value))
}

fn parse_label<T: FromStr>(column: &'static str, value: &str) -> Result<T, StoreError> {
    value.parse().map_err(|_| invalid(column, value))
}

fn invalid(column: &'static str, value: &str) -> StoreError {
    StoreError::InvalidValue {
        column,
        value: value.to_string(),
    }
}

struct RawExpense {
    id: String,
    user_id: String,
    date: String,
    description: String,
    amount: f64,
    category: String,
    payment_method: String,
    source: String,
    created_at: String,
}

impl RawExpense {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            category: row.get(5)?,
            payment_method: row.get(6)?,
            source: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<ExpenseRecord, StoreError> {
        Ok(ExpenseRecord {
            date: parse_date("expenses.date", &self.date)?,
            category: parse_label("expenses.category", &self.category)?,
            payment_method: parse_label("expenses.payment_method", &self.payment_method)?,
            source: parse_label("expenses.source", &self.source)?,
            created_at: parse_timestamp("expenses.created_at", &self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            description: self.description,
            amount: self.amount,
        })
    }
}

struct RawIncome {
    id: String,
    user_id: String,
    date: String,
    description: String,
    amount: f64,
    source: String,
    created_at: String,
}

impl RawIncome {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            source: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<IncomeRecord, StoreError> {
        Ok(IncomeRecord {
            date: parse_date("incomes.date", &self.date)?,
            source: parse_label("incomes.source", &self.source)?,
            created_at: parse_timestamp("incomes.created_at", &self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            description: self.description,
            amount: self.amount,
        })
    }
}

struct RawLog {
    id: String,
    user_id: Option<String>,
    phone_number: Option<String>,
    raw_message: String,
    parsed_type: Option<String>,
    parsed_data: Option<String>,
    response_sent: Option<String>,
    created_at: String,
}

impl RawLog {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            phone_number: row.get(2)?,
            raw_message: row.get(3)?,
            parsed_type: row.get(4)?,
            parsed_data: row.get(5)?,
            response_sent: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_entry(self) -> Result<MessageLogEntry, StoreError> {
        let parsed_type = self
            .parsed_type
            .as_deref()
            .map(|t| parse_label::<ParsedType>("message_log.parsed_type", t))
            .transpose()?;
        let parsed_data = self
            .parsed_data
            .as_deref()
            .map(serde_json::from_str::<TransactionDraft>)
            .transpose()?;
        Ok(MessageLogEntry {
            created_at: parse_timestamp("message_log.created_at", &self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            phone_number: self.phone_number,
            raw_message: self.raw_message,
            parsed_type,
            parsed_data,
            response_sent: self.response_sent,
        })
    }
}

impl RecordStore for SqliteStore {
    fn find_user_by_phone(&self, phone: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let user_id = conn
            .query_row(
                "SELECT user_id FROM profiles WHERE phone_number = ?1 LIMIT 1",
                params![phone],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn gateway_settings(&self, user_id: &str) -> Result<Option<GatewaySettings>, StoreError> {
        let conn = self.lock()?;
        let settings = conn
            .query_row(
                "SELECT user_id, api_url, api_key, instance_name
                 FROM gateway_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(GatewaySettings {
                        user_id: row.get(0)?,
                        api_url: row.get(1)?,
                        api_key: row.get(2)?,
                        instance_name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    fn expenses_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date, created_at"
        ))?;
        let raw = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                RawExpense::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawExpense::into_record).collect()
    }

    fn incomes_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INCOME_COLUMNS} FROM incomes
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date, created_at"
        ))?;
        let raw = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                RawIncome::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawIncome::into_record).collect()
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
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO expenses ({EXPENSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                record.id,
                record.user_id,
                record.date.to_string(),
                record.description,
                record.amount,
                record.category.label(),
                record.payment_method.label(),
                record.source.label(),
                timestamp(record.created_at),
            ],
        )?;
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
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO incomes ({INCOME_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                record.id,
                record.user_id,
                record.date.to_string(),
                record.description,
                record.amount,
                record.source.label(),
                timestamp(record.created_at),
            ],
        )?;
        Ok(record)
    }

    fn insert_message_log(&self, entry: NewMessageLog) -> Result<MessageLogEntry, StoreError> {
        let parsed_data = entry
            .parsed_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
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
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO message_log ({LOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)"),
            params![
                record.id,
                record.user_id,
                record.phone_number,
                record.raw_message,
                record.parsed_type.map(|t| t.label()),
                parsed_data,
                timestamp(record.created_at),
            ],
        )?;
        Ok(record)
    }

    fn latest_message_log(&self, phone: &str) -> Result<Option<MessageLogEntry>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {LOG_COLUMNS} FROM message_log WHERE phone_number = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![phone],
                RawLog::from_row,
            )
            .optional()?;
        raw.map(RawLog::into_entry).transpose()
    }

    fn set_response_sent(&self, log_id: &str, response: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE message_log SET response_sent = ?1 WHERE id = ?2",
            params![response, log_id],
        )?;
        if updated == 0 {
            return Err(StoreError::LogNotFound(log_id.to_string()));
        }
        Ok(())
    }

    fn message_logs(&self, query: &LogQuery) -> Result<Vec<MessageLogEntry>, StoreError> {
        let conn = self.lock()?;
        // text search is case-folded in Rust, so LIMIT only applies without one
        let has_search = query.search.as_deref().is_some_and(|s| !s.is_empty());
        let sql_limit = if has_search {
            -1
        } else {
            i64::try_from(query.limit).unwrap_or(-1)
        };
        let (filter_type, type_label) = match query.parsed_type {
            Some(t) => (true, t.map(|t| t.label())),
            None => (false, None),
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM message_log
             WHERE ?1 = 0 OR parsed_type IS ?2
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3"
        ))?;
        let raw = stmt
            .query_map(params![filter_type, type_label, sql_limit], RawLog::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::new();
        for r in raw {
            if out.len() >= query.limit {
                break;
            }
            let id = r.id.clone();
            match r.into_entry() {
                Ok(entry) if query.matches(&entry) => out.push(entry),
                Ok(_) => {}
                Err(e) => warn!(id = %id, error = %e, "skipping undecodable message log row"),
            }
        }
        Ok(out)
    }

    fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO profiles (user_id, phone_number, full_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                phone_number = excluded.phone_number,
                full_name = excluded.full_name",
            params![profile.user_id, profile.phone_number, profile.full_name],
        )?;
        Ok(())
    }

    fn upsert_gateway_settings(&self, settings: GatewaySettings) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO gateway_settings (user_id, api_url, api_key, instance_name)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                api_url = excluded.api_url,
                api_key = excluded.api_key,
                instance_name = excluded.instance_name",
            params![
                settings.user_id,
                settings.api_url,
                settings.api_key,
                settings.instance_name
            ],
        )?;
        Ok(())
    }
}
