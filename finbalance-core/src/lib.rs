//! finbalance-core: domain types shared by the webhook, the store and the CLI

pub mod account;
pub mod finance;
pub mod intent;
pub mod time;

pub use account::{GatewayCredentials, GatewaySettings, Profile};
pub use finance::{
    DataSource, ExpenseCategory, ExpenseRecord, IncomeRecord, NewExpense, NewIncome, PaymentMethod,
};
pub use intent::{MessageLogEntry, NewMessageLog, ParsedIntent, ParsedType, TransactionDraft};
pub use time::{MonthRange, month_name_pt_br, today_in};
