//! Classified intent of an inbound chat message, and the log entry that
//! records it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::finance::{ExpenseCategory, PaymentMethod};

/// Tag stored on the message log. Unrecognized messages carry no tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParsedType {
    #[serde(rename = "gasto")]
    Gasto,
    #[serde(rename = "ganho")]
    Ganho,
    #[serde(rename = "pergunta")]
    Pergunta,
}

impl ParsedType {
    pub fn label(&self) -> &'static str {
        match self {
            ParsedType::Gasto => "gasto",
            ParsedType::Ganho => "ganho",
            ParsedType::Pergunta => "pergunta",
        }
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParsedType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gasto" => Ok(ParsedType::Gasto),
            "ganho" => Ok(ParsedType::Ganho),
            "pergunta" => Ok(ParsedType::Pergunta),
            other => Err(anyhow::anyhow!("unknown parsed type: {other}")),
        }
    }
}

/// Fields extracted from a message that reports a transaction.
///
/// `category` and `payment_method` are only filled for expenses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ExpenseCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl TransactionDraft {
    pub fn expense(
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category: Some(category),
            payment_method: Some(payment_method),
        }
    }

    pub fn income(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
            category: None,
            payment_method: None,
        }
    }
}

/// What a message was understood to be.
///
/// On the wire this is `{ "type": "gasto"|"ganho"|"pergunta"|null, "data": {...}|null }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireIntent", try_from = "WireIntent")]
pub enum ParsedIntent {
    Expense(TransactionDraft),
    Income(TransactionDraft),
    Question,
    Unknown,
}

impl ParsedIntent {
    pub fn parsed_type(&self) -> Option<ParsedType> {
        match self {
            ParsedIntent::Expense(_) => Some(ParsedType::Gasto),
            ParsedIntent::Income(_) => Some(ParsedType::Ganho),
            ParsedIntent::Question => Some(ParsedType::Pergunta),
            ParsedIntent::Unknown => None,
        }
    }

    pub fn draft(&self) -> Option<&TransactionDraft> {
        match self {
            ParsedIntent::Expense(d) | ParsedIntent::Income(d) => Some(d),
            ParsedIntent::Question | ParsedIntent::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireIntent {
    #[serde(rename = "type")]
    parsed_type: Option<ParsedType>,
    data: Option<TransactionDraft>,
}

impl From<ParsedIntent> for WireIntent {
    fn from(intent: ParsedIntent) -> Self {
        let parsed_type = intent.parsed_type();
        let data = match intent {
            ParsedIntent::Expense(d) | ParsedIntent::Income(d) => Some(d),
            ParsedIntent::Question | ParsedIntent::Unknown => None,
        };
        WireIntent { parsed_type, data }
    }
}

impl TryFrom<WireIntent> for ParsedIntent {
    type Error = String;

    fn try_from(wire: WireIntent) -> Result<Self, Self::Error> {
        match (wire.parsed_type, wire.data) {
            (Some(ParsedType::Gasto), Some(d)) => Ok(ParsedIntent::Expense(d)),
            (Some(ParsedType::Ganho), Some(d)) => Ok(ParsedIntent::Income(d)),
            (Some(ParsedType::Pergunta), None) => Ok(ParsedIntent::Question),
            (None, None) => Ok(ParsedIntent::Unknown),
            (t, d) => Err(format!(
                "inconsistent intent: type={t:?} data_present={}",
                d.is_some()
            )),
        }
    }
}

/// One row of the inbound message audit log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageLogEntry {
    pub id: String,
    /// None when the sender's number is not linked to an account
    pub user_id: Option<String>,
    pub phone_number: Option<String>,
    pub raw_message: String,
    pub parsed_type: Option<ParsedType>,
    pub parsed_data: Option<TransactionDraft>,
    pub response_sent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for the message log. Type and data are derived from one
/// intent so a transaction tag never lands without its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessageLog {
    pub user_id: Option<String>,
    pub phone_number: Option<String>,
    pub raw_message: String,
    pub parsed_type: Option<ParsedType>,
    pub parsed_data: Option<TransactionDraft>,
}

impl NewMessageLog {
    pub fn new(
        user_id: Option<String>,
        phone_number: Option<String>,
        raw_message: impl Into<String>,
        intent: &ParsedIntent,
    ) -> Self {
        Self {
            user_id,
            phone_number,
            raw_message: raw_message.into(),
            parsed_type: intent.parsed_type(),
            parsed_data: intent.draft().cloned(),
        }
    }
}
