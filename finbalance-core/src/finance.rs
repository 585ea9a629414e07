//! Finance record types: expenses, incomes and their closed enumerations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expense categories, serialized with the labels the dashboard shows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ExpenseCategory {
    #[serde(rename = "Cartão Crédito")]
    CartaoCredito,
    #[serde(rename = "Gasto Variável")]
    GastoVariavel,
    #[serde(rename = "Fixo")]
    Fixo,
    #[serde(rename = "Alimentação")]
    Alimentacao,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Lazer")]
    Lazer,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Moradia")]
    Moradia,
    /// Manual-entry default
    #[default]
    #[serde(rename = "Outros")]
    Outros,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::CartaoCredito,
        ExpenseCategory::GastoVariavel,
        ExpenseCategory::Fixo,
        ExpenseCategory::Alimentacao,
        ExpenseCategory::Transporte,
        ExpenseCategory::Lazer,
        ExpenseCategory::Saude,
        ExpenseCategory::Educacao,
        ExpenseCategory::Moradia,
        ExpenseCategory::Outros,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::CartaoCredito => "Cartão Crédito",
            ExpenseCategory::GastoVariavel => "Gasto Variável",
            ExpenseCategory::Fixo => "Fixo",
            ExpenseCategory::Alimentacao => "Alimentação",
            ExpenseCategory::Transporte => "Transporte",
            ExpenseCategory::Lazer => "Lazer",
            ExpenseCategory::Saude => "Saúde",
            ExpenseCategory::Educacao => "Educação",
            ExpenseCategory::Moradia => "Moradia",
            ExpenseCategory::Outros => "Outros",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpenseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown expense category: {s}"))
    }
}

/// How an expense was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PaymentMethod {
    #[serde(rename = "crédito")]
    Credito,
    #[default]
    #[serde(rename = "débito")]
    Debito,
    #[serde(rename = "pix")]
    Pix,
    #[serde(rename = "dinheiro")]
    Dinheiro,
    #[serde(rename = "transferência")]
    Transferencia,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Credito,
        PaymentMethod::Debito,
        PaymentMethod::Pix,
        PaymentMethod::Dinheiro,
        PaymentMethod::Transferencia,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Credito => "crédito",
            PaymentMethod::Debito => "débito",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Dinheiro => "dinheiro",
            PaymentMethod::Transferencia => "transferência",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown payment method: {s}"))
    }
}

/// Where a record came from: the chat channel or the dashboard forms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DataSource {
    #[serde(rename = "whatsapp")]
    Whatsapp,
    #[default]
    #[serde(rename = "manual")]
    Manual,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Whatsapp => "whatsapp",
            DataSource::Manual => "manual",
        }
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(DataSource::Whatsapp),
            "manual" => Ok(DataSource::Manual),
            other => Err(anyhow::anyhow!("unknown data source: {other}")),
        }
    }
}

/// A stored expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub id: String,
    pub user_id: String,
    /// Date of the expense (YYYY-MM-DD)
    pub date: NaiveDate,
    pub description: String,
    /// Always positive
    pub amount: f64,
    pub category: ExpenseCategory,
    pub payment_method: PaymentMethod,
    pub source: DataSource,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Counts toward the card bill: either filed under the card category
    /// or paid on credit.
    pub fn is_credit_card(&self) -> bool {
        self.category == ExpenseCategory::CartaoCredito
            || self.payment_method == PaymentMethod::Credito
    }
}

/// A stored income
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeRecord {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub source: DataSource,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for an expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub payment_method: PaymentMethod,
    pub source: DataSource,
}

/// Insert shape for an income
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncome {
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub source: DataSource,
}
