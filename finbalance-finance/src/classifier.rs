//! Inbound message classifier: expense report, income report, question or
//! unknown.
//!
//! Rules run in a fixed order and the first one that yields a positive
//! amount wins. Expense shapes are all tried before any income shape, so the
//! generic `<description> <amount>` shape also catches verb-less income
//! phrases ("recebi 1000" is an expense named "recebi").

use anyhow::Result;
use finbalance_core::{ParsedIntent, TransactionDraft};
use finbalance_ingest::parse_amount;
use regex::Regex;

use crate::category_rules::{categorize, detect_payment_method};

/// Words that make a `?`-message a question about the user's finances
pub const QUESTION_KEYWORDS: [&str; 12] = [
    "quanto", "qual", "como", "saldo", "fatura", "total", "gastei", "sobrou", "economia",
    "balanço", "resumo", "relatório",
];

/// Description used when an income message names no source
pub const DEFAULT_INCOME_DESCRIPTION: &str = "Receita";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// "gastei 50 no mercado"
    AmountFirst,
    /// "mercado 50"
    DescriptionFirst,
}

#[derive(Debug, Clone)]
struct Rule {
    regex: Regex,
    shape: Shape,
}

impl Rule {
    fn new(pattern: &str, shape: Shape) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            shape,
        })
    }

    /// (raw amount, raw description) if the message has this shape.
    fn extract<'m>(&self, message: &'m str) -> Option<(&'m str, &'m str)> {
        let caps = self.regex.captures(message)?;
        let first = caps.get(1).map_or("", |m| m.as_str());
        let second = caps.get(2).map_or("", |m| m.as_str());
        Some(match self.shape {
            Shape::AmountFirst => (first, second),
            Shape::DescriptionFirst => (second, first),
        })
    }
}

/// Compiled rule set. Build once and share; classification is pure.
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    expense_rules: Vec<Rule>,
    income_rules: Vec<Rule>,
}

impl MessageClassifier {
    pub fn new() -> Result<Self> {
        let expense_rules = vec![
            Rule::new(
                r"(?i)^gastei\s+(?:r\$?\s*)?([0-9,.]+)\s+(?:reais?\s+)?(?:no?|na|em|com)\s+(.+)$",
                Shape::AmountFirst,
            )?,
            Rule::new(
                r"(?i)^(?:paguei|comprei)\s+(?:r\$?\s*)?([0-9,.]+)\s+(?:reais?\s+)?(?:no?|na|em|com|de)\s+(.+)$",
                Shape::AmountFirst,
            )?,
            Rule::new(
                r"(?i)^(.+)\s+(?:r\$?\s*)?([0-9,.]+)\s*(?:reais?)?$",
                Shape::DescriptionFirst,
            )?,
        ];

        let income_rules = vec![
            Rule::new(
                r"(?i)^recebi\s+(?:r\$?\s*)?([0-9,.]+)\s+(?:reais?\s+)?(?:de|do|da)?\s*(.+)$",
                Shape::AmountFirst,
            )?,
            Rule::new(
                r"(?i)^ganhei\s+(?:r\$?\s*)?([0-9,.]+)\s+(?:reais?\s+)?(?:de|do|da|com)?\s*(.+)$",
                Shape::AmountFirst,
            )?,
            Rule::new(
                r"(?i)^entrou\s+(?:r\$?\s*)?([0-9,.]+)\s+(?:reais?\s+)?(?:de|do|da)?\s*(.+)$",
                Shape::AmountFirst,
            )?,
        ];

        Ok(Self {
            expense_rules,
            income_rules,
        })
    }

    pub fn classify(&self, message: &str) -> ParsedIntent {
        if let Some(draft) = self.match_expense(message) {
            return ParsedIntent::Expense(draft);
        }
        if let Some(draft) = self.match_income(message) {
            return ParsedIntent::Income(draft);
        }
        if is_question(message) {
            return ParsedIntent::Question;
        }
        ParsedIntent::Unknown
    }

    fn match_expense(&self, message: &str) -> Option<TransactionDraft> {
        self.expense_rules.iter().find_map(|rule| {
            let (raw_amount, raw_desc) = rule.extract(message)?;
            let amount = parse_amount(raw_amount);
            if amount <= 0.0 {
                return None;
            }
            let description = raw_desc.trim();
            if description.is_empty() {
                return None;
            }
            Some(TransactionDraft::expense(
                description,
                amount,
                categorize(description),
                detect_payment_method(description),
            ))
        })
    }

    fn match_income(&self, message: &str) -> Option<TransactionDraft> {
        self.income_rules.iter().find_map(|rule| {
            let (raw_amount, raw_desc) = rule.extract(message)?;
            let amount = parse_amount(raw_amount);
            if amount <= 0.0 {
                return None;
            }
            let description = match raw_desc.trim() {
                "" => DEFAULT_INCOME_DESCRIPTION,
                d => d,
            };
            Some(TransactionDraft::income(description, amount))
        })
    }
}

/// A question needs both a `?` and one of the finance keywords.
pub fn is_question(message: &str) -> bool {
    let lower = message.to_lowercase();
    let lower = lower.trim();
    lower.contains('?') && QUESTION_KEYWORDS.iter().any(|k| lower.contains(k))
}
