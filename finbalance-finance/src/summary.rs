//! Answers finance questions with month-to-date figures.
//!
//! The question picks a report template by keyword group; the figures always
//! cover the calendar month containing the given date.

use anyhow::Result;
use chrono::NaiveDate;
use finbalance_core::{ExpenseCategory, ExpenseRecord, IncomeRecord, MonthRange};
use regex::Regex;
use tracing::{debug, warn};

use crate::store::RecordStore;

/// Categories listed in the spending breakdown
pub const TOP_CATEGORIES: usize = 5;

const RULE: &str = "━━━━━━━━━━━";

/// Month-to-date aggregates for one user
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotals {
    pub total_expenses: f64,
    pub total_incomes: f64,
    pub balance: f64,
    /// Expenses filed under the card category or paid on credit
    pub credit_card_total: f64,
    /// Per-category totals in first-seen order
    pub by_category: Vec<(ExpenseCategory, f64)>,
}

impl MonthlyTotals {
    pub fn compute(expenses: &[ExpenseRecord], incomes: &[IncomeRecord]) -> Self {
        let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();
        let total_incomes: f64 = incomes.iter().map(|i| i.amount).sum();
        let credit_card_total: f64 = expenses
            .iter()
            .filter(|e| e.is_credit_card())
            .map(|e| e.amount)
            .sum();

        let mut by_category: Vec<(ExpenseCategory, f64)> = Vec::new();
        for e in expenses {
            match by_category.iter_mut().find(|(c, _)| *c == e.category) {
                Some((_, total)) => *total += e.amount,
                None => by_category.push((e.category, e.amount)),
            }
        }

        Self {
            total_expenses,
            total_incomes,
            balance: total_incomes - total_expenses,
            credit_card_total,
            by_category,
        }
    }

    /// Largest categories first; ties keep first-seen order.
    pub fn top_categories(&self, n: usize) -> Vec<(ExpenseCategory, f64)> {
        let mut sorted = self.by_category.clone();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_totals(self.balance, self.total_incomes)
    }
}

/// Share of income kept at month end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// At least 20% of income kept
    Good,
    /// Non-negative balance below 20%
    Warning,
    /// Spending more than earning
    Critical,
}

impl HealthStatus {
    pub fn from_totals(balance: f64, income: f64) -> Self {
        if balance >= income * 0.2 {
            HealthStatus::Good
        } else if balance >= 0.0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            HealthStatus::Good => "🟢",
            HealthStatus::Warning => "🟡",
            HealthStatus::Critical => "🔴",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Good => "Saudável",
            HealthStatus::Warning => "Atenção",
            HealthStatus::Critical => "Crítico",
        }
    }
}

/// Reply template picked for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    CardBill,
    Balance,
    Spending,
    Summary,
    Quick,
}

/// Keyword groups in precedence order
#[derive(Debug, Clone)]
pub struct ReportSelector {
    rules: Vec<(Regex, ReportKind)>,
}

impl ReportSelector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: vec![
                (Regex::new(r"fatura|cartão|crédito")?, ReportKind::CardBill),
                (Regex::new(r"saldo|sobrou|tenho")?, ReportKind::Balance),
                (Regex::new(r"gastei|total.*gasto|quanto.*gast")?, ReportKind::Spending),
                (Regex::new(r"resumo|balanço|relatório")?, ReportKind::Summary),
            ],
        })
    }

    pub fn select(&self, question: &str) -> ReportKind {
        let lower = question.to_lowercase();
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(&lower))
            .map(|(_, kind)| *kind)
            .unwrap_or(ReportKind::Quick)
    }
}

/// `R$` amount with two decimals. Exact half-cent values round away from
/// zero; everything else follows the nearest representable decimal.
pub fn brl(value: f64) -> String {
    format!("R$ {}", two_decimals(value))
}

fn two_decimals(value: f64) -> String {
    // a value that sits exactly on a half cent is an odd multiple of 1/8
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        let cents = (value * 100.0).round();
        return format!("{:.2}", cents / 100.0);
    }
    format!("{value:.2}")
}

/// Render one report. `month_name` is the pt-BR month label.
pub fn render(kind: ReportKind, totals: &MonthlyTotals, month_name: &str) -> String {
    match kind {
        ReportKind::CardBill => {
            let closing = if totals.credit_card_total > 0.0 {
                "Lembre-se de pagar em dia! 📅"
            } else {
                "Nenhum gasto no cartão este mês! 🎉"
            };
            format!(
                "💳 *Fatura do Cartão ({month_name})*\n\nTotal: {}\n\n{closing}",
                brl(totals.credit_card_total)
            )
        }
        ReportKind::Balance => {
            let (emoji, mark) = if totals.balance >= 0.0 {
                ("💚", "✅")
            } else {
                ("🔴", "⚠️")
            };
            format!(
                "{emoji} *Seu Saldo Atual*\n\n💰 Ganhos: {}\n💸 Gastos: {}\n{RULE}\n{mark} Saldo: {}",
                brl(totals.total_incomes),
                brl(totals.total_expenses),
                brl(totals.balance)
            )
        }
        ReportKind::Spending => {
            let breakdown: String = totals
                .top_categories(TOP_CATEGORIES)
                .iter()
                .map(|(cat, amount)| format!("\n• {cat}: {}", brl(*amount)))
                .collect();
            format!(
                "💸 *Gastos de {month_name}*\n\nTotal: {}\n\n📊 Por categoria:{breakdown}",
                brl(totals.total_expenses)
            )
        }
        ReportKind::Summary => format!(
            "📊 *Resumo Financeiro - {month_name}*\n\n💰 Receitas: {}\n💸 Despesas: {}\n💳 Cartão: {}\n{RULE}\n💵 Saldo: {}\n{} Saúde Financeira",
            brl(totals.total_incomes),
            brl(totals.total_expenses),
            brl(totals.credit_card_total),
            brl(totals.balance),
            totals.health().emoji()
        ),
        ReportKind::Quick => format!(
            "📊 *Resumo Rápido*\n\n💰 Ganhos: {}\n💸 Gastos: {}\n💵 Saldo: {}\n\n💡 Pergunte sobre:\n• \"Quanto gastei esse mês?\"\n• \"Qual minha fatura do cartão?\"\n• \"Qual meu saldo atual?\"",
            brl(totals.total_incomes),
            brl(totals.total_expenses),
            brl(totals.balance)
        ),
    }
}

pub struct FinancialSummaryEngine {
    selector: ReportSelector,
}

impl FinancialSummaryEngine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selector: ReportSelector::new()?,
        })
    }

    /// Month-to-date totals. Read failures count as no records.
    pub fn totals<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        today: NaiveDate,
    ) -> MonthlyTotals {
        let month = MonthRange::containing(today);
        let expenses = store
            .expenses_between(user_id, month.start, month.end)
            .unwrap_or_else(|e| {
                warn!(user_id, error = %e, "failed to load expenses; treating as none");
                Vec::new()
            });
        let incomes = store
            .incomes_between(user_id, month.start, month.end)
            .unwrap_or_else(|e| {
                warn!(user_id, error = %e, "failed to load incomes; treating as none");
                Vec::new()
            });
        MonthlyTotals::compute(&expenses, &incomes)
    }

    pub fn answer<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        question: &str,
        today: NaiveDate,
    ) -> String {
        let kind = self.selector.select(question);
        let totals = self.totals(store, user_id, today);
        debug!(user_id, ?kind, balance = totals.balance, "rendering report");
        render(kind, &totals, MonthRange::containing(today).month_name())
    }
}
