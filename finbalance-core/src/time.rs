//! Time utilities: calendar-month windows and pt-BR month names.

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, Utc};
use chrono_tz::Tz;

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Inclusive first/last day of a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthRange {
    /// The calendar month that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date);
        Self { start, end }
    }

    /// Long month name as pt-BR renders it (lowercase).
    pub fn month_name(&self) -> &'static str {
        month_name_pt_br(self.start.month())
    }
}

/// pt-BR long month name for a 1-based month number.
pub fn month_name_pt_br(month: u32) -> &'static str {
    let idx = month.clamp(1, 12) as usize - 1;
    MONTHS_PT_BR[idx]
}

/// Today's date in an IANA zone like "America/Sao_Paulo", or in the
/// server's local zone when none is configured.
pub fn today_in(tz: Option<&str>) -> Result<NaiveDate> {
    match tz {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))?;
            Ok(Utc::now().with_timezone(&tz).date_naive())
        }
        None => Ok(Local::now().date_naive()),
    }
}
