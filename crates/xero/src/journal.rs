//! Manual-journal parsing: the cost side of the margin calculation and the
//! hand-keyed revenue add-on lines.
//!
//! Contracting journals record wage costs; their lines build the
//! [`DeductionIndex`] the invoice extractor apportions against revenue.
//! Recruitment journals carry occasional revenue adjustments that become
//! ledger rows of their own.

use chrono::NaiveDate;
use finsync_core::{
    CompanyMonth, DeductionIndex, FiscalYear, LedgerRow, Money, Quarter, RecordType, RowKey,
    SyncConfig,
};

use crate::dates::parse_api_date;
use crate::extract::{Skip, SkipReason};
use crate::models::ManualJournal;

/// Which side of the books a journal batch feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalRole {
    /// Wage-cost journals: every line is kept.
    Deductions,
    /// Revenue add-on journals: only lines on journal-view account codes.
    AddOns,
}

/// One flat manual-journal line, period-stamped and keyed like a ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalLineRow {
    pub journal_id: String,
    pub date: NaiveDate,
    pub year: i32,
    pub month: CompanyMonth,
    pub week: u8,
    pub key: String,
    pub narration: String,
    pub status: String,
    pub updated: Option<NaiveDate>,
    pub account_code: String,
    /// Journal lines book costs as credits; the sign flips here so wage
    /// deductions read as negative revenue adjustments.
    pub amount: Money,
    pub description: String,
    pub contractor: String,
    pub units: Option<String>,
    pub tax_type: String,
    pub category: String,
    pub consultant: String,
}

/// Flattens posted journals into period-stamped lines. Unparseable dates and
/// unconfigured calendar years drop the journal with a diagnostic, matching
/// the invoice path's failure semantics.
pub fn parse_journals(
    journals: &[ManualJournal],
    role: JournalRole,
    config: &SyncConfig,
) -> (Vec<JournalLineRow>, Vec<Skip>) {
    let mut rows = Vec::new();
    let mut skips = Vec::new();

    for journal in journals {
        let id = &journal.manual_journal_id;
        let Some(date) = parse_api_date(&journal.date) else {
            skips.push(Skip {
                source_id: id.clone(),
                number: String::new(),
                reason: SkipReason::BadDate(journal.date.clone()),
            });
            continue;
        };
        let period = match config.calendar.period_of(date) {
            Ok(period) => period,
            Err(e) => {
                tracing::warn!(journal = %id, error = %e, "calendar not configured, skipping journal");
                skips.push(Skip {
                    source_id: id.clone(),
                    number: String::new(),
                    reason: SkipReason::MissingCalendar(e),
                });
                continue;
            }
        };
        let updated = parse_api_date(&journal.updated_date_utc);

        for line in &journal.journal_lines {
            if role == JournalRole::AddOns && !config.is_journal_account(&line.account_code) {
                skips.push(Skip {
                    source_id: id.clone(),
                    number: String::new(),
                    reason: SkipReason::UnknownAccount(line.account_code.clone()),
                });
                continue;
            }

            // Temp wage journals describe lines as "…: contractor : units".
            let mut contractor = String::new();
            let mut units = None;
            if journal.narration.starts_with("Temp") && line.description.contains(':') {
                let mut parts = line.description.split(':');
                parts.next();
                if let Some(name) = parts.next() {
                    contractor = name.trim().to_string();
                }
                units = parts.next().map(|u| u.trim().to_string());
            }

            let mut category = String::new();
            let mut consultant = String::new();
            for t in &line.tracking {
                if t.name == "Category" {
                    category = t.option.clone();
                } else if t.name == "Consultant" {
                    consultant = t.option.clone();
                }
            }

            rows.push(JournalLineRow {
                journal_id: id.clone(),
                date,
                year: period.year,
                month: period.month,
                week: period.week,
                key: RowKey::new(period.year, period.month, period.week, &contractor).to_string(),
                narration: journal.narration.clone(),
                status: journal.status.clone(),
                updated,
                account_code: line.account_code.clone(),
                amount: -Money::new(line.line_amount),
                description: line.description.clone(),
                contractor,
                units,
                tax_type: line.tax_type.clone(),
                category,
                consultant,
            });
        }
    }
    (rows, skips)
}

/// Sums journal-line amounts by row key for the margin calculation.
pub fn build_deduction_index(rows: &[JournalLineRow]) -> DeductionIndex {
    let mut index = DeductionIndex::new();
    for row in rows {
        index.add(&row.key, row.amount);
    }
    index
}

/// Re-expresses revenue add-on journal lines as perm ledger rows in the home
/// currency. Margin is the line amount itself; zero-amount lines drop out.
pub fn addon_rows(rows: &[JournalLineRow], config: &SyncConfig) -> Vec<LedgerRow> {
    rows.iter()
        .filter(|row| !row.amount.is_zero())
        .map(|row| {
            let consultant_name = row
                .consultant
                .split_once(' ')
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| row.consultant.clone());
            LedgerRow {
                year: row.year,
                fiscal_year: FiscalYear::containing(row.date),
                month: row.month.label().to_string(),
                company_month: row.month,
                week: row.week,
                number: String::new(),
                record_type: RecordType::Perm,
                client: String::new(),
                key: row.key.clone(),
                description: row.description.clone(),
                contractor: row.contractor.clone(),
                date: row.date,
                total: row.amount.rounded(),
                ex_tax: row.amount.rounded(),
                margin: Some(row.amount.rounded()),
                office: row.category.clone(),
                consultant_code: row.consultant.clone(),
                consultant: consultant_name,
                area: config
                    .area_for(&row.consultant)
                    .unwrap_or_default()
                    .to_string(),
                account_code: row.account_code.clone(),
                account_name: config
                    .account_name(&row.account_code)
                    .unwrap_or_default()
                    .to_string(),
                placement: None,
                currency_code: config.home_currency.clone(),
                currency_rate: rust_decimal::Decimal::ONE,
                updated: row.updated,
                source_id: row.journal_id.clone(),
                quarter: Quarter::for_month(row.month),
            }
        })
        .collect()
}
