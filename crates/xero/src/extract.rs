//! Turns raw invoice and credit-note records into flat ledger rows.
//!
//! Per-record failures never propagate: a bad date, missing tracking or
//! unknown account code drops the offending line or record with a logged
//! diagnostic and the batch keeps going. Only missing static configuration
//! (an unconfigured calendar year) is treated as an error, and even that is
//! fatal to the one record alone.

use rust_decimal::Decimal;
use thiserror::Error;

use finsync_core::{
    CalendarError, DeductionIndex, LedgerRow, Money, RecordType, RowKey, SyncConfig,
};

use crate::contractor::extract_contractor;
use crate::dates::parse_api_date;
use crate::models::{CreditNote, Invoice, LineItem};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("record is {0}")]
    Voided(String),
    #[error("unparseable date '{0}'")]
    BadDate(String),
    #[error(transparent)]
    MissingCalendar(#[from] CalendarError),
    #[error("unknown account code '{0}'")]
    UnknownAccount(String),
    #[error("line tracking incomplete")]
    MissingTracking,
    #[error("zero-amount line")]
    ZeroAmount,
}

/// One dropped record or line, kept alongside the rows for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    pub source_id: String,
    pub number: String,
    pub reason: SkipReason,
}

/// Output of one extraction run: the surviving rows, the skip reasons for
/// everything dropped, and the IDs of voided/deleted records so a warehouse
/// writer can retract previously uploaded rows.
#[derive(Debug, Default)]
pub struct Extraction {
    pub rows: Vec<LedgerRow>,
    pub skips: Vec<Skip>,
    pub deleted: Vec<String>,
}

impl Extraction {
    pub fn merge(&mut self, other: Extraction) {
        self.rows.extend(other.rows);
        self.skips.extend(other.skips);
        self.deleted.extend(other.deleted);
    }

    fn skip(&mut self, source_id: &str, number: &str, reason: SkipReason) {
        self.skips.push(Skip {
            source_id: source_id.to_string(),
            number: number.to_string(),
            reason,
        });
    }
}

/// Pure per-record extractor over caller-supplied configuration and the
/// journal-deduction index. Running it twice over the same inputs yields
/// identical rows.
pub struct LineExtractor<'a> {
    config: &'a SyncConfig,
    deductions: &'a DeductionIndex,
}

impl<'a> LineExtractor<'a> {
    pub fn new(config: &'a SyncConfig, deductions: &'a DeductionIndex) -> Self {
        LineExtractor { config, deductions }
    }

    pub fn extract_all(&self, invoices: &[Invoice], credit_notes: &[CreditNote]) -> Extraction {
        let mut out = Extraction::default();
        for invoice in invoices {
            out.merge(self.extract_invoice(invoice));
        }
        for note in credit_notes {
            out.merge(self.extract_credit_note(note));
        }
        out
    }

    pub fn extract_invoice(&self, invoice: &Invoice) -> Extraction {
        let mut out = Extraction::default();
        let id = &invoice.invoice_id;
        let number = &invoice.invoice_number;

        if invoice.status == "DELETED" || invoice.status == "VOIDED" {
            out.deleted.push(id.clone());
            out.skip(id, number, SkipReason::Voided(invoice.status.clone()));
            return out;
        }

        let record_type = if number.starts_with("TC-") {
            RecordType::Temp
        } else {
            RecordType::Perm
        };

        let Some(date) = parse_api_date(&invoice.date) else {
            out.skip(id, number, SkipReason::BadDate(invoice.date.clone()));
            return out;
        };
        let period = match self.config.calendar.period_of(date) {
            Ok(period) => period,
            Err(e) => {
                tracing::warn!(invoice = %number, error = %e, "calendar not configured, skipping invoice");
                out.skip(id, number, SkipReason::MissingCalendar(e));
                return out;
            }
        };

        let rate = invoice.currency_rate.unwrap_or(Decimal::ONE);
        let updated = parse_api_date(&invoice.updated_date_utc);

        let stamp = |line: &LineItem,
                     key: String,
                     contractor: String,
                     subtotal: Money,
                     total: Money,
                     margin: Option<Money>,
                     placement: Option<Decimal>,
                     account_code: &str| {
            let (office, consultant_code, consultant) = tracking_fields(line, false);
            let area = self
                .config
                .area_for(&consultant_code)
                .unwrap_or_default()
                .to_string();
            LedgerRow {
                year: period.year,
                fiscal_year: period.fiscal_year,
                month: date.format("%B").to_string(),
                company_month: period.month,
                week: period.week,
                number: number.clone(),
                record_type,
                client: invoice.contact.name.clone(),
                key,
                description: line.description.clone(),
                contractor,
                date,
                total: total.rounded(),
                ex_tax: subtotal.rounded(),
                margin: margin.map(Money::rounded),
                office,
                consultant_code,
                consultant,
                area,
                account_code: account_code.to_string(),
                account_name: self
                    .config
                    .account_name(account_code)
                    .unwrap_or_default()
                    .to_string(),
                placement,
                currency_code: invoice.currency_code.clone(),
                currency_rate: rate,
                updated,
                source_id: id.clone(),
                quarter: period.quarter,
            }
        };

        if record_type == RecordType::Temp {
            // Group lines by contractor/week key so journal deductions can be
            // apportioned across the group.
            let mut groups: Vec<(String, Vec<&LineItem>)> = Vec::new();
            for line in &invoice.line_items {
                if !has_tracking_pair(line) {
                    tracing::debug!(invoice = %number, "line without category/consultant tracking, dropping");
                    out.skip(id, number, SkipReason::MissingTracking);
                    continue;
                }
                let contractor = extract_contractor(record_type, &line.description)
                    .unwrap_or_default()
                    .to_lowercase();
                let key =
                    RowKey::new(period.year, period.month, period.week, &contractor).to_string();
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, lines)) => lines.push(line),
                    None => groups.push((key, vec![line])),
                }
            }

            for (key, lines) in &groups {
                let group_total: Money = lines.iter().map(|l| Money::new(l.line_amount)).sum();
                let deduction = self.deductions.deduction_for(key);
                for &line in lines {
                    let subtotal = Money::new(line.line_amount);
                    let total = subtotal + Money::new(line.tax_amount);
                    let contractor = extract_contractor(record_type, &line.description)
                        .unwrap_or_default()
                        .to_lowercase();
                    let proportion = subtotal.proportion_of(group_total);
                    let margin = if line.description.to_lowercase().contains("program fee") {
                        Some(subtotal)
                    } else if !deduction.is_zero() {
                        Some(subtotal + deduction * proportion)
                    } else {
                        None
                    };
                    let (subtotal, total, margin) = convert_amounts(rate, subtotal, total, margin);
                    if self.config.account_name(&line.account_code).is_none() {
                        tracing::warn!(invoice = %number, code = %line.account_code, "unknown account code, dropping line");
                        out.skip(id, number, SkipReason::UnknownAccount(line.account_code.clone()));
                        continue;
                    }
                    out.rows.push(stamp(
                        line,
                        key.clone(),
                        contractor,
                        subtotal,
                        total,
                        margin,
                        Some(Decimal::ZERO),
                        &line.account_code,
                    ));
                }
            }
        } else {
            let mut valid = Vec::new();
            for line in &invoice.line_items {
                if has_tracking_pair(line) {
                    valid.push(line);
                } else {
                    tracing::debug!(invoice = %number, "line without category/consultant tracking, dropping");
                    out.skip(id, number, SkipReason::MissingTracking);
                }
            }
            if valid.is_empty() {
                return out;
            }

            // Perm invoices bill one engagement: the first valid line's
            // account code classifies the whole invoice, including its
            // placement fraction.
            let account_code = valid[0].account_code.clone();
            let placement_total = self.config.placement_fraction(&account_code);
            let group_total: Money = valid.iter().map(|l| Money::new(l.line_amount)).sum();

            for &line in &valid {
                let subtotal = Money::new(line.line_amount);
                let total = subtotal + Money::new(line.tax_amount);
                let key = RowKey::new(period.year, period.month, period.week, "").to_string();
                let proportion = subtotal.proportion_of(group_total);
                let placement = (proportion * placement_total).round_dp(6);
                let margin = Some(subtotal);
                let (subtotal, total, margin) = convert_amounts(rate, subtotal, total, margin);
                if self.config.account_name(&account_code).is_none() {
                    tracing::warn!(invoice = %number, code = %account_code, "unknown account code, dropping line");
                    out.skip(id, number, SkipReason::UnknownAccount(account_code.clone()));
                    continue;
                }
                out.rows.push(stamp(
                    line,
                    key,
                    String::new(),
                    subtotal,
                    total,
                    margin,
                    Some(placement),
                    &account_code,
                ));
            }
        }
        out
    }

    /// Credit notes run a simplified path: amounts negate, either tracking
    /// entry suffices, and the record type comes off the note number's shape.
    /// An 8-character number is a perm credit; the numbering scheme is the
    /// only type signal the payload carries, so do not "fix" this without a
    /// new field upstream.
    pub fn extract_credit_note(&self, note: &CreditNote) -> Extraction {
        let mut out = Extraction::default();
        let id = &note.credit_note_id;
        let number = &note.credit_note_number;

        if note.status == "DELETED" || note.status == "VOIDED" {
            out.skip(id, number, SkipReason::Voided(note.status.clone()));
            return out;
        }
        let Some(date) = parse_api_date(&note.date) else {
            out.skip(id, number, SkipReason::BadDate(note.date.clone()));
            return out;
        };
        let period = match self.config.calendar.period_of(date) {
            Ok(period) => period,
            Err(e) => {
                tracing::warn!(credit_note = %number, error = %e, "calendar not configured, skipping credit note");
                out.skip(id, number, SkipReason::MissingCalendar(e));
                return out;
            }
        };

        let rate = note.currency_rate.unwrap_or(Decimal::ONE);
        let updated = parse_api_date(&note.updated_date_utc);
        let record_type = if number.len() == 8 {
            RecordType::Perm
        } else {
            RecordType::Temp
        };

        for line in &note.line_items {
            let subtotal = Money::new(line.line_amount);
            if subtotal.rounded().is_zero() {
                out.skip(id, number, SkipReason::ZeroAmount);
                continue;
            }
            if line.account_code.is_empty()
                || self.config.account_name(&line.account_code).is_none()
            {
                tracing::debug!(credit_note = %number, code = %line.account_code, "unknown account code, dropping line");
                out.skip(id, number, SkipReason::UnknownAccount(line.account_code.clone()));
                continue;
            }
            let (office, consultant_code, consultant) = tracking_fields(line, true);
            if consultant_code.is_empty() && office.is_empty() {
                out.skip(id, number, SkipReason::MissingTracking);
                continue;
            }
            let area = self
                .config
                .area_for(&consultant_code)
                .unwrap_or_default()
                .to_string();
            let total = subtotal + Money::new(line.tax_amount);
            let (subtotal, total, _) = convert_amounts(rate, subtotal, total, None);

            out.rows.push(LedgerRow {
                year: period.year,
                fiscal_year: period.fiscal_year,
                month: date.format("%B").to_string(),
                company_month: period.month,
                week: period.week,
                number: number.clone(),
                record_type,
                client: note.contact.name.clone(),
                key: String::new(),
                description: line.description.clone(),
                contractor: String::new(),
                date,
                total: -total.rounded(),
                ex_tax: -subtotal.rounded(),
                margin: Some(-subtotal.rounded()),
                office,
                consultant_code,
                consultant,
                area,
                account_code: line.account_code.clone(),
                account_name: self
                    .config
                    .account_name(&line.account_code)
                    .unwrap_or_default()
                    .to_string(),
                placement: None,
                currency_code: note.currency_code.clone(),
                currency_rate: rate,
                updated,
                source_id: id.clone(),
                quarter: period.quarter,
            });
        }
        out
    }
}

fn has_tracking_pair(line: &LineItem) -> bool {
    line.tracking.iter().any(|t| t.name == "Category")
        && line.tracking.iter().any(|t| t.name == "Consultant")
}

/// Office, consultant code and consultant name off a line's tracking options.
/// Credit notes trim stray commas around the consultant's name.
fn tracking_fields(line: &LineItem, trim_commas: bool) -> (String, String, String) {
    let mut office = String::new();
    let mut consultant_code = String::new();
    let mut consultant = String::new();
    for t in &line.tracking {
        if t.name == "Category" {
            office = t.option.clone();
        } else if t.name == "Consultant" {
            consultant_code = t.option.clone();
            if let Some((_, name)) = consultant_code.split_once(' ') {
                consultant = if trim_commas {
                    name.trim_matches(',').to_string()
                } else {
                    name.to_string()
                };
            }
        }
    }
    (office, consultant_code, consultant)
}

fn convert_amounts(
    rate: Decimal,
    subtotal: Money,
    total: Money,
    margin: Option<Money>,
) -> (Money, Money, Option<Money>) {
    if rate.is_zero() || rate == Decimal::ONE {
        (subtotal, total, margin)
    } else {
        (
            subtotal.convert(rate),
            total.convert(rate),
            margin.map(|m| m.convert(rate)),
        )
    }
}
