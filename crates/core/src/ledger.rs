use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::money::Money;
use crate::period::{CompanyMonth, FiscalYear, Quarter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    Temp,
    Perm,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Temp => write!(f, "Temp"),
            RecordType::Perm => write!(f, "Perm"),
        }
    }
}

/// Grouping key shared by revenue lines and journal deductions:
/// `year:month:week:contractor`, contractor trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub year: i32,
    pub month: CompanyMonth,
    pub week: u8,
    pub contractor: String,
}

impl RowKey {
    pub fn new(year: i32, month: CompanyMonth, week: u8, contractor: &str) -> Self {
        RowKey {
            year,
            month,
            week,
            contractor: contractor.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.year, self.month, self.week, self.contractor)
    }
}

/// One flat financial line, ready for the warehouse or a report sheet.
/// Rows are rebuilt from scratch on every run and upserted by key downstream;
/// nothing here is ever mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub year: i32,
    pub fiscal_year: FiscalYear,
    /// Calendar month name ("February"), as opposed to the custom month label.
    pub month: String,
    pub company_month: CompanyMonth,
    pub week: u8,
    /// Invoice or credit-note number; empty for journal add-on lines.
    pub number: String,
    pub record_type: RecordType,
    pub client: String,
    pub key: String,
    pub description: String,
    /// Extracted from the line description on temp invoices; empty otherwise.
    pub contractor: String,
    pub date: NaiveDate,
    /// Tax-inclusive total in the home currency.
    pub total: Money,
    pub ex_tax: Money,
    /// `None` is "margin unknown", which downstream renders blank, not zero.
    pub margin: Option<Money>,
    pub office: String,
    pub consultant_code: String,
    pub consultant: String,
    pub area: String,
    pub account_code: String,
    pub account_name: String,
    /// Fraction of a placement this row represents; `None` renders blank.
    pub placement: Option<Decimal>,
    pub currency_code: String,
    pub currency_rate: Decimal,
    pub updated: Option<NaiveDate>,
    /// Upstream record GUID, used by warehouse upsert-by-key writers.
    pub source_id: String,
    pub quarter: Quarter,
}

/// Signed journal-deduction totals indexed by row key. Missing keys read as
/// zero deduction.
#[derive(Debug, Clone, Default)]
pub struct DeductionIndex {
    totals: HashMap<String, Money>,
}

impl DeductionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, amount: Money) {
        let slot = self.totals.entry(key.to_string()).or_insert_with(Money::zero);
        *slot = *slot + amount;
    }

    pub fn deduction_for(&self, key: &str) -> Money {
        self.totals.get(key).copied().unwrap_or_else(Money::zero)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
