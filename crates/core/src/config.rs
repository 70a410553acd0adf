use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

use crate::calendar::{CalendarError, CutoffCalendar};
use crate::period::CompanyMonth;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("Calendar year key '{0}' is not a year")]
    InvalidYearKey(String),
    #[error("Calendar year {year} has unknown month label '{label}'")]
    UnknownMonth { year: i32, label: String },
    #[error("Calendar year {year} is missing a cutoff for {month}")]
    MissingMonth { year: i32, month: CompanyMonth },
    #[error("Cutoff for {month} {year} is not a yyyy-mm-dd date: '{value}'")]
    InvalidDate {
        year: i32,
        month: CompanyMonth,
        value: String,
    },
}

/// Account codes whose invoices are milestone-split or carry no placement.
/// Retained placements bill as three milestone invoices, so each counts 1/3;
/// advisory work counts no placement at all. This table is supplied as data
/// and never re-derived from account names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacementTable {
    #[serde(default)]
    retained: BTreeSet<String>,
    #[serde(default)]
    advisory: BTreeSet<String>,
}

impl PlacementTable {
    pub fn new(retained: BTreeSet<String>, advisory: BTreeSet<String>) -> Self {
        PlacementTable { retained, advisory }
    }

    pub fn fraction_for(&self, account_code: &str) -> Decimal {
        if self.advisory.contains(account_code) {
            Decimal::ZERO
        } else if self.retained.contains(account_code) {
            Decimal::ONE / Decimal::from(3)
        } else {
            Decimal::ONE
        }
    }
}

/// The static lookup tables the extractors run against. Everything here is
/// caller-supplied data (TOML in production, literals in tests) so yearly
/// updates never touch extraction logic.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub home_currency: String,
    accounts: BTreeMap<String, String>,
    journal_excluded: BTreeSet<String>,
    areas: BTreeMap<String, String>,
    placements: PlacementTable,
    pub calendar: CutoffCalendar,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    home_currency: String,
    accounts: BTreeMap<String, String>,
    /// Codes valid on invoices but excluded from the manual-journal view,
    /// e.g. the doubtful-debts provision.
    #[serde(default)]
    journal_excluded_accounts: Vec<String>,
    #[serde(default)]
    areas: BTreeMap<String, String>,
    #[serde(default)]
    placements: PlacementTable,
    /// year -> month label -> "yyyy-mm-dd" cutoff.
    calendar: BTreeMap<String, BTreeMap<String, String>>,
}

impl SyncConfig {
    pub fn new(
        home_currency: &str,
        accounts: BTreeMap<String, String>,
        journal_excluded: BTreeSet<String>,
        areas: BTreeMap<String, String>,
        placements: PlacementTable,
        calendar: CutoffCalendar,
    ) -> Self {
        SyncConfig {
            home_currency: home_currency.to_string(),
            accounts,
            journal_excluded,
            areas,
            placements,
            calendar,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let mut calendar = CutoffCalendar::new();
        for (year_key, months) in &raw.calendar {
            let year: i32 = year_key
                .parse()
                .map_err(|_| ConfigError::InvalidYearKey(year_key.clone()))?;
            for label in months.keys() {
                label
                    .parse::<CompanyMonth>()
                    .map_err(|_| ConfigError::UnknownMonth { year, label: label.clone() })?;
            }
            let mut cutoffs = [NaiveDate::MIN; 12];
            for month in CompanyMonth::ALL {
                let value = months
                    .get(month.label())
                    .ok_or(ConfigError::MissingMonth { year, month })?;
                cutoffs[month.index()] = value.parse().map_err(|_| ConfigError::InvalidDate {
                    year,
                    month,
                    value: value.clone(),
                })?;
            }
            calendar.insert_year(year, cutoffs)?;
        }

        Ok(SyncConfig {
            home_currency: raw.home_currency,
            accounts: raw.accounts,
            journal_excluded: raw.journal_excluded_accounts.into_iter().collect(),
            areas: raw.areas,
            placements: raw.placements,
            calendar,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Account name for a code, or `None` for codes outside the allowlist.
    /// Lines with unknown codes are dropped by the extractors.
    pub fn account_name(&self, code: &str) -> Option<&str> {
        self.accounts.get(code).map(String::as_str)
    }

    /// Whether a code belongs to the manual-journal account view.
    pub fn is_journal_account(&self, code: &str) -> bool {
        self.accounts.contains_key(code) && !self.journal_excluded.contains(code)
    }

    pub fn area_for(&self, consultant_code: &str) -> Option<&str> {
        self.areas.get(consultant_code).map(String::as_str)
    }

    pub fn placement_fraction(&self, account_code: &str) -> Decimal {
        self.placements.fraction_for(account_code)
    }
}
