use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A financial year ending 30 June of the stored year.
/// `FiscalYear(2025)` covers 1 July 2024 through 30 June 2025 and labels as "FY25".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalYear(pub u16);

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FY{:02}", self.0 % 100)
    }
}

impl FiscalYear {
    pub fn new(year: u16) -> Self {
        FiscalYear(year)
    }

    pub fn year(self) -> u16 {
        self.0
    }

    /// The fiscal year a calendar date falls in. July starts the new year.
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year() as u16;
        if date.month() >= 7 {
            FiscalYear(year + 1)
        } else {
            FiscalYear(year)
        }
    }
}

/// Label for one month of the company's custom accounting calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompanyMonth {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl CompanyMonth {
    pub const ALL: [CompanyMonth; 12] = [
        CompanyMonth::Jan,
        CompanyMonth::Feb,
        CompanyMonth::Mar,
        CompanyMonth::Apr,
        CompanyMonth::May,
        CompanyMonth::Jun,
        CompanyMonth::Jul,
        CompanyMonth::Aug,
        CompanyMonth::Sep,
        CompanyMonth::Oct,
        CompanyMonth::Nov,
        CompanyMonth::Dec,
    ];

    /// Zero-based position in the calendar (Jan = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn prev(self) -> Option<CompanyMonth> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn label(self) -> &'static str {
        match self {
            CompanyMonth::Jan => "Jan",
            CompanyMonth::Feb => "Feb",
            CompanyMonth::Mar => "Mar",
            CompanyMonth::Apr => "Apr",
            CompanyMonth::May => "May",
            CompanyMonth::Jun => "Jun",
            CompanyMonth::Jul => "Jul",
            CompanyMonth::Aug => "Aug",
            CompanyMonth::Sep => "Sep",
            CompanyMonth::Oct => "Oct",
            CompanyMonth::Nov => "Nov",
            CompanyMonth::Dec => "Dec",
        }
    }
}

impl fmt::Display for CompanyMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompanyMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| format!("Unknown month label: '{s}'"))
    }
}

/// Fiscal quarter on the July year: Jul-Sep is Q1, Jan-Mar is Q3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quarter::Q1 => write!(f, "Q1"),
            Quarter::Q2 => write!(f, "Q2"),
            Quarter::Q3 => write!(f, "Q3"),
            Quarter::Q4 => write!(f, "Q4"),
        }
    }
}

impl Quarter {
    pub fn for_month(month: CompanyMonth) -> Self {
        use CompanyMonth::*;
        match month {
            Jul | Aug | Sep => Quarter::Q1,
            Oct | Nov | Dec => Quarter::Q2,
            Jan | Feb | Mar => Quarter::Q3,
            Apr | May | Jun => Quarter::Q4,
        }
    }
}
