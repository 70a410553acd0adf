use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::period::{CompanyMonth, FiscalYear, Quarter};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("No month cutoffs configured for year {0}")]
    MissingYear(i32),
    #[error("Cutoff for {month} {year} is {date}, which is not a {month} {year} date")]
    MisplacedCutoff {
        year: i32,
        month: CompanyMonth,
        date: NaiveDate,
    },
    #[error("December {year} cutoff must be 31 December, got {date}")]
    DecemberCutoff { year: i32, date: NaiveDate },
}

/// Everything the calendar can say about one date, stamped onto ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStamp {
    pub year: i32,
    pub month: CompanyMonth,
    pub week: u8,
    pub fiscal_year: FiscalYear,
    pub quarter: Quarter,
}

/// The company's custom accounting calendar: per-year, hand-tuned month-end
/// cutoff dates. A month runs from the day after the previous cutoff through
/// its own cutoff, so month boundaries are not calendar-month aligned.
#[derive(Debug, Clone, Default)]
pub struct CutoffCalendar {
    years: BTreeMap<i32, [NaiveDate; 12]>,
}

impl CutoffCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the twelve cutoffs for one year. Each cutoff must fall inside
    /// its own calendar month (which also keeps them strictly increasing), and
    /// December's cutoff is pinned to 31 December.
    pub fn insert_year(
        &mut self,
        year: i32,
        cutoffs: [NaiveDate; 12],
    ) -> Result<(), CalendarError> {
        for (month, cutoff) in CompanyMonth::ALL.into_iter().zip(cutoffs) {
            if cutoff.year() != year || cutoff.month() as usize != month.index() + 1 {
                return Err(CalendarError::MisplacedCutoff { year, month, date: cutoff });
            }
        }
        let dec = cutoffs[CompanyMonth::Dec.index()];
        if (dec.month(), dec.day()) != (12, 31) {
            return Err(CalendarError::DecemberCutoff { year, date: dec });
        }
        self.years.insert(year, cutoffs);
        Ok(())
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// The custom month a date belongs to: the first month whose cutoff is on
    /// or after the date. The 31 December cutoff means the scan cannot fall
    /// through, but `Dec` is returned if it somehow does.
    pub fn company_month(&self, date: NaiveDate) -> Result<CompanyMonth, CalendarError> {
        let cutoffs = self
            .years
            .get(&date.year())
            .ok_or(CalendarError::MissingYear(date.year()))?;
        for (month, cutoff) in CompanyMonth::ALL.into_iter().zip(cutoffs) {
            if date <= *cutoff {
                return Ok(month);
            }
        }
        Ok(CompanyMonth::Dec)
    }

    /// 1-based week number within the custom month, aligned to the weekday of
    /// the month's start and capped at 5: the trailing days of a month that
    /// overruns calendar-week boundaries all land in the fifth bucket.
    pub fn week_of_month(&self, date: NaiveDate) -> Result<u8, CalendarError> {
        let month = self.company_month(date)?;
        let start = self.month_start(date.year(), month)?;
        let delta_days = (date - start).num_days();
        let adjusted = delta_days + i64::from(start.weekday().num_days_from_monday());
        let week = adjusted / 7 + 1;
        Ok(week.min(5) as u8)
    }

    pub fn period_of(&self, date: NaiveDate) -> Result<PeriodStamp, CalendarError> {
        let month = self.company_month(date)?;
        Ok(PeriodStamp {
            year: date.year(),
            month,
            week: self.week_of_month(date)?,
            fiscal_year: FiscalYear::containing(date),
            quarter: Quarter::for_month(month),
        })
    }

    /// First day of a custom month: the day after the previous month's cutoff.
    /// For January the lookback crosses into the prior year's December cutoff;
    /// an unconfigured prior year is unambiguous because December cutoffs are
    /// pinned to 31 December.
    fn month_start(&self, year: i32, month: CompanyMonth) -> Result<NaiveDate, CalendarError> {
        let prev_cutoff = match month.prev() {
            Some(prev) => {
                self.years
                    .get(&year)
                    .ok_or(CalendarError::MissingYear(year))?[prev.index()]
            }
            None => match self.years.get(&(year - 1)) {
                Some(cutoffs) => cutoffs[CompanyMonth::Dec.index()],
                None => NaiveDate::from_ymd_opt(year - 1, 12, 31).unwrap(),
            },
        };
        Ok(prev_cutoff + Duration::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cutoffs(year: i32, days: [u32; 12]) -> [NaiveDate; 12] {
        let mut out = [NaiveDate::MIN; 12];
        for (i, day) in days.into_iter().enumerate() {
            out[i] = date(year, i as u32 + 1, day);
        }
        out
    }

    // The production cutoff tables: 2025 closes a couple of days earlier than
    // the surrounding years in most months.
    fn calendar() -> CutoffCalendar {
        let mut cal = CutoffCalendar::new();
        cal.insert_year(2024, cutoffs(2024, [28, 25, 31, 28, 26, 30, 28, 25, 30, 27, 24, 31]))
            .unwrap();
        cal.insert_year(2025, cutoffs(2025, [26, 23, 31, 27, 25, 30, 27, 24, 30, 26, 23, 31]))
            .unwrap();
        cal.insert_year(2026, cutoffs(2026, [28, 25, 31, 28, 26, 30, 28, 25, 30, 27, 24, 31]))
            .unwrap();
        cal
    }

    #[test]
    fn company_month_scans_cutoffs_in_order() {
        let cal = calendar();
        assert_eq!(cal.company_month(date(2025, 1, 26)).unwrap(), CompanyMonth::Jan);
        assert_eq!(cal.company_month(date(2025, 1, 27)).unwrap(), CompanyMonth::Feb);
        assert_eq!(cal.company_month(date(2025, 12, 31)).unwrap(), CompanyMonth::Dec);
    }

    #[test]
    fn company_month_is_non_decreasing_across_the_year() {
        let cal = calendar();
        let mut day = date(2025, 1, 1);
        let mut last = CompanyMonth::Jan;
        while day <= date(2025, 12, 31) {
            let month = cal.company_month(day).unwrap();
            assert!(month >= last, "{day}: {month} < {last}");
            last = month;
            day += Duration::days(1);
        }
        assert_eq!(last, CompanyMonth::Dec);
    }

    #[test]
    fn missing_year_is_a_configuration_error() {
        let cal = calendar();
        assert_eq!(
            cal.company_month(date(2030, 5, 1)),
            Err(CalendarError::MissingYear(2030))
        );
        assert!(cal.week_of_month(date(2030, 5, 1)).is_err());
    }

    #[test]
    fn week_stays_in_range_for_every_configured_day() {
        let cal = calendar();
        let mut day = date(2024, 1, 1);
        while day <= date(2026, 12, 31) {
            let week = cal.week_of_month(day).unwrap();
            assert!((1..=5).contains(&week), "{day}: week {week}");
            day += Duration::days(1);
        }
    }

    #[test]
    fn week_counts_from_month_start_weekday() {
        let cal = calendar();
        // Feb 2025 starts 27 Jan, a Monday: week boundaries line up with
        // calendar weeks.
        assert_eq!(cal.week_of_month(date(2025, 1, 27)).unwrap(), 1);
        assert_eq!(cal.week_of_month(date(2025, 2, 2)).unwrap(), 1);
        assert_eq!(cal.week_of_month(date(2025, 2, 3)).unwrap(), 2);
        assert_eq!(cal.week_of_month(date(2025, 2, 10)).unwrap(), 3);
    }

    #[test]
    fn trailing_days_collapse_into_week_five() {
        let cal = calendar();
        // Mar 2025 runs 24 Feb through 31 Mar: 36 days from a Monday start,
        // so the raw week number overflows and caps.
        assert_eq!(cal.week_of_month(date(2025, 3, 31)).unwrap(), 5);
    }

    #[test]
    fn january_looks_back_into_the_prior_year() {
        let cal = calendar();
        // 2025-01-01 is a Wednesday; the month starts 1 Jan (day after the
        // 2024 Dec 31 cutoff), so the first partial week ends Sunday 5 Jan.
        assert_eq!(cal.week_of_month(date(2025, 1, 1)).unwrap(), 1);
        assert_eq!(cal.week_of_month(date(2025, 1, 5)).unwrap(), 1);
        assert_eq!(cal.week_of_month(date(2025, 1, 6)).unwrap(), 2);
    }

    #[test]
    fn january_works_without_a_prior_year_table() {
        let mut cal = CutoffCalendar::new();
        cal.insert_year(2025, cutoffs(2025, [26, 23, 31, 27, 25, 30, 27, 24, 30, 26, 23, 31]))
            .unwrap();
        // No 2024 table: the December cutoff is pinned, so January still buckets.
        assert_eq!(cal.week_of_month(date(2025, 1, 6)).unwrap(), 2);
    }

    #[test]
    fn insert_rejects_misplaced_cutoff() {
        let mut cal = CutoffCalendar::new();
        let mut bad = cutoffs(2025, [26, 23, 31, 27, 25, 30, 27, 24, 30, 26, 23, 31]);
        bad[3] = date(2025, 5, 2); // April cutoff in May
        assert!(matches!(
            cal.insert_year(2025, bad),
            Err(CalendarError::MisplacedCutoff { month: CompanyMonth::Apr, .. })
        ));
    }

    #[test]
    fn insert_rejects_december_not_on_the_31st() {
        let mut cal = CutoffCalendar::new();
        let bad = cutoffs(2025, [26, 23, 31, 27, 25, 30, 27, 24, 30, 26, 23, 30]);
        assert!(matches!(
            cal.insert_year(2025, bad),
            Err(CalendarError::DecemberCutoff { year: 2025, .. })
        ));
    }

    #[test]
    fn period_stamp_combines_month_week_fy_quarter() {
        let cal = calendar();
        let stamp = cal.period_of(date(2025, 2, 10)).unwrap();
        assert_eq!(stamp.year, 2025);
        assert_eq!(stamp.month, CompanyMonth::Feb);
        assert_eq!(stamp.week, 3);
        assert_eq!(stamp.fiscal_year.to_string(), "FY25");
        assert_eq!(stamp.quarter, Quarter::Q3);
    }
}
