//! Academic-year bucketing of capture timestamps.
//!
//! An academic year runs September through August and is labelled `"2023-2024"`.
//! Capture timestamps look like `dd.mm.yyyy` with an optional ` HH:MM` suffix; the same
//! parser serves per-record resolution and the year-list bounds.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::SurveyRecord;

const FIRST_MONTH: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    pub fn starting(start: i32) -> Self {
        Self { start }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn containing(year: i32, month: u32) -> Self {
        if month >= FIRST_MONTH {
            Self::starting(year)
        } else {
            Self::starting(year - 1)
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self::containing(date.year(), date.month())
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

impl FromStr for AcademicYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-YYYY, got {s:?}"))?;
        let valid = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
        if !valid(start) || !valid(end) {
            return Err(format!("expected YYYY-YYYY, got {s:?}"));
        }
        let start: i32 = start.parse().map_err(|_| format!("bad start year in {s:?}"))?;
        let end: i32 = end.parse().map_err(|_| format!("bad end year in {s:?}"))?;
        if end != start + 1 {
            return Err(format!("academic year must span one year, got {s:?}"));
        }
        Ok(Self::starting(start))
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(value: AcademicYear) -> Self {
        value.to_string()
    }
}

/// Day, month and year integers of a capture timestamp. No calendar validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

pub fn parse_capture_date(captured_at: &str) -> Option<CaptureDate> {
    let date_part = captured_at.trim().split(' ').next()?;
    let mut parts = date_part.split('.');
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    let year = parts.next()?.trim().parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    // four-digit years only, so labels always render as YYYY-YYYY
    if !(1000..=9998).contains(&year) {
        return None;
    }
    Some(CaptureDate { day, month, year })
}

pub fn resolve(captured_at: &str) -> Option<AcademicYear> {
    parse_capture_date(captured_at).map(|date| AcademicYear::containing(date.year, date.month))
}

/// Every academic year from the earliest record's year through the one containing `today`.
pub fn list_academic_years(records: &[SurveyRecord], today: NaiveDate) -> Vec<AcademicYear> {
    let current = AcademicYear::of_date(today);
    let earliest = records
        .iter()
        .filter_map(|record| resolve(&record.captured_at))
        .map(|year| year.start())
        .min()
        .unwrap_or(current.start())
        .min(current.start());

    (earliest..=current.start()).map(AcademicYear::starting).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(captured_at: &str) -> SurveyRecord {
        SurveyRecord {
            captured_at: captured_at.to_string(),
            ..SurveyRecord::default()
        }
    }

    #[test]
    fn september_starts_a_new_year() {
        assert_eq!(resolve("15.09.2023").unwrap().to_string(), "2023-2024");
        assert_eq!(resolve("01.03.2023").unwrap().to_string(), "2022-2023");
        assert_eq!(resolve("20.12.2022").unwrap().to_string(), "2022-2023");
        assert_eq!(resolve("31.08.2023 23:59").unwrap().to_string(), "2022-2023");
        assert_eq!(resolve("01.09.2023 00:00").unwrap().to_string(), "2023-2024");
    }

    #[test]
    fn unparseable_dates_resolve_to_none() {
        for raw in ["", "2023-09-15", "15.09", "aa.09.2023", "15.09.2023.1", "Not Provided", "1.1.23"] {
            assert!(resolve(raw).is_none(), "input {raw:?}");
        }
    }

    #[test]
    fn labels_are_always_well_formed() {
        for raw in ["15.09.2023", "1.1.1999", "3.10.2030 12:00", "x", "9.9.99999"] {
            if let Some(year) = resolve(raw) {
                let label = year.to_string();
                let (a, b) = label.split_once('-').unwrap();
                assert_eq!(a.len(), 4);
                assert_eq!(b.len(), 4);
                assert!(label.chars().filter(|c| *c != '-').all(|c| c.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn parses_labels() {
        let year: AcademicYear = "2022-2023".parse().unwrap();
        assert_eq!(year, AcademicYear::starting(2022));
        assert!("2022-2024".parse::<AcademicYear>().is_err());
        assert!("22-23".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn lists_years_from_earliest_capture_to_today() {
        let records = vec![record("15.09.2023"), record("01.03.2022"), record("garbage")];
        let today = NaiveDate::from_ymd_opt(2024, 10, 2).unwrap();

        let years: Vec<String> = list_academic_years(&records, today)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(years, vec!["2021-2022", "2022-2023", "2023-2024", "2024-2025"]);
    }

    #[test]
    fn every_record_year_is_listed() {
        let records = vec![record("28.02.2020"), record("30.11.2021"), record("01.06.2023")];
        let today = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();

        let years = list_academic_years(&records, today);
        for record in &records {
            let year = resolve(&record.captured_at).unwrap();
            assert!(years.contains(&year), "{year} missing");
        }
        assert_eq!(years.first(), Some(&AcademicYear::starting(2019)));
    }

    #[test]
    fn empty_dataset_lists_only_current_year() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let years = list_academic_years(&[], today);
        assert_eq!(years, vec![AcademicYear::starting(2024)]);
    }
}
