use std::str::FromStr;

use chrono::{Datelike, Local, Months, NaiveDate};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A payroll period. Text form is `MM-YYYY`.
///
/// Field order matters: the derived `Ord` compares the year first, so
/// months sort chronologically rather than by their text form.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(fmt = "{:02}-{:04}", month, year)]
pub struct PayrollMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid payroll month `{0}`, expected MM-YYYY")]
pub struct InvalidMonth(pub String);

impl PayrollMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Construction already validated the (year, month) pair.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or_else(|| self.first_day())
    }

    /// Calendar day count, the default `workingDays` of a fresh computation.
    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    pub fn months_back(&self, n: u32) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(n))
            .map(Self::of)
            .unwrap_or(*self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl FromStr for PayrollMonth {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_string());
        let (mm, yyyy) = s.trim().split_once('-').ok_or_else(invalid)?;

        if mm.len() != 2 || yyyy.len() != 4 {
            return Err(invalid());
        }

        let month: u32 = mm.parse().map_err(|_| invalid())?;
        let year: i32 = yyyy.parse().map_err(|_| invalid())?;

        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for PayrollMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PayrollMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_mm_yyyy() {
        let month: PayrollMonth = "03-2025".parse().unwrap();

        assert_eq!(month.month(), 3);
        assert_eq!(month.year(), 2025);
        assert_eq!(month.to_string(), "03-2025");
    }

    #[test]
    fn rejects_other_formats() {
        for bad in ["2025-03", "3-2025", "13-2025", "00-2025", "03/2025", "", "ab-cdef"] {
            assert!(bad.parse::<PayrollMonth>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn day_counts_follow_the_calendar() {
        assert_eq!(PayrollMonth::new(2024, 2).unwrap().days(), 29);
        assert_eq!(PayrollMonth::new(2025, 2).unwrap().days(), 28);
        assert_eq!(PayrollMonth::new(2025, 4).unwrap().days(), 30);
        assert_eq!(PayrollMonth::new(2025, 12).unwrap().days(), 31);
    }

    #[test]
    fn orders_chronologically_not_textually() {
        let dec_2024: PayrollMonth = "12-2024".parse().unwrap();
        let jan_2025: PayrollMonth = "01-2025".parse().unwrap();

        // "01-2025" < "12-2024" as text, but not as a month.
        assert!(jan_2025.to_string() < dec_2024.to_string());
        assert!(dec_2024 < jan_2025);
    }

    #[test]
    fn steps_back_across_years() {
        let month = PayrollMonth::new(2025, 2).unwrap();

        assert_eq!(month.months_back(3), PayrollMonth::new(2024, 11).unwrap());
        assert_eq!(month.months_back(0), month);
    }

    #[test]
    fn serde_uses_text_form() {
        let month = PayrollMonth::new(2025, 7).unwrap();
        let json = serde_json::to_string(&month).unwrap();

        assert_eq!(json, "\"07-2025\"");
        assert_eq!(serde_json::from_str::<PayrollMonth>(&json).unwrap(), month);
    }
}
