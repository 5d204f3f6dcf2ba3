//! Time windows and traversal order.

use chrono::NaiveDate;
use rain_common::{DayPath, YearMonth};
use serde::{Deserialize, Serialize};

/// Direction a scan walks through periods and days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Oldest first; finds the onset of an event.
    Ascending,
    /// Newest first; finds the most recent event.
    Descending,
}

impl Traversal {
    /// Put an ascending sequence into traversal order.
    pub fn order<T>(&self, mut ascending: Vec<T>) -> Vec<T> {
        if *self == Traversal::Descending {
            ascending.reverse();
        }
        ascending
    }
}

impl std::fmt::Display for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Traversal::Ascending => write!(f, "ascending"),
            Traversal::Descending => write!(f, "descending"),
        }
    }
}

/// Dates a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// A single day.
    Date(NaiveDate),
    /// Inclusive day range.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// A whole month.
    Month(YearMonth),
    /// The anchor's month and the `count - 1` months before it, up to the
    /// anchor day.
    RecentMonths { count: u32, anchor: NaiveDate },
}

impl TimeWindow {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TimeWindow::DateRange { start, end } if start > end => {
                Err(format!("date range starts after it ends ({start} > {end})"))
            }
            TimeWindow::RecentMonths { count: 0, .. } => {
                Err("recent_months needs a count of at least 1".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Candidate periods in ascending order.
    pub fn periods_ascending(&self) -> Vec<YearMonth> {
        match *self {
            TimeWindow::Date(date) => vec![YearMonth::from_date(date)],
            TimeWindow::Month(period) => vec![period],
            TimeWindow::DateRange { start, end } => {
                let last = YearMonth::from_date(end);
                let mut period = YearMonth::from_date(start);
                let mut periods = Vec::new();
                while period <= last {
                    periods.push(period);
                    period = period.next();
                }
                periods
            }
            TimeWindow::RecentMonths { count, anchor } => {
                let mut period = YearMonth::from_date(anchor);
                let mut periods = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    periods.push(period);
                    period = period.previous();
                }
                periods.reverse();
                periods
            }
        }
    }

    /// Candidate periods in traversal order.
    pub fn periods(&self, traversal: Traversal) -> Vec<YearMonth> {
        traversal.order(self.periods_ascending())
    }

    /// Whether a listed day falls inside the window.
    pub fn admits(&self, day: &DayPath) -> bool {
        let date = day.date;
        match *self {
            TimeWindow::Date(d) => date == d,
            TimeWindow::DateRange { start, end } => start <= date && date <= end,
            TimeWindow::Month(period) => period.contains(date),
            TimeWindow::RecentMonths { anchor, .. } => date <= anchor,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::Date(d) => write!(f, "{d}"),
            TimeWindow::DateRange { start, end } => write!(f, "{start}..={end}"),
            TimeWindow::Month(period) => write!(f, "{period}"),
            TimeWindow::RecentMonths { count, anchor } => {
                write!(f, "{count} month(s) up to {anchor}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_recent_months_rolls_over_year() {
        let window = TimeWindow::RecentMonths {
            count: 3,
            anchor: ymd(2026, 1, 15),
        };
        assert_eq!(
            window.periods(Traversal::Descending),
            vec![ym(2026, 1), ym(2025, 12), ym(2025, 11)]
        );
        assert_eq!(
            window.periods(Traversal::Ascending),
            vec![ym(2025, 11), ym(2025, 12), ym(2026, 1)]
        );
    }

    #[test]
    fn test_recent_months_excludes_days_after_anchor() {
        let window = TimeWindow::RecentMonths {
            count: 1,
            anchor: ymd(2026, 1, 15),
        };
        assert!(window.admits(&DayPath::new(ymd(2026, 1, 15))));
        assert!(!window.admits(&DayPath::new(ymd(2026, 1, 16))));
    }

    #[test]
    fn test_date_range_spans_months() {
        let window = TimeWindow::DateRange {
            start: ymd(2024, 10, 30),
            end: ymd(2025, 1, 2),
        };
        assert_eq!(
            window.periods(Traversal::Ascending),
            vec![ym(2024, 10), ym(2024, 11), ym(2024, 12), ym(2025, 1)]
        );
        assert!(window.admits(&DayPath::new(ymd(2024, 10, 30))));
        assert!(!window.admits(&DayPath::new(ymd(2024, 10, 29))));
        assert!(window.admits(&DayPath::new(ymd(2025, 1, 2))));
    }

    #[test]
    fn test_single_date() {
        let window = TimeWindow::Date(ymd(2024, 11, 17));
        assert_eq!(window.periods(Traversal::Descending), vec![ym(2024, 11)]);
        assert!(window.admits(&DayPath::new(ymd(2024, 11, 17))));
        assert!(!window.admits(&DayPath::new(ymd(2024, 11, 18))));
    }

    #[test]
    fn test_validate() {
        assert!(TimeWindow::DateRange {
            start: ymd(2024, 11, 20),
            end: ymd(2024, 11, 15)
        }
        .validate()
        .is_err());
        assert!(TimeWindow::RecentMonths {
            count: 0,
            anchor: ymd(2026, 1, 1)
        }
        .validate()
        .is_err());
        assert!(TimeWindow::Month(ym(2024, 11)).validate().is_ok());
    }
}
