//! Calendar helpers for walking the schedule archive.

use chrono::{Datelike, NaiveDate, Weekday};

/// Date segment of a schedule page URL, e.g. `02-05-2020`.
pub const SCHEDULE_PATH_FORMAT: &str = "%d-%m-%Y";

/// Date prefix of grabbed file names, e.g. `20200502`.
pub const FILE_PREFIX_FORMAT: &str = "%Y%m%d";

pub fn schedule_path_segment(date: NaiveDate) -> String {
    date.format(SCHEDULE_PATH_FORMAT).to_string()
}

pub fn file_prefix(date: NaiveDate) -> String {
    date.format(FILE_PREFIX_FORMAT).to_string()
}

/// The most recent `weekday` on or before `today`.
pub fn last_weekday_on_or_before(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let back = (7 + today.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    today - chrono::Duration::days(i64::from(back))
}

pub fn last_saturday_on_or_before(today: NaiveDate) -> NaiveDate {
    last_weekday_on_or_before(today, Weekday::Sat)
}

/// Closed date interval walked newest-first.
///
/// `Copy`, so each call to [`DateSpan::iter`] starts a fresh walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub newest: NaiveDate,
    pub oldest: NaiveDate,
}

impl DateSpan {
    pub fn new(newest: NaiveDate, oldest: NaiveDate) -> Self {
        Self { newest, oldest }
    }

    /// Whole days from `oldest` to `newest`; zero for an empty or single-day span.
    pub fn day_count(&self) -> i64 {
        (self.newest - self.oldest).num_days().max(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        let oldest = self.oldest;
        let first = (self.newest >= oldest).then_some(self.newest);
        std::iter::successors(first, |d| d.pred_opt()).take_while(move |d| *d >= oldest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_formatters() {
        assert_eq!(schedule_path_segment(ymd(2020, 5, 2)), "02-05-2020");
        assert_eq!(file_prefix(ymd(2020, 5, 2)), "20200502");
    }

    #[test]
    fn test_last_saturday() {
        // 2020-05-02 was a Saturday
        assert_eq!(last_saturday_on_or_before(ymd(2020, 5, 2)), ymd(2020, 5, 2));
        assert_eq!(last_saturday_on_or_before(ymd(2020, 5, 3)), ymd(2020, 5, 2));
        assert_eq!(last_saturday_on_or_before(ymd(2020, 5, 8)), ymd(2020, 5, 2));
        assert_eq!(last_saturday_on_or_before(ymd(2020, 5, 9)), ymd(2020, 5, 9));
    }

    #[test]
    fn test_span_walks_newest_first_inclusive() {
        let span = DateSpan::new(ymd(2013, 1, 2), ymd(2012, 12, 31));
        let dates: Vec<_> = span.iter().collect();
        assert_eq!(dates, vec![ymd(2013, 1, 2), ymd(2013, 1, 1), ymd(2012, 12, 31)]);
        assert_eq!(span.day_count(), 2);

        // restartable
        assert_eq!(span.iter().count(), 3);
    }

    #[test]
    fn test_span_edges() {
        let single = DateSpan::new(ymd(2020, 1, 1), ymd(2020, 1, 1));
        assert_eq!(single.iter().collect::<Vec<_>>(), vec![ymd(2020, 1, 1)]);
        assert_eq!(single.day_count(), 0);

        let inverted = DateSpan::new(ymd(2019, 1, 1), ymd(2020, 1, 1));
        assert_eq!(inverted.iter().count(), 0);
        assert_eq!(inverted.day_count(), 0);
    }
}
