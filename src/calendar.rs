use crate::models::{CalendarDay, SummaryRow};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

pub const MIN_CALENDAR_DAYS: i64 = 18 * 7;

#[derive(Debug, Clone)]
pub struct HabitSchedule {
    pub created_at: NaiveDate,
    pub week_days: Vec<u8>,
}

impl HabitSchedule {
    pub fn is_possible_on(&self, date: NaiveDate) -> bool {
        self.created_at <= date && self.week_days.contains(&week_day(date))
    }
}

// Sunday = 0. Stored on day rows and used by every weekday comparison.
pub fn week_day(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// Dates are stored as `YYYY-MM-DD` text and compared lexically, which only
// orders correctly for four-digit years.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        zoned.with_timezone(&Local).date_naive()
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.date()
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?
    };
    (0..=9999).contains(&date.year()).then_some(date)
}

pub fn progress_percentage(completed: u32, amount: u32) -> u8 {
    if amount == 0 {
        return 0;
    }
    let pct = (f64::from(completed) / f64::from(amount) * 100.0).round();
    pct.min(100.0) as u8
}

pub fn calendar_start(today: NaiveDate) -> NaiveDate {
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let min_start = today - Duration::days(MIN_CALENDAR_DAYS - 1);
    year_start.min(min_start)
}

pub fn build_calendar_at(
    today: NaiveDate,
    summary: &[SummaryRow],
    schedules: &[HabitSchedule],
) -> Vec<CalendarDay> {
    let touched: HashMap<NaiveDate, &SummaryRow> =
        summary.iter().map(|row| (row.date, row)).collect();

    let start = calendar_start(today);
    let mut days = Vec::with_capacity((today - start).num_days().max(0) as usize + 1);

    for date in start.iter_days().take_while(|date| *date <= today) {
        let (completed, amount) = match touched.get(&date) {
            Some(row) => (row.completed, row.amount),
            None => {
                let amount = schedules
                    .iter()
                    .filter(|schedule| schedule.is_possible_on(date))
                    .count() as u32;
                (0, amount)
            }
        };

        days.push(CalendarDay {
            date,
            completed,
            amount,
            progress: progress_percentage(completed, amount),
        });
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_day_starts_on_sunday() {
        assert_eq!(week_day(ymd(2026, 10, 18)), 0);
        assert_eq!(week_day(ymd(2026, 10, 19)), 1);
        assert_eq!(week_day(ymd(2026, 10, 24)), 6);
    }

    #[test]
    fn parses_bare_and_naive_dates() {
        assert_eq!(parse_date_input("2026-03-04"), Some(ymd(2026, 3, 4)));
        assert_eq!(
            parse_date_input("2026-03-04T23:59:59.500"),
            Some(ymd(2026, 3, 4))
        );
        assert_eq!(parse_date_input("not a date"), None);
        assert_eq!(parse_date_input("9999-12-31"), Some(ymd(9999, 12, 31)));
        assert_eq!(parse_date_input(""), None);
    }

    #[test]
    fn rejects_years_that_break_text_ordering() {
        assert_eq!(parse_date_input("10000-01-01"), None);
        assert_eq!(parse_date_input("+10000-01-01"), None);
        assert_eq!(parse_date_input("-0001-06-01"), None);
    }

    #[test]
    fn parses_zoned_timestamp_into_local_date() {
        let raw = "2026-03-04T12:00:00Z";
        let expected = DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(parse_date_input(raw), Some(expected));
    }

    #[test]
    fn progress_rounds_and_handles_zero_amount() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(3, 3), 100);
        assert_eq!(progress_percentage(4, 3), 100);
    }

    #[test]
    fn calendar_spans_at_least_eighteen_weeks() {
        let today = ymd(2026, 2, 10);
        let days = build_calendar_at(today, &[], &[]);
        assert_eq!(days.len() as i64, MIN_CALENDAR_DAYS);
        assert_eq!(days.last().unwrap().date, today);
    }

    #[test]
    fn calendar_starts_at_year_beginning_late_in_year() {
        let today = ymd(2026, 10, 19);
        let days = build_calendar_at(today, &[], &[]);
        assert_eq!(days.first().unwrap().date, ymd(2026, 1, 1));
        assert_eq!(days.last().unwrap().date, today);
        assert_eq!(days.len(), 292);
    }

    #[test]
    fn calendar_merges_touched_days_and_fills_the_rest() {
        let today = ymd(2026, 10, 21);
        let schedules = vec![HabitSchedule {
            created_at: ymd(2026, 10, 19),
            week_days: vec![1, 3, 5],
        }];
        let summary = vec![SummaryRow {
            id: "day-1".into(),
            date: ymd(2026, 10, 19),
            completed: 1,
            amount: 1,
        }];

        let days = build_calendar_at(today, &summary, &schedules);
        let find = |date: NaiveDate| days.iter().find(|day| day.date == date).unwrap();

        let monday = find(ymd(2026, 10, 19));
        assert_eq!((monday.completed, monday.amount, monday.progress), (1, 1, 100));

        let tuesday = find(ymd(2026, 10, 20));
        assert_eq!((tuesday.completed, tuesday.amount), (0, 0));

        let wednesday = find(ymd(2026, 10, 21));
        assert_eq!((wednesday.completed, wednesday.amount, wednesday.progress), (0, 1, 0));

        let before_creation = find(ymd(2026, 10, 16));
        assert_eq!(before_creation.amount, 0);
    }
}
