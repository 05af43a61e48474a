//! Calendar helpers anchored to an explicit `now`.
//!
//! Nothing in here reads the system clock; callers capture `now` once per message.

use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;

fn days_ago_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s+days\s+ago").expect("valid days-ago regex"))
}

/// Turn a relative date phrase into a calendar date.
///
/// Accepts `today`, `yesterday` and `N days ago`. Anything else, including an empty
/// phrase, resolves to `now`'s date.
pub fn normalize(phrase: &str, now: NaiveDateTime) -> NaiveDate {
    let today = now.date();
    let phrase = phrase.trim();

    if phrase.is_empty() || phrase.eq_ignore_ascii_case("today") {
        return today;
    }
    if phrase.eq_ignore_ascii_case("yesterday") {
        return today.checked_sub_days(Days::new(1)).unwrap_or(today);
    }

    if let Some(caps) = days_ago_re().captures(phrase) {
        if let Ok(n) = caps[1].parse::<u64>() {
            return today.checked_sub_days(Days::new(n)).unwrap_or(today);
        }
    }

    today
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

/// Midnight of the most recent Sunday (today, if `now` is a Sunday).
pub fn start_of_week(now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let back = u64::from(today.weekday().num_days_from_sunday());
    midnight(today.checked_sub_days(Days::new(back)).unwrap_or(today))
}

pub fn start_of_month(now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    midnight(today.with_day(1).unwrap_or(today))
}

/// Day `day` of `now`'s month, counted as an offset from the first.
///
/// Days past the end of the month roll into the next month and day 0 is the last day
/// of the previous month.
pub fn day_of_month(now: NaiveDateTime, day: u32) -> NaiveDate {
    let first = start_of_month(now).date();
    first
        .checked_add_signed(TimeDelta::days(i64::from(day) - 1))
        .unwrap_or(first)
}

/// `Thu Oct 01 2026`
pub fn display_date(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn today_and_empty_resolve_to_now() {
        let now = at(2026, 10, 19, 15, 30);
        let today = now.date();
        assert_eq!(normalize("today", now), today);
        assert_eq!(normalize("ToDaY", now), today);
        assert_eq!(normalize("", now), today);
        assert_eq!(normalize("   ", now), today);
    }

    #[test]
    fn yesterday_is_one_day_back() {
        let now = at(2026, 3, 1, 0, 5);
        assert_eq!(
            normalize("Yesterday", now),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn n_days_ago_subtracts_exactly_n_days() {
        let now = at(2026, 10, 19, 23, 59);
        for n in [0u64, 1, 3, 19, 20, 45, 400] {
            let expected = now.date().checked_sub_days(Days::new(n)).unwrap();
            assert_eq!(normalize(&format!("{n} days ago"), now), expected, "n={n}");
        }
        assert_eq!(
            normalize("spent it 3  DAYS   AGO", now),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
    }

    #[test]
    fn unparseable_phrases_fall_back_to_today() {
        let now = at(2026, 10, 19, 9, 0);
        for phrase in ["last friday", "1 day ago", "tomorrow", "2026-10-01"] {
            assert_eq!(normalize(phrase, now), now.date(), "phrase={phrase}");
        }
        assert_eq!(normalize("99999999999999999999 days ago", now), now.date());
    }

    #[test]
    fn week_starts_on_sunday_midnight() {
        // 2026-10-19 is a Monday.
        for day in 11..=24 {
            let now = at(2026, 10, day, 13, 45);
            let start = start_of_week(now);
            assert_eq!(start.date().weekday(), Weekday::Sun);
            assert_eq!(start.time(), NaiveTime::MIN);
            assert!(start <= now);
            assert!(now - start < TimeDelta::days(7));
        }
    }

    #[test]
    fn month_start_is_first_at_midnight() {
        assert_eq!(start_of_month(at(2026, 10, 19, 8, 0)), at(2026, 10, 1, 0, 0));
    }

    #[test]
    fn day_of_month_rolls_over_out_of_range_days() {
        let now = at(2026, 9, 15, 12, 0); // September has 30 days
        assert_eq!(day_of_month(now, 20), NaiveDate::from_ymd_opt(2026, 9, 20).unwrap());
        assert_eq!(day_of_month(now, 31), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(day_of_month(now, 0), NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(midnight(d), at(2026, 10, 1, 0, 0));
        assert_eq!(end_of_day(d).format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
        assert_eq!(display_date(d), "Thu Oct 01 2026");
    }
}
