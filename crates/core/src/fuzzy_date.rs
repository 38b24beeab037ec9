//! Free-text date entry.
//!
//! Staff type dates into a smart date-picker in whatever shape comes to mind: `12/3/2024`,
//! `2024-03-12`, `12032024`, `hôm qua`, `3 tháng trước`. This module turns such text into a
//! calendar date relative to a supplied `today`.

use chrono::{Datelike, Days, Months, NaiveDate};

/// Parse `text` into a date, or `None` if it is not recognised or not a real calendar date.
///
/// Day-first ordering is assumed for numeric dates unless the first group has four digits.
pub fn parse_fuzzy_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    match text.as_str() {
        "hôm nay" | "nay" | "today" => return Some(today),
        "hôm qua" | "qua" | "yesterday" => return today.pred_opt(),
        "ngày mai" | "mai" | "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    parse_relative(&text, today).or_else(|| parse_numeric(&text, today))
}

/// `N <unit> trước` / `N <unit> ago`.
fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let [count, unit, suffix] = words.as_slice() else {
        return None;
    };
    if !matches!(*suffix, "trước" | "ago") {
        return None;
    }
    let count: u32 = count.parse().ok()?;

    match *unit {
        "ngày" | "day" | "days" => today.checked_sub_days(Days::new(u64::from(count))),
        "tuần" | "week" | "weeks" => today.checked_sub_days(Days::new(u64::from(count) * 7)),
        "tháng" | "month" | "months" => today.checked_sub_months(Months::new(count)),
        "năm" | "year" | "years" => today.checked_sub_months(Months::new(count.checked_mul(12)?)),
        _ => None,
    }
}

fn parse_numeric(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let day = text[0..2].parse().ok()?;
        let month = text[2..4].parse().ok()?;
        let year = text[4..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let parts: Vec<&str> = text.split(['/', '-', '.']).map(str::trim).collect();
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    match parts.as_slice() {
        [year, month, day] if year.len() == 4 => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
        }
        [day, month, year] => {
            let day: u32 = day.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            match year.len() {
                4 => NaiveDate::from_ymd_opt(year.parse().ok()?, month, day),
                2 => two_digit_year(year.parse().ok()?, month, day, today),
                _ => None,
            }
        }
        [day, month] => NaiveDate::from_ymd_opt(today.year(), month.parse().ok()?, day.parse().ok()?),
        _ => None,
    }
}

/// `YY` means 20YY unless that lands after `today`, in which case 19YY.
fn two_digit_year(yy: i32, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(2000 + yy, month, day) {
        Some(date) if date <= today => Some(date),
        _ => NaiveDate::from_ymd_opt(1900 + yy, month, day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn today() -> NaiveDate {
        date(2026, 10, 19)
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_fuzzy_date("Hôm nay", today()), Some(today()));
        assert_eq!(parse_fuzzy_date("  hôm qua ", today()), Some(date(2026, 10, 18)));
        assert_eq!(parse_fuzzy_date("tomorrow", today()), Some(date(2026, 10, 20)));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(parse_fuzzy_date("5 ngày trước", today()), Some(date(2026, 10, 14)));
        assert_eq!(parse_fuzzy_date("2 tuần trước", today()), Some(date(2026, 10, 5)));
        assert_eq!(parse_fuzzy_date("3 tháng trước", today()), Some(date(2026, 7, 19)));
        assert_eq!(parse_fuzzy_date("2 years ago", today()), Some(date(2024, 10, 19)));
        assert_eq!(parse_fuzzy_date("2 years later", today()), None);
    }

    #[test]
    fn day_first_numeric_dates() {
        assert_eq!(parse_fuzzy_date("12/3/2024", today()), Some(date(2024, 3, 12)));
        assert_eq!(parse_fuzzy_date("12-03-2024", today()), Some(date(2024, 3, 12)));
        assert_eq!(parse_fuzzy_date("12.03.2024", today()), Some(date(2024, 3, 12)));
        assert_eq!(parse_fuzzy_date("12032024", today()), Some(date(2024, 3, 12)));
    }

    #[test]
    fn iso_dates() {
        assert_eq!(parse_fuzzy_date("2024-03-12", today()), Some(date(2024, 3, 12)));
    }

    #[test]
    fn day_month_uses_current_year() {
        assert_eq!(parse_fuzzy_date("1/6", today()), Some(date(2026, 6, 1)));
    }

    #[test]
    fn two_digit_years_never_land_in_the_future() {
        assert_eq!(parse_fuzzy_date("05/01/24", today()), Some(date(2024, 1, 5)));
        assert_eq!(parse_fuzzy_date("05/01/85", today()), Some(date(1985, 1, 5)));
        assert_eq!(parse_fuzzy_date("20/10/26", today()), Some(date(1926, 10, 20)));
    }

    #[test]
    fn rejects_impossible_dates_and_noise() {
        assert_eq!(parse_fuzzy_date("31/02/2024", today()), None);
        assert_eq!(parse_fuzzy_date("abc", today()), None);
        assert_eq!(parse_fuzzy_date("12//2024", today()), None);
        assert_eq!(parse_fuzzy_date("", today()), None);
    }
}
