use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use tracing::debug;

// ── Month-end snapping ────────────────────────────────────────────────────────

/// Snap any date to the last calendar day of its month.
///
/// This is the shared join key for every table the jobs produce.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

/// The month-end that follows `date`'s month-end.
pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    let end = month_end(date);
    end.succ_opt().map(month_end).unwrap_or(end)
}

/// Every month-end from `first` to `last` inclusive (both snapped first).
pub fn month_ends_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let last = month_end(last);
    let mut current = month_end(first);
    let mut out = Vec::new();
    while current <= last {
        out.push(current);
        let next = next_month_end(current);
        if next == current {
            break;
        }
        current = next;
    }
    out
}

// ── Date parsing ──────────────────────────────────────────────────────────────

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d %b %Y", "%d %B %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a free-form date cell.
///
/// Accepts ISO dates, ISO date-times (with or without offset), slash dates
/// (month first), and month-only labels such as `2023-05`, `Jan 2020` or
/// `January 2020` (resolved to the first of the month). Returns `None` for
/// anything else so callers can treat the row as undated.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Some(date);
    }

    if let Some(date) = parse_month_label(s) {
        return Some(date);
    }

    debug!("parse_date: could not parse \"{}\"", s);
    None
}

/// Parse a `Mon YYYY` / `Month YYYY` label to the first day of that month.
pub fn parse_month_label(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("01 {}", s), "%d %b %Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("01 {}", s), "%d %B %Y"))
        .ok()
}

/// Build the first day of the month named by separate year and month-name
/// fields, e.g. (`"2023"`, `"March"`).
///
/// The year may carry a trailing `.0` (a float-typed export); month names may
/// be full or three-letter, in any case.
pub fn date_from_year_month(year: &str, month_name: &str) -> Option<NaiveDate> {
    let year = parse_year(year)?;
    let month: Month = month_name.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
}

fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 10_000.0 {
        Some(f as i32)
    } else {
        None
    }
}

// ── Month names ───────────────────────────────────────────────────────────────

/// Resolve a month token (`jan`, `Sept`, `DEC`, ...) to its full English name.
pub fn full_month_name(token: &str) -> Option<&'static str> {
    let name = match token.to_lowercase().as_str() {
        "jan" => "January",
        "feb" => "February",
        "mar" => "March",
        "apr" => "April",
        "may" => "May",
        "jun" => "June",
        "jul" => "July",
        "aug" => "August",
        "sep" | "sept" => "September",
        "oct" => "October",
        "nov" => "November",
        "dec" => "December",
        _ => return None,
    };
    Some(name)
}

/// Render a date as `Jan 2020`, the form used in coverage summaries.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── month_end ─────────────────────────────────────────────────────────────

    #[test]
    fn test_month_end_any_day_snaps_to_last_day() {
        assert_eq!(month_end(d(2020, 1, 1)), d(2020, 1, 31));
        assert_eq!(month_end(d(2020, 1, 15)), d(2020, 1, 31));
        assert_eq!(month_end(d(2020, 1, 31)), d(2020, 1, 31));
    }

    #[test]
    fn test_month_end_leap_february() {
        assert_eq!(month_end(d(2020, 2, 3)), d(2020, 2, 29));
        assert_eq!(month_end(d(2021, 2, 3)), d(2021, 2, 28));
    }

    #[test]
    fn test_month_end_december_rolls_year() {
        assert_eq!(month_end(d(2023, 12, 5)), d(2023, 12, 31));
    }

    #[test]
    fn test_next_month_end() {
        assert_eq!(next_month_end(d(2020, 1, 31)), d(2020, 2, 29));
        assert_eq!(next_month_end(d(2020, 12, 31)), d(2021, 1, 31));
    }

    #[test]
    fn test_month_ends_between_inclusive() {
        let ends = month_ends_between(d(2020, 11, 3), d(2021, 2, 1));
        assert_eq!(
            ends,
            vec![d(2020, 11, 30), d(2020, 12, 31), d(2021, 1, 31), d(2021, 2, 28)]
        );
    }

    #[test]
    fn test_month_ends_between_same_month() {
        let ends = month_ends_between(d(2020, 5, 1), d(2020, 5, 20));
        assert_eq!(ends, vec![d(2020, 5, 31)]);
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(parse_date("2023-03-15"), Some(d(2023, 3, 15)));
    }

    #[test]
    fn test_parse_date_datetime_forms() {
        assert_eq!(parse_date("2023-03-15 10:30:00"), Some(d(2023, 3, 15)));
        assert_eq!(parse_date("2023-03-15T10:30:00Z"), Some(d(2023, 3, 15)));
        assert_eq!(parse_date("2023-03-15T10:30:00+02:00"), Some(d(2023, 3, 15)));
    }

    #[test]
    fn test_parse_date_slash_is_month_first() {
        assert_eq!(parse_date("03/04/2023"), Some(d(2023, 3, 4)));
    }

    #[test]
    fn test_parse_date_month_only_forms() {
        assert_eq!(parse_date("2023-05"), Some(d(2023, 5, 1)));
        assert_eq!(parse_date("Jan 2020"), Some(d(2020, 1, 1)));
        assert_eq!(parse_date("January 2020"), Some(d(2020, 1, 1)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("NG=F"), None);
        assert_eq!(parse_date("2023-13-01"), None);
    }

    // ── parse_month_label ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_month_label() {
        assert_eq!(parse_month_label("Jan 2020"), Some(d(2020, 1, 1)));
        assert_eq!(parse_month_label(" Sep 2019 "), Some(d(2019, 9, 1)));
        assert_eq!(parse_month_label("2020-01"), None);
    }

    #[test]
    fn test_month_label_snaps_to_month_end() {
        let date = parse_month_label("Jan 2020").map(month_end);
        assert_eq!(date, Some(d(2020, 1, 31)));
    }

    // ── date_from_year_month ──────────────────────────────────────────────────

    #[test]
    fn test_date_from_year_month_full_name() {
        assert_eq!(date_from_year_month("2023", "March"), Some(d(2023, 3, 1)));
    }

    #[test]
    fn test_date_from_year_month_float_year_and_abbrev() {
        assert_eq!(date_from_year_month("2023.0", "sep"), Some(d(2023, 9, 1)));
    }

    #[test]
    fn test_date_from_year_month_invalid() {
        assert_eq!(date_from_year_month("", "March"), None);
        assert_eq!(date_from_year_month("2023", "Marchember"), None);
        assert_eq!(date_from_year_month("2023.5", "March"), None);
    }

    // Both construction paths must land on the same join key.
    #[test]
    fn test_synthesized_and_parsed_dates_share_month_end() {
        let synthesized = date_from_year_month("2022", "February").map(month_end);
        let parsed = parse_date("2022-02-14").map(month_end);
        let parsed_first = parse_date("2022-02-01").map(month_end);
        assert_eq!(synthesized, Some(d(2022, 2, 28)));
        assert_eq!(synthesized, parsed);
        assert_eq!(synthesized, parsed_first);
    }

    // ── full_month_name ───────────────────────────────────────────────────────

    #[test]
    fn test_full_month_name_case_insensitive() {
        assert_eq!(full_month_name("jan"), Some("January"));
        assert_eq!(full_month_name("DEC"), Some("December"));
        assert_eq!(full_month_name("Sept"), Some("September"));
        assert_eq!(full_month_name("sep"), Some("September"));
        assert_eq!(full_month_name("foo"), None);
    }

    #[test]
    fn test_format_month_year() {
        assert_eq!(format_month_year(d(2019, 1, 31)), "Jan 2019");
    }
}
