use crate::error::{Result, SalesAnalyticsError};
use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Parses a payment date written as `D/M/YYYY` or `YYYY/M/D`.
///
/// Day/month-first is tried before year-first. Anything else, including other
/// separators or components that do not form a real calendar date, is a
/// [`SalesAnalyticsError::DateParse`].
pub fn parse_payment_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();

    if parts.len() != 3 || parts.iter().any(|p| !is_digits(p)) {
        return Err(date_error(text, "expected D/M/YYYY or YYYY/M/D"));
    }

    let (year, month, day) = match (parts[0].len(), parts[1].len(), parts[2].len()) {
        (1..=2, 1..=2, 4) => (parts[2], parts[1], parts[0]),
        (4, 1..=2, 1..=2) => (parts[0], parts[1], parts[2]),
        _ => return Err(date_error(text, "expected D/M/YYYY or YYYY/M/D")),
    };

    // Components are 1-4 ASCII digits, so these cannot overflow.
    let year: i32 = year.parse().map_err(|_| date_error(text, "invalid year"))?;
    let month: u32 = month.parse().map_err(|_| date_error(text, "invalid month"))?;
    let day: u32 = day.parse().map_err(|_| date_error(text, "invalid day"))?;

    if !(1..=12).contains(&month) {
        return Err(date_error(text, &format!("month {} is out of range", month)));
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| date_error(text, &format!("day {} does not exist in {}-{:02}", day, year, month)))
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn date_error(input: &str, reason: &str) -> SalesAnalyticsError {
    SalesAnalyticsError::DateParse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// `YYYY-MM` label of the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format_month_key(date.year(), date.month())
}

pub fn format_month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Moves `(year, month)` by `delta` months, carrying across year boundaries.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Month keys for the `count` calendar months ending with the month of
/// `reference`, oldest first.
pub fn trailing_month_keys(reference: NaiveDate, count: u32) -> Vec<String> {
    (0..count as i32)
        .rev()
        .map(|back| {
            let (year, month) = shift_month(reference.year(), reference.month(), -back);
            format_month_key(year, month)
        })
        .collect()
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}
