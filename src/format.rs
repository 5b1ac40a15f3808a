//! Display strings for the presentation layer. Nothing here feeds back into
//! the computed numbers.

use crate::schema::Metric;

const RUPEE: &str = "₹";

/// Compact rupee amount: crore, lakh and thousand suffixes above those
/// magnitudes, a grouped number below.
pub fn format_currency(value: f64) -> String {
    let abs = value.abs();

    if abs >= 10_000_000.0 {
        format!("{}{:.1}Cr", RUPEE, value / 10_000_000.0)
    } else if abs >= 100_000.0 {
        format!("{}{:.1}L", RUPEE, value / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("{}{:.1}K", RUPEE, value / 1_000.0)
    } else {
        format!("{}{}", RUPEE, format_number(value))
    }
}

/// Signed percentage with one decimal, e.g. `+12.5%`.
pub fn format_percentage(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{}{:.1}%", sign, value)
}

/// Number with Indian digit grouping (`12,34,567.891`), at most three
/// fractional digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_indian(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

/// Formats a metric value the way its column is displayed.
pub fn format_metric(metric: Metric, value: f64) -> String {
    if metric.is_currency() {
        format_currency(value)
    } else {
        format_number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_suffixes() {
        assert_eq!(format_currency(25_000_000.0), "₹2.5Cr");
        assert_eq!(format_currency(350_000.0), "₹3.5L");
        assert_eq!(format_currency(4_560.0), "₹4.6K");
        assert_eq!(format_currency(999.5), "₹999.5");
        assert_eq!(format_currency(0.0), "₹0");
        assert_eq!(format_currency(-2_000.0), "₹-2.0K");
    }

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1_000.0), "1,000");
        assert_eq!(format_number(123_456.0), "1,23,456");
        assert_eq!(format_number(1_234_567.891), "12,34,567.891");
        assert_eq!(format_number(-98_765.4), "-98,765.4");
        assert_eq!(format_number(2.50), "2.5");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(50.0), "+50.0%");
        assert_eq!(format_percentage(0.0), "+0.0%");
        assert_eq!(format_percentage(-12.345), "-12.3%");
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Metric::Revenue, 1_500.0), "₹1.5K");
        assert_eq!(format_metric(Metric::Transactions, 1_500.0), "1,500");
        assert_eq!(format_metric(Metric::Upt, 1.0), "1");
    }
}
