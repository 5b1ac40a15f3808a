//! Calendar bucketing and period-over-period comparison.
//!
//! Transactions whose payment date does not parse are left out of every
//! bucket here; they still count in plain dimension grouping.

use crate::dates::{month_key, month_name, parse_payment_date, trailing_month_keys};
use crate::grouping::{group_key, ALL_TRANSACTIONS_KEY};
use crate::metrics::{growth_rate, MetricAccumulator, MetricVector};
use crate::schema::{Dimension, Metric, Transaction};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of months in the month-over-month window, ending at the reference month.
pub const TRAILING_MONTHS: u32 = 6;

pub const TOTAL_ROW_LABEL: &str = "Total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PeriodGranularity {
    Month,
    Year,
}

/// Metrics for one (key, period) pair. `period` is `YYYY-MM` or `YYYY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    pub key: String,
    pub period: String,
    #[serde(flatten)]
    pub metrics: MetricVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell {
    pub period: String,
    pub value: f64,
    /// Change against the previous cell in the same row; 0 for the first.
    pub growth: f64,
}

/// One dimension value across the trailing months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverMonthRow {
    pub name: String,
    pub months: Vec<MonthCell>,
    pub total: f64,
}

/// Column sums across month-over-month rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverMonthTotals {
    /// Sum of each trailing month's value over all rows, oldest month first.
    pub month_totals: Vec<f64>,
    /// Sum of the row totals.
    pub grand_total: f64,
}

/// Sums every month column and the row totals. With no rows each month sums
/// to 0.
pub fn month_over_month_totals(rows: &[MonthOverMonthRow]) -> MonthOverMonthTotals {
    let mut month_totals = vec![0.0; TRAILING_MONTHS as usize];
    let mut grand_total = 0.0;

    for row in rows {
        if month_totals.len() < row.months.len() {
            month_totals.resize(row.months.len(), 0.0);
        }
        for (sum, cell) in month_totals.iter_mut().zip(&row.months) {
            *sum += cell.value;
        }
        grand_total += row.total;
    }

    MonthOverMonthTotals {
        month_totals,
        grand_total,
    }
}

/// One calendar month (or the totals row) of a year-over-year comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub label: String,
    pub is_total: bool,
    pub year_a: i32,
    pub year_b: i32,
    pub year_a_value: f64,
    pub year_b_value: f64,
    pub growth: f64,
}

/// Pairs each transaction with its parsed date, dropping the ones that fail.
fn dated_transactions(transactions: &[Transaction]) -> Vec<(&Transaction, NaiveDate)> {
    let mut dated = Vec::with_capacity(transactions.len());
    let mut failures = 0usize;

    for transaction in transactions {
        match parse_payment_date(&transaction.payment_date) {
            Ok(date) => dated.push((transaction, date)),
            Err(e) => {
                debug!("Excluding transaction from period buckets: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        warn!(
            "{} of {} transactions have unrecognized payment dates and were left out of period buckets",
            failures,
            transactions.len()
        );
    }

    dated
}

/// Number of transactions that cannot be placed in any calendar period.
pub fn count_unbucketable(transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter(|t| parse_payment_date(&t.payment_date).is_err())
        .count()
}

fn period_label(date: NaiveDate, granularity: PeriodGranularity) -> String {
    match granularity {
        PeriodGranularity::Month => month_key(date),
        PeriodGranularity::Year => format!("{:04}", date.year()),
    }
}

/// Key -> period -> metrics, keys in first-seen order.
fn bucket_table(
    transactions: &[Transaction],
    dimension: Option<Dimension>,
    granularity: PeriodGranularity,
) -> Vec<(String, BTreeMap<String, MetricVector>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<(&str, BTreeMap<String, MetricAccumulator>)> = Vec::new();

    for (transaction, date) in dated_transactions(transactions) {
        let key = match dimension {
            Some(dimension) => group_key(transaction, dimension),
            None => ALL_TRANSACTIONS_KEY,
        };
        let slot = *index.entry(key).or_insert_with(|| {
            rows.push((key, BTreeMap::new()));
            rows.len() - 1
        });
        rows[slot]
            .1
            .entry(period_label(date, granularity))
            .or_default()
            .add(transaction);
    }

    rows.into_iter()
        .map(|(key, periods)| {
            let periods = periods
                .into_iter()
                .map(|(period, acc)| (period, acc.finish()))
                .collect();
            (key.to_string(), periods)
        })
        .collect()
}

fn flatten_buckets(table: Vec<(String, BTreeMap<String, MetricVector>)>) -> Vec<PeriodBucket> {
    table
        .into_iter()
        .flat_map(|(key, periods)| {
            periods.into_iter().map(move |(period, metrics)| PeriodBucket {
                key: key.clone(),
                period,
                metrics,
            })
        })
        .collect()
}

/// Buckets by `YYYY-MM`, optionally split by a dimension.
///
/// Ordered by key (first seen) and then chronologically.
pub fn bucket_by_month(
    transactions: &[Transaction],
    dimension: Option<Dimension>,
) -> Vec<PeriodBucket> {
    flatten_buckets(bucket_table(transactions, dimension, PeriodGranularity::Month))
}

pub fn bucket_by_year(
    transactions: &[Transaction],
    dimension: Option<Dimension>,
) -> Vec<PeriodBucket> {
    flatten_buckets(bucket_table(transactions, dimension, PeriodGranularity::Year))
}

/// Trailing-month view: one row per dimension value, one cell per month of
/// the [`TRAILING_MONTHS`] ending at `reference`'s month.
///
/// Months without transactions for a row hold 0.
pub fn compare_month_over_month(
    transactions: &[Transaction],
    dimension: Option<Dimension>,
    metric: Metric,
    reference: NaiveDate,
) -> Vec<MonthOverMonthRow> {
    let months = trailing_month_keys(reference, TRAILING_MONTHS);
    let table = bucket_table(transactions, dimension, PeriodGranularity::Month);
    debug!(
        "Month-over-month: {} rows over {}..{}",
        table.len(),
        months.first().map(String::as_str).unwrap_or_default(),
        months.last().map(String::as_str).unwrap_or_default()
    );

    table
        .into_iter()
        .map(|(name, periods)| {
            let mut cells = Vec::with_capacity(months.len());
            let mut total = 0.0;
            let mut previous: Option<f64> = None;

            for period in &months {
                let value = periods
                    .get(period)
                    .map(|m| m.value(metric))
                    .unwrap_or(0.0);
                let growth = previous.map_or(0.0, |prev| growth_rate(prev, value));
                total += value;
                previous = Some(value);
                cells.push(MonthCell {
                    period: period.clone(),
                    value,
                    growth,
                });
            }

            MonthOverMonthRow {
                name,
                months: cells,
                total,
            }
        })
        .collect()
}

/// January..December of `year_a` against `year_b`, followed by a totals row.
///
/// Growth runs from `year_a` to `year_b`. The totals row sums the twelve
/// monthly values per year and takes its growth from those sums.
pub fn compare_year_over_year(
    transactions: &[Transaction],
    metric: Metric,
    year_a: i32,
    year_b: i32,
) -> Vec<ComparisonRow> {
    if transactions.is_empty() {
        return Vec::new();
    }

    let mut cells: [[MetricAccumulator; 2]; 12] = Default::default();
    for (transaction, date) in dated_transactions(transactions) {
        let month = date.month0() as usize;
        if date.year() == year_a {
            cells[month][0].add(transaction);
        }
        if date.year() == year_b {
            cells[month][1].add(transaction);
        }
    }

    let mut rows = Vec::with_capacity(13);
    let mut total_a = 0.0;
    let mut total_b = 0.0;

    for (month0, [a, b]) in cells.iter().enumerate() {
        let value_a = a.finish().value(metric);
        let value_b = b.finish().value(metric);
        total_a += value_a;
        total_b += value_b;
        rows.push(ComparisonRow {
            label: month_name(month0 as u32 + 1).to_string(),
            is_total: false,
            year_a,
            year_b,
            year_a_value: value_a,
            year_b_value: value_b,
            growth: growth_rate(value_a, value_b),
        });
    }

    rows.push(ComparisonRow {
        label: TOTAL_ROW_LABEL.to_string(),
        is_total: true,
        year_a,
        year_b,
        year_a_value: total_a,
        year_b_value: total_b,
        growth: growth_rate(total_a, total_b),
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(value: f64, date: &str, member: &str, product: &str) -> Transaction {
        Transaction {
            payment_value: value,
            payment_date: date.to_string(),
            member_id: member.to_string(),
            product: Some(product.to_string()),
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_buckets_without_dimension() {
        let txs = vec![
            tx(100.0, "1/1/2024", "A", "Pass"),
            tx(200.0, "1/1/2024", "B", "Pass"),
            tx(50.0, "1/2/2024", "A", "Pass"),
        ];

        let buckets = bucket_by_month(&txs, None);
        assert_eq!(buckets.len(), 2);

        let jan = &buckets[0];
        assert_eq!(jan.key, ALL_TRANSACTIONS_KEY);
        assert_eq!(jan.period, "2024-01");
        assert!((jan.metrics.total_value - 300.0).abs() < 1e-9);
        assert_eq!(jan.metrics.transaction_count, 2);
        assert_eq!(jan.metrics.unique_member_count, 2);
        assert!((jan.metrics.atv - 150.0).abs() < 1e-9);

        let feb = &buckets[1];
        assert_eq!(feb.period, "2024-02");
        assert!((feb.metrics.total_value - 50.0).abs() < 1e-9);
        assert_eq!(feb.metrics.transaction_count, 1);
        assert_eq!(feb.metrics.unique_member_count, 1);
        assert!((feb.metrics.atv - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_yearly_buckets_by_product() {
        let txs = vec![
            tx(10.0, "2023/5/1", "A", "Pass"),
            tx(20.0, "2024/5/1", "A", "Mat"),
            tx(30.0, "2024/6/1", "B", "Pass"),
        ];

        let buckets = bucket_by_year(&txs, Some(Dimension::Product));
        let labels: Vec<(&str, &str)> = buckets
            .iter()
            .map(|b| (b.key.as_str(), b.period.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("Pass", "2023"), ("Pass", "2024"), ("Mat", "2024")]
        );
    }

    #[test]
    fn test_unparseable_dates_are_not_bucketed() {
        let txs = vec![
            tx(100.0, "1/1/2024", "A", "Pass"),
            tx(999.0, "not-a-date", "B", "Pass"),
        ];

        let buckets = bucket_by_month(&txs, Some(Dimension::Product));
        assert_eq!(buckets.len(), 1);
        assert!((buckets[0].metrics.total_value - 100.0).abs() < 1e-9);
        assert_eq!(count_unbucketable(&txs), 1);
    }

    #[test]
    fn test_month_over_month_window_and_zero_fill() {
        let txs = vec![
            tx(100.0, "10/12/2023", "A", "Pass"),
            tx(150.0, "3/2/2024", "B", "Pass"),
            tx(80.0, "4/2/2024", "C", "Mat"),
            // Outside the window.
            tx(500.0, "1/6/2023", "D", "Pass"),
            // Only outside the window, still gets a row of zeros.
            tx(40.0, "1/1/2020", "E", "Towel"),
        ];
        let reference = ymd(2024, 2, 20);

        let rows = compare_month_over_month(&txs, Some(Dimension::Product), Metric::Revenue, reference);
        assert_eq!(rows.len(), 3);

        let pass = &rows[0];
        assert_eq!(pass.name, "Pass");
        let periods: Vec<&str> = pass.months.iter().map(|c| c.period.as_str()).collect();
        assert_eq!(
            periods,
            vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
        );
        let values: Vec<f64> = pass.months.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 100.0, 0.0, 150.0]);
        assert!((pass.total - 250.0).abs() < 1e-9);
        assert_eq!(pass.months[0].growth, 0.0);
        assert!((pass.months[4].growth + 100.0).abs() < 1e-9);
        // Zero baseline.
        assert_eq!(pass.months[5].growth, 0.0);

        assert_eq!(rows[1].name, "Mat");
        assert!((rows[1].total - 80.0).abs() < 1e-9);

        assert_eq!(rows[2].name, "Towel");
        assert!(rows[2].months.iter().all(|c| c.value == 0.0));
        assert_eq!(rows[2].total, 0.0);
    }

    #[test]
    fn test_month_over_month_metric_selection() {
        let txs = vec![
            tx(100.0, "1/1/2024", "A", "Pass"),
            tx(200.0, "1/1/2024", "B", "Pass"),
            tx(50.0, "1/2/2024", "A", "Pass"),
        ];
        let reference = ymd(2024, 2, 1);

        let rows = compare_month_over_month(&txs, None, Metric::Atv, reference);
        assert_eq!(rows.len(), 1);
        let jan = &rows[0].months[4];
        let feb = &rows[0].months[5];
        assert!((jan.value - 150.0).abs() < 1e-9);
        assert!((feb.value - 50.0).abs() < 1e-9);
        assert!((feb.growth - (50.0 - 150.0) / 150.0 * 100.0).abs() < 1e-9);

        let rows = compare_month_over_month(&txs, None, Metric::Members, reference);
        assert_eq!(rows[0].months[4].value, 2.0);
        assert_eq!(rows[0].months[5].value, 1.0);
    }

    #[test]
    fn test_month_over_month_column_totals() {
        let txs = vec![
            tx(100.0, "5/1/2024", "A", "Pass"),
            tx(40.0, "6/1/2024", "B", "Mat"),
            tx(60.0, "7/2/2024", "C", "Mat"),
            tx(25.0, "8/2/2024", "A", "Towel"),
        ];
        let rows = compare_month_over_month(&txs, Some(Dimension::Product), Metric::Revenue, ymd(2024, 2, 10));

        let totals = month_over_month_totals(&rows);
        assert_eq!(totals.month_totals, vec![0.0, 0.0, 0.0, 0.0, 140.0, 85.0]);
        assert!((totals.grand_total - 225.0).abs() < 1e-9);

        let row_sum: f64 = rows.iter().map(|r| r.total).sum();
        assert!((totals.grand_total - row_sum).abs() < 1e-9);
    }

    #[test]
    fn test_month_over_month_totals_without_rows() {
        let totals = month_over_month_totals(&[]);
        assert_eq!(totals.month_totals, vec![0.0; TRAILING_MONTHS as usize]);
        assert_eq!(totals.grand_total, 0.0);
    }

    #[test]
    fn test_year_over_year_growth() {
        let txs = vec![
            tx(600.0, "15/1/2024", "A", "Pass"),
            tx(400.0, "15/7/2024", "B", "Pass"),
            tx(900.0, "2025/1/10", "A", "Pass"),
            tx(600.0, "2025/7/10", "C", "Pass"),
            tx(1.0, "1/1/2023", "Z", "Pass"),
        ];

        let rows = compare_year_over_year(&txs, Metric::Revenue, 2024, 2025);
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0].label, "January");
        assert_eq!(rows[11].label, "December");

        assert!((rows[0].year_a_value - 600.0).abs() < 1e-9);
        assert!((rows[0].year_b_value - 900.0).abs() < 1e-9);
        assert!((rows[0].growth - 50.0).abs() < 1e-9);
        assert_eq!(rows[1].growth, 0.0);

        let total = &rows[12];
        assert!(total.is_total);
        assert_eq!(total.label, TOTAL_ROW_LABEL);
        assert!((total.year_a_value - 1000.0).abs() < 1e-9);
        assert!((total.year_b_value - 1500.0).abs() < 1e-9);
        assert!((total.growth - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_over_year_zero_baseline() {
        let txs = vec![tx(1500.0, "1/3/2025", "A", "Pass")];

        let rows = compare_year_over_year(&txs, Metric::Revenue, 2024, 2025);
        let total = rows.last().unwrap();
        assert_eq!(total.year_a_value, 0.0);
        assert!((total.year_b_value - 1500.0).abs() < 1e-9);
        assert_eq!(total.growth, 0.0);
        assert!(rows.iter().all(|r| r.growth.is_finite()));
    }

    #[test]
    fn test_total_growth_uses_totals_not_mean_of_months() {
        let txs = vec![
            tx(1.0, "1/1/2024", "A", "Pass"),
            tx(3.0, "1/1/2025", "A", "Pass"),
            tx(100.0, "1/2/2024", "A", "Pass"),
            tx(100.0, "1/2/2025", "A", "Pass"),
        ];

        let rows = compare_year_over_year(&txs, Metric::Revenue, 2024, 2025);
        assert!((rows[0].growth - 200.0).abs() < 1e-9);
        assert_eq!(rows[1].growth, 0.0);
        let total = &rows[12];
        assert!((total.growth - (103.0 - 101.0) / 101.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let reference = ymd(2024, 1, 1);
        assert!(bucket_by_month(&[], None).is_empty());
        assert!(bucket_by_year(&[], Some(Dimension::Seller)).is_empty());
        assert!(compare_month_over_month(&[], Some(Dimension::Product), Metric::Revenue, reference).is_empty());
        assert!(compare_year_over_year(&[], Metric::Revenue, 2023, 2024).is_empty());
    }
}
