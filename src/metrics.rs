use crate::dates::{parse_payment_date, shift_month};
use crate::schema::{Metric, Transaction};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Totals and derived ratios for one set of transactions.
///
/// Every ratio is 0 when its denominator is 0, so all fields are finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricVector {
    pub total_value: f64,
    pub transaction_count: usize,
    /// One unit per transaction.
    pub units_sold: usize,
    pub unique_member_count: usize,
    pub atv: f64,
    pub auv: f64,
    pub asv: f64,
    pub upt: f64,
}

impl MetricVector {
    pub fn from_totals(
        total_value: f64,
        transaction_count: usize,
        units_sold: usize,
        unique_member_count: usize,
    ) -> Self {
        Self {
            total_value,
            transaction_count,
            units_sold,
            unique_member_count,
            atv: safe_ratio(total_value, transaction_count as f64),
            auv: safe_ratio(total_value, units_sold as f64),
            asv: safe_ratio(total_value, unique_member_count as f64),
            upt: safe_ratio(units_sold as f64, transaction_count as f64),
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Revenue => self.total_value,
            Metric::Transactions => self.transaction_count as f64,
            Metric::Members => self.unique_member_count as f64,
            Metric::Atv => self.atv,
            Metric::Auv => self.auv,
            Metric::Asv => self.asv,
            Metric::Upt => self.upt,
        }
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Percentage change from `previous` to `current`; 0 for a zero baseline.
pub fn growth_rate(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Running sums for one group or bucket. The member set never leaves this
/// type; callers only see the count through [`MetricAccumulator::finish`].
#[derive(Debug, Default)]
pub(crate) struct MetricAccumulator<'a> {
    total_value: f64,
    transaction_count: usize,
    members: HashSet<&'a str>,
}

impl<'a> MetricAccumulator<'a> {
    pub(crate) fn add(&mut self, transaction: &'a Transaction) {
        self.total_value += transaction.payment_value;
        self.transaction_count += 1;
        self.members.insert(transaction.member_id.as_str());
    }

    pub(crate) fn finish(&self) -> MetricVector {
        MetricVector::from_totals(
            self.total_value,
            self.transaction_count,
            self.transaction_count,
            self.members.len(),
        )
    }
}

pub fn compute_metrics(transactions: &[Transaction]) -> MetricVector {
    let mut acc = MetricAccumulator::default();
    for transaction in transactions {
        acc.add(transaction);
    }
    acc.finish()
}

/// Headline figures for the whole transaction set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub total_transactions: usize,
    pub unique_members: usize,
    pub avg_transaction_value: f64,
    pub revenue_per_member: f64,
    pub avg_unit_value: f64,
    /// Revenue growth of the reference month against the month before it.
    pub revenue_growth: f64,
}

pub fn summarize(transactions: &[Transaction], reference: NaiveDate) -> KpiSummary {
    if transactions.is_empty() {
        return KpiSummary::default();
    }

    let overall = compute_metrics(transactions);

    let this_month = (reference.year(), reference.month());
    let last_month = shift_month(reference.year(), reference.month(), -1);

    let mut this_month_revenue = 0.0;
    let mut last_month_revenue = 0.0;
    for transaction in transactions {
        let Ok(date) = parse_payment_date(&transaction.payment_date) else {
            continue;
        };
        let month = (date.year(), date.month());
        if month == this_month {
            this_month_revenue += transaction.payment_value;
        } else if month == last_month {
            last_month_revenue += transaction.payment_value;
        }
    }

    KpiSummary {
        total_revenue: overall.total_value,
        total_transactions: overall.transaction_count,
        unique_members: overall.unique_member_count,
        avg_transaction_value: overall.atv,
        revenue_per_member: overall.asv,
        avg_unit_value: overall.auv,
        revenue_growth: growth_rate(last_month_revenue, this_month_revenue),
    }
}
