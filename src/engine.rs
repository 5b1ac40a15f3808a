use crate::dates::trailing_month_keys;
use crate::error::Result;
use crate::grouping::{group_optional, GroupAggregate};
use crate::metrics::{summarize, KpiSummary};
use crate::periods::{
    compare_month_over_month, compare_year_over_year, count_unbucketable,
    month_over_month_totals, ComparisonRow, MonthOverMonthRow, MonthOverMonthTotals,
    TRAILING_MONTHS,
};
use crate::ranking::{apply_filter, bottom_n, rank, top_n, QuickFilterCounts, DEFAULT_PAGE_SIZE};
use crate::schema::{AnalyticsRequest, Metric, PeriodMode, Transaction};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupsView {
    /// Every ranked row that passes the quick filter; top N never trims it.
    pub rows: Vec<GroupAggregate>,
    /// Strongest rows, sized by top N.
    pub top: Vec<GroupAggregate>,
    /// Weakest rows, weakest first.
    pub bottom: Vec<GroupAggregate>,
    pub filter_counts: QuickFilterCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverMonthView {
    pub months: Vec<String>,
    pub rows: Vec<MonthOverMonthRow>,
    /// Taken over every row, before any top N trimming.
    pub totals: MonthOverMonthTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearOverYearView {
    pub year_a: i32,
    pub year_b: i32,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum AnalyticsView {
    Groups(GroupsView),
    MonthOverMonth(MonthOverMonthView),
    YearOverYear(YearOverYearView),
}

impl AnalyticsView {
    pub fn is_empty(&self) -> bool {
        match self {
            AnalyticsView::Groups(v) => v.rows.is_empty(),
            AnalyticsView::MonthOverMonth(v) => v.rows.is_empty(),
            AnalyticsView::YearOverYear(v) => v.rows.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub metric: Metric,
    pub reference_date: NaiveDate,
    pub summary: KpiSummary,
    pub view: AnalyticsView,
    /// Transactions left out of period buckets because their date did not parse.
    pub unbucketable: usize,
}

impl AnalyticsResponse {
    /// True when there is nothing to render. Not an error.
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct SalesAnalyticsProcessor;

impl SalesAnalyticsProcessor {
    pub fn process(
        request: &AnalyticsRequest,
        transactions: &[Transaction],
    ) -> Result<AnalyticsResponse> {
        request.validate()?;

        let reference = request
            .reference_date
            .unwrap_or_else(|| Local::now().date_naive());

        info!(
            "Processing {:?} analytics for {} transactions (dimension: {:?}, metric: {:?})",
            request.period_mode,
            transactions.len(),
            request.dimension,
            request.metric
        );

        let (view, unbucketable) = match request.period_mode {
            PeriodMode::None => (Self::groups_view(request, transactions), 0),
            PeriodMode::MonthOverMonth => (
                Self::month_over_month_view(request, transactions, reference),
                count_unbucketable(transactions),
            ),
            PeriodMode::YearOverYear => (
                Self::year_over_year_view(request, transactions, reference),
                count_unbucketable(transactions),
            ),
        };

        Ok(AnalyticsResponse {
            metric: request.metric,
            reference_date: reference,
            summary: summarize(transactions, reference),
            view,
            unbucketable,
        })
    }

    fn groups_view(request: &AnalyticsRequest, transactions: &[Transaction]) -> AnalyticsView {
        let ranked = rank(group_optional(transactions, request.dimension));
        let filter_counts = QuickFilterCounts::from_groups(&ranked);
        let filtered = apply_filter(&ranked, request.quick_filter);
        let slice = request.top_n.unwrap_or(DEFAULT_PAGE_SIZE);

        debug!(
            "Grouped into {} rows, {} after {:?} filter",
            ranked.len(),
            filtered.len(),
            request.quick_filter
        );

        AnalyticsView::Groups(GroupsView {
            top: top_n(&filtered, slice).to_vec(),
            bottom: bottom_n(&filtered, slice),
            rows: filtered,
            filter_counts,
        })
    }

    fn month_over_month_view(
        request: &AnalyticsRequest,
        transactions: &[Transaction],
        reference: NaiveDate,
    ) -> AnalyticsView {
        let mut rows =
            compare_month_over_month(transactions, request.dimension, request.metric, reference);
        let totals = month_over_month_totals(&rows);

        if let Some(n) = request.top_n {
            rows.sort_by(|a, b| b.total.total_cmp(&a.total));
            rows.truncate(n);
        }

        AnalyticsView::MonthOverMonth(MonthOverMonthView {
            months: trailing_month_keys(reference, TRAILING_MONTHS),
            rows,
            totals,
        })
    }

    fn year_over_year_view(
        request: &AnalyticsRequest,
        transactions: &[Transaction],
        reference: NaiveDate,
    ) -> AnalyticsView {
        let [year_a, year_b] = request
            .comparison_years
            .unwrap_or([reference.year() - 1, reference.year()]);

        AnalyticsView::YearOverYear(YearOverYearView {
            year_a,
            year_b,
            rows: compare_year_over_year(transactions, request.metric, year_a, year_b),
        })
    }
}
