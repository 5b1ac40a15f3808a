//! # Sales Analytics
//!
//! A library for turning a flat list of payment transactions into grouped,
//! period-aligned sales performance metrics ready for a dashboard to render.
//!
//! ## Core Concepts
//!
//! - **Transaction**: one payment event, normalised from raw export records by [`ingestion`]
//! - **Dimension**: the field rows are grouped by (product, category, member, seller, payment method)
//! - **Metric vector**: revenue, transaction count, unique members and the ATV/AUV/ASV/UPT ratios
//! - **Period views**: trailing six-month and year-over-year comparisons with growth rates
//! - **Zero safety**: every ratio and growth rate is 0 when its denominator is 0
//!
//! Every call recomputes from the transactions it is given; nothing is cached.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_analytics::*;
//! use chrono::NaiveDate;
//!
//! let transactions = vec![
//!     Transaction {
//!         payment_value: 100.0,
//!         payment_date: "1/1/2024".to_string(),
//!         member_id: "A".to_string(),
//!         product: Some("Monthly Pass".to_string()),
//!         ..Default::default()
//!     },
//! ];
//!
//! let request = AnalyticsRequest {
//!     dimension: Some(Dimension::Product),
//!     period_mode: PeriodMode::MonthOverMonth,
//!     reference_date: NaiveDate::from_ymd_opt(2024, 3, 1),
//!     ..Default::default()
//! };
//!
//! let response = process_request(&request, &transactions).unwrap();
//! ```

pub mod dates;
pub mod engine;
pub mod error;
pub mod format;
pub mod grouping;
pub mod ingestion;
pub mod metrics;
pub mod periods;
pub mod ranking;
pub mod schema;

pub use dates::{month_key, parse_payment_date, trailing_month_keys};
pub use engine::{
    AnalyticsResponse, AnalyticsView, GroupsView, MonthOverMonthView, SalesAnalyticsProcessor,
    YearOverYearView,
};
pub use error::{Result, SalesAnalyticsError};
pub use format::{format_currency, format_metric, format_number, format_percentage};
pub use grouping::{group, group_key, group_optional, GroupAggregate, ALL_TRANSACTIONS_KEY};
pub use ingestion::{ingest_json, ingest_records, normalize_record, IngestionReport, RawRecord};
pub use metrics::{compute_metrics, growth_rate, summarize, KpiSummary, MetricVector};
pub use periods::*;
pub use ranking::*;
pub use schema::*;

pub fn process_request(
    request: &AnalyticsRequest,
    transactions: &[Transaction],
) -> Result<AnalyticsResponse> {
    SalesAnalyticsProcessor::process(request, transactions)
}

/// Parses a JSON request and runs it.
pub fn process_json_request(
    request_json: &str,
    transactions: &[Transaction],
) -> Result<AnalyticsResponse> {
    let request = AnalyticsRequest::from_json(request_json)?;
    process_request(&request, transactions)
}
