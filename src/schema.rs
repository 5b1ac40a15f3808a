use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalesAnalyticsError};

/// A single payment event in canonical shape.
///
/// Raw exports use several spellings for the same field; [`crate::ingestion`]
/// maps them onto this struct so the aggregation code only reads these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[schemars(description = "Amount paid in this transaction")]
    #[serde(default)]
    pub payment_value: f64,

    #[schemars(description = "Payment date as exported, either D/M/YYYY or YYYY/M/D")]
    #[serde(default)]
    pub payment_date: String,

    #[schemars(description = "Identifier of the paying member, used for unique member counts")]
    #[serde(default)]
    pub member_id: String,

    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub product: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub sold_by: Option<String>,

    #[serde(default)]
    pub payment_method: Option<String>,

    #[serde(default, rename = "paymentVAT")]
    pub payment_vat: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    #[schemars(description = "Group by the cleaned product name")]
    Product,

    #[schemars(description = "Group by the product category")]
    Category,

    #[schemars(description = "Group by the paying member")]
    Member,

    #[schemars(description = "Group by the staff member who made the sale")]
    Seller,

    #[schemars(description = "Group by how the payment was made")]
    PaymentMethod,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Product,
        Dimension::Category,
        Dimension::Member,
        Dimension::Seller,
        Dimension::PaymentMethod,
    ];

    /// Key used when a transaction has no value for this dimension.
    pub fn unknown_label(self) -> &'static str {
        match self {
            Dimension::Product => "Unknown Product",
            Dimension::Category => "Unknown Category",
            Dimension::Member => "Unknown Member",
            Dimension::Seller => "Unknown Seller",
            Dimension::PaymentMethod => "Unknown Method",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Product => "Product",
            Dimension::Category => "Category",
            Dimension::Member => "Member",
            Dimension::Seller => "Seller",
            Dimension::PaymentMethod => "Payment Method",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    #[schemars(description = "Sum of payment values")]
    Revenue,

    #[schemars(description = "Number of transactions")]
    Transactions,

    #[schemars(description = "Number of distinct member IDs")]
    Members,

    #[schemars(description = "Average transaction value: revenue / transactions")]
    Atv,

    #[schemars(description = "Average unit value: revenue / units sold")]
    Auv,

    #[schemars(description = "Average spend per unique member: revenue / members")]
    Asv,

    #[schemars(description = "Units per transaction: units sold / transactions")]
    Upt,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Revenue => "Revenue",
            Metric::Transactions => "Transactions",
            Metric::Members => "Unique Members",
            Metric::Atv => "Average Transaction Value",
            Metric::Auv => "Average Unit Value",
            Metric::Asv => "Average Spend per Member",
            Metric::Upt => "Units per Transaction",
        }
    }

    /// Whether values of this metric are money amounts.
    pub fn is_currency(self) -> bool {
        matches!(
            self,
            Metric::Revenue | Metric::Atv | Metric::Auv | Metric::Asv
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PeriodMode {
    #[default]
    #[schemars(description = "Plain dimension grouping, no calendar bucketing")]
    None,

    #[schemars(description = "Trailing six calendar months ending at the reference month")]
    MonthOverMonth,

    #[schemars(description = "Calendar months of two years side by side")]
    YearOverYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum QuickFilter {
    #[default]
    All,

    #[schemars(description = "Rows with a positive total value")]
    Active,

    #[schemars(description = "Rows whose total value is exactly zero")]
    Inactive,
}

/// What the presentation layer wants computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    #[schemars(
        description = "Dimension to group by. For month-over-month this is the secondary grouping of each row. Omit to aggregate everything into one row."
    )]
    #[serde(default)]
    pub dimension: Option<Dimension>,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub period_mode: PeriodMode,

    #[schemars(
        description = "The two years compared by the year-over-year view, earlier year first. Defaults to the reference year and the one before it."
    )]
    #[serde(default)]
    pub comparison_years: Option<[i32; 2]>,

    #[schemars(description = "Keep only the first N ranked rows. Must be at least 1.")]
    #[serde(default)]
    pub top_n: Option<usize>,

    #[serde(default)]
    pub quick_filter: QuickFilter,

    #[schemars(
        description = "Date treated as 'now' for trailing-month windows and default comparison years. Defaults to today's local date."
    )]
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl AnalyticsRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(0) = self.top_n {
            return Err(SalesAnalyticsError::InvalidTopN(0));
        }

        if let Some(years) = self.comparison_years {
            for year in years {
                if !(1..=9999).contains(&year) {
                    return Err(SalesAnalyticsError::InvalidRequest(format!(
                        "comparison year {} is outside 1..=9999",
                        year
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsRequest)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
