use crate::error::Result;
use crate::schema::Transaction;
use log::debug;
use serde_json::{Map, Value};

pub type RawRecord = Map<String, Value>;

const PAYMENT_VALUE_FIELDS: &[&str] = &["paymentValue", "Payment Value", "payment_value"];
const PAYMENT_DATE_FIELDS: &[&str] = &["paymentDate", "Payment Date", "payment_date"];
const MEMBER_ID_FIELDS: &[&str] = &["memberId", "Member ID", "member_id"];
const CUSTOMER_NAME_FIELDS: &[&str] = &["customerName", "Customer Name", "customer_name"];
const PRODUCT_FIELDS: &[&str] = &[
    "cleanedProduct",
    "Cleaned Product",
    "paymentItem",
    "Payment Item",
    "product",
];
const CATEGORY_FIELDS: &[&str] = &[
    "cleanedCategory",
    "Cleaned Category",
    "paymentCategory",
    "Payment Category",
    "category",
];
const SOLD_BY_FIELDS: &[&str] = &["soldBy", "Sold By", "sold_by"];
const PAYMENT_METHOD_FIELDS: &[&str] = &["paymentMethod", "Payment Method", "payment_method"];
const PAYMENT_VAT_FIELDS: &[&str] = &["paymentVAT", "Payment VAT", "payment_vat"];

#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub transactions: Vec<Transaction>,
    /// Records missing a payment value or a payment date field.
    pub skipped: usize,
}

/// Maps one raw export record onto the canonical [`Transaction`].
///
/// Returns `None` unless the record has both a payment value and a payment
/// date field; anything else is not a sales row. A field present with a null
/// value still counts as present. Other missing fields default.
pub fn normalize_record(record: &RawRecord) -> Option<Transaction> {
    if !has_field(record, PAYMENT_VALUE_FIELDS) || !has_field(record, PAYMENT_DATE_FIELDS) {
        return None;
    }

    Some(Transaction {
        payment_value: number_field(record, PAYMENT_VALUE_FIELDS).unwrap_or(0.0),
        payment_date: text_field(record, PAYMENT_DATE_FIELDS).unwrap_or_default(),
        member_id: text_field(record, MEMBER_ID_FIELDS).unwrap_or_default(),
        customer_name: text_field(record, CUSTOMER_NAME_FIELDS),
        product: text_field(record, PRODUCT_FIELDS),
        category: text_field(record, CATEGORY_FIELDS),
        sold_by: text_field(record, SOLD_BY_FIELDS),
        payment_method: text_field(record, PAYMENT_METHOD_FIELDS),
        payment_vat: number_field(record, PAYMENT_VAT_FIELDS),
    })
}

pub fn ingest_records(records: &[RawRecord]) -> IngestionReport {
    let mut report = IngestionReport::default();

    for record in records {
        match normalize_record(record) {
            Some(tx) => report.transactions.push(tx),
            None => report.skipped += 1,
        }
    }

    debug!(
        "Ingested {} transactions, skipped {} non-sales records",
        report.transactions.len(),
        report.skipped
    );

    report
}

/// Parses a JSON array of raw records and normalises them.
pub fn ingest_json(json: &str) -> Result<IngestionReport> {
    let records: Vec<RawRecord> = serde_json::from_str(json)?;
    Ok(ingest_records(&records))
}

fn has_field(record: &RawRecord, fields: &[&str]) -> bool {
    fields.iter().any(|field| record.contains_key(*field))
}

/// First synonym holding a non-blank string (numbers are stringified).
fn text_field(record: &RawRecord, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_field(record: &RawRecord, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    })
}

/// Accepts plain or comma-grouped amounts, optionally with a rupee sign.
fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
