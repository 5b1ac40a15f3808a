use crate::metrics::{MetricAccumulator, MetricVector};
use crate::schema::{Dimension, Transaction};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key of the single group formed when no dimension is selected.
pub const ALL_TRANSACTIONS_KEY: &str = "All Transactions";

/// One row per distinct group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupAggregate {
    pub name: String,
    #[serde(flatten)]
    pub metrics: MetricVector,
}

/// The key `transaction` falls under for `dimension`, or the dimension's
/// unknown label when the field is missing or blank.
pub fn group_key(transaction: &Transaction, dimension: Dimension) -> &str {
    let value = match dimension {
        Dimension::Product => transaction.product.as_deref(),
        Dimension::Category => transaction.category.as_deref(),
        Dimension::Member => transaction.customer_name.as_deref(),
        Dimension::Seller => transaction.sold_by.as_deref(),
        Dimension::PaymentMethod => transaction.payment_method.as_deref(),
    };

    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => dimension.unknown_label(),
    }
}

/// Groups `transactions` by `dimension` in a single pass.
///
/// Rows come back in the order their key was first seen.
pub fn group(transactions: &[Transaction], dimension: Dimension) -> Vec<GroupAggregate> {
    group_by(transactions, |tx| group_key(tx, dimension))
}

/// Like [`group`] but with an optional dimension; `None` collapses every
/// transaction into one [`ALL_TRANSACTIONS_KEY`] row.
pub fn group_optional(
    transactions: &[Transaction],
    dimension: Option<Dimension>,
) -> Vec<GroupAggregate> {
    match dimension {
        Some(dimension) => group(transactions, dimension),
        None => group_by(transactions, |_| ALL_TRANSACTIONS_KEY),
    }
}

fn group_by<'a, F>(transactions: &'a [Transaction], key_fn: F) -> Vec<GroupAggregate>
where
    F: Fn(&'a Transaction) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, MetricAccumulator<'a>)> = Vec::new();

    for transaction in transactions {
        let key = key_fn(transaction);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, MetricAccumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.add(transaction);
    }

    groups
        .into_iter()
        .map(|(name, acc)| GroupAggregate {
            name: name.to_string(),
            metrics: acc.finish(),
        })
        .collect()
}
