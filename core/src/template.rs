//! User-authored templates: raw amount/frequency catalogs.
//!
//! Templates are the Template Store's records. The engine never reads
//! them directly; it works on a [`TemplatePattern`](crate::pattern::TemplatePattern)
//! normalized from a template by value.

use crate::{
    error::{DistError, DistResult},
    types::{Amount, EntityId, PaymentMethod, PaymentPolicy},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MERGED_TEMPLATE_ID: &str = "merged";

/// One typical transaction in a template with its observed frequency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateEntry {
    pub id: EntityId,
    pub amount: Amount,
    pub frequency: u32,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: EntityId,
    pub name: String,
    pub date: NaiveDate,
    pub payment_policy: PaymentPolicy,
    pub total_amount: Amount,
    pub entries: Vec<TemplateEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A template as submitted for creation, before the store assigns
/// its id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTemplate {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_policy: PaymentPolicy,
    pub total_amount: Amount,
    pub entries: Vec<TemplateEntry>,
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_policy: Option<PaymentPolicy>,
    pub total_amount: Option<Amount>,
    pub entries: Option<Vec<TemplateEntry>>,
}

impl Template {
    pub fn apply(&mut self, update: TemplateUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(policy) = update.payment_policy {
            self.payment_policy = policy;
        }
        if let Some(total) = update.total_amount {
            self.total_amount = total;
        }
        if let Some(entries) = update.entries {
            self.entries = entries;
        }
        self.updated_at = now;
    }
}

/// Merge several templates into one, summing frequencies per distinct
/// amount. The first entry seen for an amount keeps its description and
/// payment hint. Returns `None` when there is nothing to merge, and
/// `InvalidTemplate` when a summed frequency or the total overflows.
pub fn merge_templates(templates: &[Template], now: DateTime<Utc>) -> DistResult<Option<Template>> {
    let Some(first) = templates.first() else {
        return Ok(None);
    };

    let mut entries: Vec<TemplateEntry> = Vec::new();
    for template in templates {
        for entry in &template.entries {
            match entries.iter_mut().find(|e| e.amount == entry.amount) {
                Some(existing) => {
                    existing.frequency = existing
                        .frequency
                        .checked_add(entry.frequency)
                        .ok_or_else(|| {
                            DistError::invalid_template(format!(
                                "merged frequency for amount {} overflows",
                                entry.amount
                            ))
                        })?;
                }
                None => entries.push(entry.clone()),
            }
        }
    }

    let total_amount = templates
        .iter()
        .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.total_amount))
        .ok_or_else(|| DistError::invalid_template("merged total amount overflows"))?;

    Ok(Some(Template {
        id: MERGED_TEMPLATE_ID.to_string(),
        name: "Merged templates".to_string(),
        date: first.date,
        payment_policy: PaymentPolicy::Mixed,
        total_amount,
        entries,
        created_at: now,
        updated_at: now,
    }))
}

/// Descriptive statistics over a template's raw frequencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateStats {
    /// Frequency-weighted mean amount; zero for an empty template.
    pub average_order_value: Amount,
    /// frequency → number of entries with that frequency.
    pub order_count_distribution: BTreeMap<u32, usize>,
    /// amount → summed frequency.
    pub frequency_by_amount: BTreeMap<Amount, u64>,
    pub total_orders: u64,
}

pub fn analyze_template(template: &Template) -> TemplateStats {
    let total_orders: u64 = template.entries.iter().map(|e| u64::from(e.frequency)).sum();
    let total_value = template.entries.iter().fold(Amount::ZERO, |acc, e| {
        acc.saturating_add(e.amount.saturating_mul(Amount::from(e.frequency)))
    });
    let average_order_value = if total_orders > 0 {
        total_value / Amount::from(total_orders)
    } else {
        Amount::ZERO
    };

    let mut order_count_distribution = BTreeMap::new();
    let mut frequency_by_amount = BTreeMap::new();
    for entry in &template.entries {
        *order_count_distribution.entry(entry.frequency).or_insert(0) += 1;
        *frequency_by_amount.entry(entry.amount).or_insert(0) += u64::from(entry.frequency);
    }

    TemplateStats {
        average_order_value,
        order_count_distribution,
        frequency_by_amount,
        total_orders,
    }
}
