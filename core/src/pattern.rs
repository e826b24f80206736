//! Normalized template patterns: the statistical prior for generation.

use crate::{
    error::{DistError, DistResult},
    rounding::round_amount,
    template::Template,
    types::{Amount, PaymentMethod},
};
use serde::{Deserialize, Serialize};

/// Tolerance on Σ normalized_frequency == 1.
pub const FREQUENCY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternEntry {
    pub amount: Amount,
    pub normalized_frequency: f64,
    #[serde(default)]
    pub payment_method_hint: Option<PaymentMethod>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PatternEntry {
    pub fn new(amount: Amount, normalized_frequency: f64) -> Self {
        Self {
            amount,
            normalized_frequency,
            payment_method_hint: None,
            description: None,
        }
    }

    pub fn with_hint(mut self, method: PaymentMethod) -> Self {
        self.payment_method_hint = Some(method);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An immutable snapshot of pattern entries. Iteration order is the
/// order entries were supplied in and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplatePattern {
    entries: Vec<PatternEntry>,
}

impl TemplatePattern {
    /// Wrap entries as supplied. No validation happens here; the
    /// engine validates and renormalizes its own copy.
    pub fn new(entries: Vec<PatternEntry>) -> Self {
        Self { entries }
    }

    /// Normalize a template's raw integer frequencies into a pattern.
    pub fn from_template(template: &Template) -> DistResult<Self> {
        let total: u64 = template.entries.iter().map(|e| u64::from(e.frequency)).sum();
        if template.entries.is_empty() {
            return Err(DistError::invalid_template(format!(
                "template '{}' has no entries",
                template.id
            )));
        }
        if total == 0 {
            return Err(DistError::invalid_template(format!(
                "template '{}' has no positive-frequency entries",
                template.id
            )));
        }
        let entries = template
            .entries
            .iter()
            .map(|e| PatternEntry {
                amount: e.amount,
                normalized_frequency: f64::from(e.frequency) / total as f64,
                payment_method_hint: e.payment_method,
                description: e.description.clone(),
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.normalized_frequency).sum()
    }

    /// Smallest amount in the pattern; `None` when empty.
    pub fn min_amount(&self) -> Option<Amount> {
        self.entries.iter().map(|e| e.amount).min()
    }

    /// First entry whose amount equals `amount` within tolerance.
    pub fn exact_match(&self, amount: Amount) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .find(|e| crate::rounding::approx_eq(e.amount, amount))
    }

    /// Largest entry with amount ≤ `ceiling`. Ties keep the earliest.
    pub fn largest_at_most(&self, ceiling: Amount) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .filter(|e| e.amount <= ceiling)
            .fold(None, |best: Option<&PatternEntry>, e| match best {
                Some(b) if b.amount >= e.amount => Some(b),
                _ => Some(e),
            })
    }

    /// Globally smallest entry. Ties keep the earliest.
    pub fn smallest(&self) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&PatternEntry>, e| match best {
                Some(b) if b.amount <= e.amount => Some(b),
                _ => Some(e),
            })
    }

    /// Validate and produce the engine's working copy: amounts rounded
    /// to `precision` and frequencies renormalized to sum to 1.
    /// `self` is left untouched.
    pub fn prepared(&self, precision: u32) -> DistResult<Self> {
        if self.entries.is_empty() {
            return Err(DistError::invalid_template("pattern is empty"));
        }
        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| e.amount < Amount::ZERO)
        {
            return Err(DistError::invalid_template(format!(
                "negative amount {}",
                bad.amount
            )));
        }
        if self
            .entries
            .iter()
            .any(|e| !e.normalized_frequency.is_finite() || e.normalized_frequency < 0.0)
        {
            return Err(DistError::invalid_template(
                "frequencies must be finite and non-negative",
            ));
        }
        let total = self.total_weight();
        if total <= 0.0 {
            return Err(DistError::invalid_template(
                "pattern has no positive-frequency entries",
            ));
        }

        let mut working = self.clone();
        for entry in &mut working.entries {
            entry.amount = round_amount(entry.amount, precision);
            entry.normalized_frequency /= total;
        }
        Ok(working)
    }
}
