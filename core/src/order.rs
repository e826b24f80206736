//! Engine output units: merged order groups and individual orders.

use crate::types::{Amount, EntityId, PaymentMethod};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bucket of identical-amount, identical-method transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderGroup {
    pub amount: Amount,
    pub count: u32,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: Option<String>,
}

impl OrderGroup {
    pub fn single(amount: Amount, payment_method: PaymentMethod, description: Option<String>) -> Self {
        Self {
            amount,
            count: 1,
            payment_method,
            description,
        }
    }

    /// Whether this group holds orders of `(amount, method)`.
    ///
    /// Amounts are already rounded to the configured grid, so equality
    /// here is the one-cent tolerance at two decimals without merging
    /// distinct sub-cent amounts at finer precisions.
    pub fn matches(&self, amount: Amount, method: PaymentMethod) -> bool {
        self.payment_method == method && self.amount == amount
    }

    /// Sum of every order this group expands to, saturating at
    /// `Decimal::MAX`.
    pub fn total(&self) -> Amount {
        self.amount.saturating_mul(Amount::from(self.count))
    }
}

/// Add one order to the matching group or start a new one.
pub fn add_to_groups(
    groups: &mut Vec<OrderGroup>,
    amount: Amount,
    method: PaymentMethod,
    description: Option<String>,
) {
    match groups.iter_mut().find(|g| g.matches(amount, method)) {
        Some(group) => group.count += 1,
        None => groups.push(OrderGroup::single(amount, method, description)),
    }
}

/// One concrete, timestamped transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: EntityId,
    pub amount: Amount,
    pub timestamp: NaiveDateTime,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sum of group totals.
pub fn groups_total(groups: &[OrderGroup]) -> Amount {
    groups.iter().map(OrderGroup::total).sum()
}

/// Sum of order amounts.
pub fn orders_total(orders: &[Order]) -> Amount {
    orders.iter().map(|o| o.amount).sum()
}

/// Sum of order amounts paid with `method`.
pub fn orders_total_for(orders: &[Order], method: PaymentMethod) -> Amount {
    orders
        .iter()
        .filter(|o| o.payment_method == method)
        .map(|o| o.amount)
        .sum()
}

/// Rebuild groups from individual orders, keyed by `(amount, method)`.
pub fn regroup(orders: &[Order]) -> Vec<OrderGroup> {
    let mut groups = Vec::new();
    for order in orders {
        add_to_groups(&mut groups, order.amount, order.payment_method, order.description.clone());
    }
    groups
}
