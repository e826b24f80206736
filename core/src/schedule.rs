//! Temporal scheduler: expands groups into timestamped orders.

use crate::{
    config::WorkingWindow,
    order::{Order, OrderGroup},
    rng::GenRng,
};
use chrono::{Duration, NaiveDate};
use uuid::Builder;

/// Expand each group into `count` orders with independent, uniformly
/// drawn minute-resolution timestamps inside `window` on `date`.
/// The result is sorted by timestamp; equal timestamps are allowed.
pub fn schedule_orders(
    groups: &[OrderGroup],
    date: NaiveDate,
    window: &WorkingWindow,
    rng: &mut GenRng,
) -> Vec<Order> {
    let opens = window.start_on(date);
    let span = u64::from(window.duration_minutes.max(1));
    let capacity = groups.iter().map(|g| g.count as usize).sum();
    let mut orders = Vec::with_capacity(capacity);

    for group in groups {
        for _ in 0..group.count {
            let offset = rng.next_u64_below(span) as i64;
            let id = Builder::from_random_bytes(rng.next_bytes_16()).into_uuid();
            orders.push(Order {
                id: id.to_string(),
                amount: group.amount,
                timestamp: opens + Duration::minutes(offset),
                payment_method: group.payment_method,
                description: group.description.clone(),
            });
        }
    }

    orders.sort_by_key(|o| o.timestamp);
    orders
}
