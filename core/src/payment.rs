//! Payment-method resolution for generated lines.

use crate::{
    pattern::PatternEntry,
    rng::GenRng,
    types::{PaymentMethod, PaymentPolicy},
};

/// Resolve the payment method for one selected entry:
/// the entry's own hint wins, then a fair coin under `Mixed`,
/// else the policy's single method.
pub fn resolve_payment(entry: &PatternEntry, policy: PaymentPolicy, rng: &mut GenRng) -> PaymentMethod {
    if let Some(hint) = entry.payment_method_hint {
        return hint;
    }
    match policy.single() {
        Some(method) => method,
        None => {
            if rng.chance(0.5) {
                PaymentMethod::Cash
            } else {
                PaymentMethod::Card
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn hint_overrides_policy() {
        let mut rng = GenRng::seeded(1);
        let entry = PatternEntry::new(Decimal::TEN, 1.0).with_hint(PaymentMethod::Card);
        assert_eq!(resolve_payment(&entry, PaymentPolicy::Cash, &mut rng), PaymentMethod::Card);
    }

    #[test]
    fn single_policy_is_used_verbatim() {
        let mut rng = GenRng::seeded(1);
        let entry = PatternEntry::new(Decimal::TEN, 1.0);
        for _ in 0..50 {
            assert_eq!(resolve_payment(&entry, PaymentPolicy::Card, &mut rng), PaymentMethod::Card);
        }
    }

    #[test]
    fn mixed_policy_produces_both_methods() {
        let mut rng = GenRng::seeded(42);
        let entry = PatternEntry::new(Decimal::TEN, 1.0);
        let cash = (0..1000)
            .filter(|_| resolve_payment(&entry, PaymentPolicy::Mixed, &mut rng) == PaymentMethod::Cash)
            .count();
        assert!((400..=600).contains(&cash), "cash count {cash}");
    }
}
