//! Bounded random perturbation of pattern amounts.

use crate::{
    rng::GenRng,
    rounding::{round_amount, scale},
    types::Amount,
};

/// Perturb `base` by up to ±(2 × variation_factor × base), floor the
/// result at `min_amount`, then round to `precision`. Swings past
/// `Decimal::MAX` saturate.
///
/// Strict mode (`variation_factor == 0`) never calls this; the decision
/// is made by the decomposition loop so no draw is consumed.
pub fn perturb(
    base: Amount,
    variation_factor: f64,
    min_amount: Amount,
    precision: u32,
    rng: &mut GenRng,
) -> Amount {
    let swing = rng.next_signed_unit() * 2.0 * variation_factor;
    let perturbed = base.saturating_add(scale(base, swing));
    round_amount(perturbed.max(min_amount), precision)
}

/// Draw a fresh amount uniformly in `[low, high]`, rounded to
/// `precision` and clamped back into the interval.
pub fn synthesize(low: Amount, high: Amount, precision: u32, rng: &mut GenRng) -> Amount {
    if high <= low {
        return low;
    }
    let drawn = low + scale(high - low, rng.next_f64());
    round_amount(drawn, precision).clamp(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn perturbation_stays_within_bounds() {
        let mut rng = GenRng::seeded(11);
        let base = Decimal::from(100);
        let min = Decimal::from(5);
        for _ in 0..1000 {
            let v = perturb(base, 0.2, min, 2, &mut rng);
            assert!(v >= Decimal::from(60) && v <= Decimal::from(140), "{v}");
            assert!(v.scale() <= 2);
        }
    }

    #[test]
    fn perturbation_floors_at_min_amount() {
        let mut rng = GenRng::seeded(3);
        let min = Decimal::from(8);
        for _ in 0..1000 {
            assert!(perturb(Decimal::from(10), 1.0, min, 2, &mut rng) >= min);
        }
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let mut rng = GenRng::seeded(5);
        let base = Decimal::from_i128_with_scale(30_000_000_000_000_000_000_000_000_000, 0);
        for _ in 0..1000 {
            let v = perturb(base, 1.0, base, 2, &mut rng);
            assert!(v >= base && v <= Decimal::MAX, "{v}");
        }
    }

    #[test]
    fn synthesized_amount_is_inside_interval() {
        let mut rng = GenRng::seeded(21);
        let low = Decimal::new(250, 2);
        let high = Decimal::new(1999, 2);
        for _ in 0..1000 {
            let v = synthesize(low, high, 2, &mut rng);
            assert!(v >= low && v <= high);
        }
        assert_eq!(synthesize(high, low, 2, &mut rng), high);
    }
}
