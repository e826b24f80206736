//! Weighted selection of pattern entries.
//!
//! Linear scan over the snapshot in iteration order. Catalogs are tens
//! of entries, so a cumulative table would buy nothing.

use crate::{pattern::PatternEntry, rng::GenRng};

/// Pick one entry with probability proportional to its frequency.
///
/// Falls back to the first entry when every weight is zero. Returns
/// `None` only for an empty slice; callers reject empty patterns with
/// `InvalidTemplate` before getting here.
pub fn select_weighted<'a>(entries: &'a [PatternEntry], rng: &mut GenRng) -> Option<&'a PatternEntry> {
    let first = entries.first()?;
    let total_weight: f64 = entries.iter().map(|e| e.normalized_frequency).sum();
    if total_weight <= 0.0 {
        return Some(first);
    }

    let mut roll = rng.next_f64() * total_weight;
    for entry in entries {
        roll -= entry.normalized_frequency;
        if roll <= 0.0 {
            return Some(entry);
        }
    }
    // Float drift can leave a sliver above zero after the last entry.
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::{prelude::ToPrimitive, Decimal};

    fn entries(weights: &[f64]) -> Vec<PatternEntry> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| PatternEntry::new(Decimal::from(i as i64 + 1), w))
            .collect()
    }

    #[test]
    fn empty_slice_selects_nothing() {
        let mut rng = GenRng::seeded(1);
        assert!(select_weighted(&[], &mut rng).is_none());
    }

    #[test]
    fn all_zero_weights_fall_back_to_first() {
        let mut rng = GenRng::seeded(1);
        let e = entries(&[0.0, 0.0, 0.0]);
        for _ in 0..20 {
            assert_eq!(select_weighted(&e, &mut rng).unwrap().amount, Decimal::ONE);
        }
    }

    #[test]
    fn zero_weight_entry_is_never_chosen() {
        let mut rng = GenRng::seeded(99);
        let e = entries(&[0.5, 0.0, 0.5]);
        for _ in 0..2000 {
            assert_ne!(select_weighted(&e, &mut rng).unwrap().amount, Decimal::from(2));
        }
    }

    #[test]
    fn frequencies_are_respected() {
        let mut rng = GenRng::seeded(0xC0FFEE);
        let e = entries(&[0.1, 0.6, 0.3]);
        let mut hits = [0usize; 3];
        let draws = 20_000;
        for _ in 0..draws {
            let picked = select_weighted(&e, &mut rng).unwrap();
            let idx = (picked.amount - Decimal::ONE).to_usize().unwrap();
            hits[idx] += 1;
        }
        for (i, expected) in [0.1, 0.6, 0.3].iter().enumerate() {
            let observed = hits[i] as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "entry {i}: observed {observed:.3}, expected {expected}"
            );
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let e = entries(&[0.2, 0.3, 0.5]);
        let mut a = GenRng::seeded(5);
        let mut b = GenRng::seeded(5);
        for _ in 0..100 {
            assert_eq!(
                select_weighted(&e, &mut a).unwrap().amount,
                select_weighted(&e, &mut b).unwrap().amount
            );
        }
    }
}
