//! The decomposition loop: splits a target into order groups.
//!
//! STATES:
//!   Accumulating → Converged   remaining balance reached zero
//!   Accumulating → Exhausted   iteration ceiling hit with a balance left
//! A run that books nothing is closed with a single Fallback group.
//!
//! PER-ITERATION POLICY (first match wins):
//!   1. Strict (variation_factor == 0): exact entry, else largest
//!      entry ≤ remaining, else the smallest entry. No perturbation.
//!   2. First iteration with prefer_exact_match: exact entry verbatim.
//!   3. Weighted selection followed by variance injection.
//!
//! Every booked amount sits on the rounding grid, and the remaining
//! balance is re-rounded after each subtraction, so the groups always
//! sum to the rounded target once the loop converges.

use crate::{
    config::AlgorithmSettings,
    error::{DistError, DistResult},
    order::{add_to_groups, OrderGroup},
    pattern::{PatternEntry, TemplatePattern},
    payment::resolve_payment,
    rng::GenRng,
    rounding::{round_amount, snap_residual},
    selector::select_weighted,
    types::{Amount, PaymentPolicy},
    variance::{perturb, synthesize},
};
use serde::{Deserialize, Serialize};

pub const FALLBACK_DESCRIPTION: &str = "Automatically generated order";

/// How a decomposition ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    /// Iteration ceiling reached; the groups under-allocate the target
    /// by the reported residual.
    Exhausted,
    /// Nothing was booked; one group carries the whole target.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Accumulating,
    Done(Termination),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub groups: Vec<OrderGroup>,
    pub termination: Termination,
    pub iterations: u32,
    /// Unallocated balance. Zero unless `termination` is Exhausted.
    pub residual: Amount,
}

pub struct DecompositionLoop<'a> {
    pattern: &'a TemplatePattern,
    first: &'a PatternEntry,
    settings: &'a AlgorithmSettings,
    policy: PaymentPolicy,
    min_amount: Amount,
    target: Amount,
    remaining: Amount,
    iterations: u32,
    groups: Vec<OrderGroup>,
}

impl<'a> DecompositionLoop<'a> {
    /// `pattern` must be a prepared working copy (see
    /// [`TemplatePattern::prepared`]) rounded to the same precision.
    pub fn new(
        target: Amount,
        pattern: &'a TemplatePattern,
        settings: &'a AlgorithmSettings,
        policy: PaymentPolicy,
    ) -> DistResult<Self> {
        let first = pattern
            .entries()
            .first()
            .ok_or_else(|| DistError::invalid_template("pattern is empty"))?;
        let min_amount = pattern.min_amount().unwrap_or(first.amount);
        let target = round_amount(target, settings.rounding_precision);
        Ok(Self {
            pattern,
            first,
            settings,
            policy,
            min_amount,
            target,
            remaining: target,
            iterations: 0,
            groups: Vec::new(),
        })
    }

    pub fn state(&self) -> LoopState {
        if self.remaining <= Amount::ZERO {
            LoopState::Done(Termination::Converged)
        } else if self.iterations >= self.settings.max_iterations {
            LoopState::Done(Termination::Exhausted)
        } else {
            LoopState::Accumulating
        }
    }

    /// Drive the loop to a terminal state.
    pub fn run(mut self, rng: &mut GenRng) -> Decomposition {
        while self.state() == LoopState::Accumulating {
            self.step(rng);
        }
        self.finish()
    }

    /// One iteration: select, resolve payment, perturb, fit, book.
    pub fn step(&mut self, rng: &mut GenRng) {
        self.iterations += 1;
        let precision = self.settings.rounding_precision;

        let (entry, verbatim) = self.choose_entry(rng);
        let method = resolve_payment(entry, self.policy, rng);
        let mut amount = if verbatim {
            entry.amount
        } else {
            perturb(
                entry.amount,
                self.settings.variation_factor,
                self.min_amount,
                precision,
                rng,
            )
        };

        if amount > self.remaining {
            match self.fit_overshoot(rng) {
                Some(fitted) => amount = fitted,
                None => {
                    self.absorb_leftover(rng);
                    return;
                }
            }
        }

        self.remaining = snap_residual(round_amount(self.remaining - amount, precision), precision);
        add_to_groups(&mut self.groups, amount, method, entry.description.clone());
    }

    /// Pick this iteration's entry. The flag is true when the entry's
    /// amount is to be booked verbatim.
    fn choose_entry(&self, rng: &mut GenRng) -> (&'a PatternEntry, bool) {
        let pattern: &'a TemplatePattern = self.pattern;

        if self.settings.is_strict() {
            let entry = pattern
                .exact_match(self.remaining)
                .or_else(|| pattern.largest_at_most(self.remaining))
                .or_else(|| pattern.smallest())
                .unwrap_or(self.first);
            return (entry, true);
        }

        if self.settings.prefer_exact_match && self.iterations == 1 {
            if let Some(entry) = pattern.exact_match(self.remaining) {
                return (entry, true);
            }
        }

        let entry = select_weighted(pattern.entries(), rng).unwrap_or(self.first);
        (entry, false)
    }

    /// Replacement amount for an overshooting draw, or `None` when the
    /// leftover must be folded into an existing group instead.
    fn fit_overshoot(&self, rng: &mut GenRng) -> Option<Amount> {
        let precision = self.settings.rounding_precision;

        if self.settings.is_strict() {
            if let Some(smaller) = self.pattern.largest_at_most(self.remaining) {
                return Some(smaller.amount);
            }
        } else if self.remaining >= self.min_amount {
            // An empty [min_amount, remaining] takes the leftover path
            // below, with or without allow_new_order_types.
            return Some(synthesize(self.min_amount, self.remaining, precision, rng));
        }

        if self.groups.is_empty() {
            Some(self.remaining)
        } else {
            None
        }
    }

    /// Fold the leftover balance into one order of a random group. The
    /// order is split off the group (or the group grows when it holds a
    /// single order) so the other orders keep their amount.
    fn absorb_leftover(&mut self, rng: &mut GenRng) {
        let precision = self.settings.rounding_precision;
        let index = rng.next_index(self.groups.len());
        let leftover = self.remaining;

        let group = &mut self.groups[index];
        let grown = round_amount(group.amount + leftover, precision);
        let method = group.payment_method;
        let description = group.description.clone();
        if group.count > 1 {
            group.count -= 1;
        } else {
            self.groups.remove(index);
        }
        add_to_groups(&mut self.groups, grown, method, description);

        log::debug!("leftover {leftover} folded into a {method} order, now {grown}");
        self.remaining = Amount::ZERO;
    }

    fn finish(mut self) -> Decomposition {
        let mut termination = match self.state() {
            LoopState::Done(t) => t,
            LoopState::Accumulating => Termination::Exhausted,
        };

        if self.groups.is_empty() {
            self.groups.push(OrderGroup::single(
                self.target,
                self.policy.default_method(),
                Some(FALLBACK_DESCRIPTION.to_string()),
            ));
            self.remaining = Amount::ZERO;
            termination = Termination::Fallback;
        }

        let residual = match termination {
            Termination::Exhausted => {
                log::warn!(
                    "iteration ceiling {} reached with {} of {} unallocated",
                    self.settings.max_iterations,
                    self.remaining,
                    self.target
                );
                self.remaining
            }
            _ => Amount::ZERO,
        };

        Decomposition {
            groups: self.groups,
            termination,
            iterations: self.iterations,
            residual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::groups_total;
    use rust_decimal::Decimal;

    fn pattern(amounts: &[(i64, f64)]) -> TemplatePattern {
        TemplatePattern::new(
            amounts
                .iter()
                .map(|&(a, f)| PatternEntry::new(Decimal::from(a), f))
                .collect(),
        )
        .prepared(2)
        .unwrap()
    }

    fn run(target: i64, p: &TemplatePattern, settings: &AlgorithmSettings, seed: u64) -> Decomposition {
        let mut rng = GenRng::seeded(seed);
        DecompositionLoop::new(Decimal::from(target), p, settings, PaymentPolicy::Cash)
            .unwrap()
            .run(&mut rng)
    }

    #[test]
    fn strict_mode_splits_leftover_off_one_order() {
        let p = pattern(&[(10, 1.0)]);
        let settings = AlgorithmSettings::strict();
        let d = run(35, &p, &settings, 1);

        assert_eq!(d.termination, Termination::Converged);
        assert_eq!(groups_total(&d.groups), Decimal::from(35));
        assert_eq!(d.groups.len(), 2);
        assert_eq!((d.groups[0].amount, d.groups[0].count), (Decimal::from(10), 2));
        assert_eq!((d.groups[1].amount, d.groups[1].count), (Decimal::from(15), 1));
    }

    #[test]
    fn strict_mode_greedy_prefers_largest_fitting_entry() {
        let p = pattern(&[(5, 0.5), (20, 0.5)]);
        let settings = AlgorithmSettings::strict();
        let d = run(45, &p, &settings, 1);

        assert_eq!(d.termination, Termination::Converged);
        assert_eq!(d.groups.len(), 2);
        assert_eq!((d.groups[0].amount, d.groups[0].count), (Decimal::from(20), 2));
        assert_eq!((d.groups[1].amount, d.groups[1].count), (Decimal::from(5), 1));
    }

    #[test]
    fn ceiling_reports_exhaustion_with_residual() {
        let p = pattern(&[(10, 1.0)]);
        let settings = AlgorithmSettings {
            max_iterations: 2,
            ..AlgorithmSettings::strict()
        };
        let d = run(100, &p, &settings, 1);

        assert_eq!(d.termination, Termination::Exhausted);
        assert_eq!(d.iterations, 2);
        assert_eq!(d.residual, Decimal::from(80));
        assert_eq!(groups_total(&d.groups) + d.residual, Decimal::from(100));
    }

    #[test]
    fn sub_unit_target_falls_back_to_single_group() {
        let p = pattern(&[(10, 1.0)]);
        let settings = AlgorithmSettings::default();
        let mut rng = GenRng::seeded(3);
        let d = DecompositionLoop::new(Decimal::new(4, 3), &p, &settings, PaymentPolicy::Mixed)
            .unwrap()
            .run(&mut rng);

        assert_eq!(d.termination, Termination::Fallback);
        assert_eq!(d.groups.len(), 1);
        assert_eq!(d.groups[0].amount, Decimal::ZERO);
        assert_eq!(d.groups[0].description.as_deref(), Some(FALLBACK_DESCRIPTION));
    }

    #[test]
    fn new_order_types_never_go_below_minimum() {
        let p = pattern(&[(10, 1.0)]);
        let settings = AlgorithmSettings {
            variation_factor: 0.3,
            allow_new_order_types: true,
            prefer_exact_match: false,
            ..AlgorithmSettings::default()
        };
        for seed in 0..50 {
            let d = run(37, &p, &settings, seed);
            assert_eq!(d.termination, Termination::Converged);
            assert_eq!(groups_total(&d.groups), Decimal::from(37), "seed {seed}");
            assert!(
                d.groups.iter().all(|g| g.amount >= Decimal::from(10)),
                "seed {seed}: {:?}",
                d.groups
            );
        }
    }

    #[test]
    fn remainder_below_minimum_is_booked_when_nothing_else_exists() {
        let p = pattern(&[(10, 1.0)]);
        let settings = AlgorithmSettings {
            allow_new_order_types: true,
            prefer_exact_match: false,
            ..AlgorithmSettings::default()
        };
        let d = run(7, &p, &settings, 5);

        assert_eq!(d.termination, Termination::Converged);
        assert_eq!(d.groups.len(), 1);
        assert_eq!((d.groups[0].amount, d.groups[0].count), (Decimal::from(7), 1));
    }
}
