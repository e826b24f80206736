//! The amount distribution engine.
//!
//! EXECUTION ORDER (fixed):
//!   1. Validate settings, pattern and target.
//!   2. Prepare a working copy of the pattern (rounded, renormalized).
//!   3. Decomposition loop → order groups.
//!   4. Temporal scheduler → timestamped orders.
//!
//! RULES:
//!   - The engine reads nothing ambient: every input is a parameter.
//!   - All randomness flows through the GenerationRngs passed in.
//!   - The caller's pattern is never modified.

use crate::{
    config::{AlgorithmSettings, GeneratorConfig, WorkingWindow},
    decompose::{DecompositionLoop, Termination},
    error::{DistError, DistResult},
    order::{Order, OrderGroup},
    pattern::TemplatePattern,
    progress::{Milestone, NoProgress, ProgressEvent, ProgressObserver},
    rng::{GenRng, RngBank, StreamSlot},
    schedule::schedule_orders,
    types::{Amount, PaymentPolicy},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The random streams one generation call consumes.
pub struct GenerationRngs {
    pub decomposition: GenRng,
    pub schedule: GenRng,
}

impl GenerationRngs {
    /// Streams for the `report_index`-th generation of a bank.
    pub fn from_bank(bank: &RngBank, report_index: u64) -> Self {
        Self {
            decomposition: bank.for_stream(report_index, StreamSlot::Decomposition),
            schedule: bank.for_stream(report_index, StreamSlot::Schedule),
        }
    }

    /// Streams for a single standalone call.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_bank(&RngBank::new(seed), 0)
    }
}

/// Everything one generation call needs besides randomness.
#[derive(Debug, Clone)]
pub struct DistributionRequest<'a> {
    pub target_amount: Amount,
    pub pattern: &'a TemplatePattern,
    pub payment_policy: PaymentPolicy,
    pub settings: AlgorithmSettings,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionResult {
    pub orders: Vec<Order>,
    pub order_groups: Vec<OrderGroup>,
    pub termination: Termination,
    pub iterations: u32,
    pub residual: Amount,
}

impl DistributionResult {
    pub fn is_exhausted(&self) -> bool {
        self.termination == Termination::Exhausted
    }
}

pub struct DistributionEngine {
    window: WorkingWindow,
}

impl Default for DistributionEngine {
    fn default() -> Self {
        Self::new(WorkingWindow::default())
    }
}

impl DistributionEngine {
    pub fn new(window: WorkingWindow) -> Self {
        Self { window }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.window)
    }

    /// Run one generation call.
    ///
    /// Fails only on invalid input (`InvalidSettings`, `InvalidTemplate`,
    /// `InvalidTarget`), before any iteration. An exhausted loop is
    /// returned as a result, not an error.
    pub fn distribute(
        &self,
        request: &DistributionRequest<'_>,
        rngs: &mut GenerationRngs,
        observer: &mut dyn ProgressObserver,
    ) -> DistResult<DistributionResult> {
        request.settings.validate()?;
        self.window.validate()?;
        if request.pattern.is_empty() {
            return Err(DistError::invalid_template("pattern is empty"));
        }
        if request.target_amount <= Amount::ZERO {
            return Err(DistError::InvalidTarget {
                amount: request.target_amount,
            });
        }
        report(observer, Milestone::Started);

        let precision = request.settings.rounding_precision;
        let working = request.pattern.prepared(precision)?;
        report(observer, Milestone::PatternPrepared);

        let decomposition = DecompositionLoop::new(
            request.target_amount,
            &working,
            &request.settings,
            request.payment_policy,
        )?
        .run(&mut rngs.decomposition);
        report(observer, Milestone::Decomposed);

        let orders = schedule_orders(
            &decomposition.groups,
            request.date,
            &self.window,
            &mut rngs.schedule,
        );
        report(observer, Milestone::Scheduled);

        log::debug!(
            "distributed {} over {} orders in {} groups ({:?}, {} iterations)",
            request.target_amount,
            orders.len(),
            decomposition.groups.len(),
            decomposition.termination,
            decomposition.iterations
        );
        report(observer, Milestone::Completed);

        Ok(DistributionResult {
            orders,
            order_groups: decomposition.groups,
            termination: decomposition.termination,
            iterations: decomposition.iterations,
            residual: decomposition.residual,
        })
    }
}

fn report(observer: &mut dyn ProgressObserver, milestone: Milestone) {
    observer.on_progress(&ProgressEvent::from(milestone));
}

/// One-shot distribution with the default window, a fresh seeded
/// stream and no observer.
pub fn distribute_amount(
    target_amount: Amount,
    pattern: &TemplatePattern,
    payment_policy: PaymentPolicy,
    settings: AlgorithmSettings,
    date: NaiveDate,
    seed: u64,
) -> DistResult<DistributionResult> {
    let request = DistributionRequest {
        target_amount,
        pattern,
        payment_policy,
        settings,
        date,
    };
    DistributionEngine::default().distribute(
        &request,
        &mut GenerationRngs::from_seed(seed),
        &mut NoProgress,
    )
}
