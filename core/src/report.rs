//! Daily reports: the generation service that ties the Template Store,
//! the engine and the Report Store together.

use crate::{
    config::{AlgorithmSettings, GeneratorConfig},
    engine::{DistributionEngine, DistributionRequest, GenerationRngs},
    error::{DistError, DistResult},
    order::{orders_total, orders_total_for, regroup, Order, OrderGroup},
    pattern::TemplatePattern,
    progress::{NoProgress, ProgressEvent, ProgressObserver},
    rng::RngBank,
    store::Store,
    template::Template,
    types::{Amount, EntityId, PaymentMethod, PaymentPolicy},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReport {
    pub id: EntityId,
    pub date: NaiveDate,
    pub total_amount: Amount,
    pub target_amount: Amount,
    pub cash_amount: Amount,
    pub card_amount: Amount,
    pub orders: Vec<Order>,
    pub order_groups: Vec<OrderGroup>,
    pub generated_at: DateTime<Utc>,
    pub template_ids: Vec<EntityId>,
    /// The engine hit its iteration ceiling; `total_amount` falls short
    /// of `target_amount`.
    #[serde(default)]
    pub approximate: bool,
}

/// Parameters for one daily report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportParams {
    pub date: NaiveDate,
    pub target_amount: Amount,
    #[serde(default)]
    pub payment_policy: PaymentPolicy,
    pub template_ids: Vec<EntityId>,
    /// Overrides the service defaults when present.
    #[serde(default)]
    pub settings: Option<AlgorithmSettings>,
}

pub struct ReportService<'s> {
    store: &'s Store,
    engine: DistributionEngine,
    defaults: AlgorithmSettings,
    bank: RngBank,
    next_index: u64,
}

impl<'s> ReportService<'s> {
    pub fn new(store: &'s Store, config: &GeneratorConfig, seed: u64) -> Self {
        Self {
            store,
            engine: DistributionEngine::from_config(config),
            defaults: config.settings,
            bank: RngBank::new(seed),
            next_index: 0,
        }
    }

    /// Load the template a report is generated from: the single
    /// template when one id is given, the merge of all otherwise.
    pub fn resolve_template(&self, template_ids: &[EntityId]) -> DistResult<Template> {
        let not_found = || DistError::TemplateNotFound {
            id: template_ids.join(","),
        };
        match template_ids {
            [] => Err(not_found()),
            [single] => self.store.template_by_id(single)?.ok_or_else(not_found),
            many => self.store.merged_template(many)?.ok_or_else(not_found),
        }
    }

    /// Generate, persist and return one report.
    pub fn generate_daily_report(
        &mut self,
        params: &ReportParams,
        observer: &mut dyn ProgressObserver,
    ) -> DistResult<DailyReport> {
        let index = self.next_index;
        self.next_index += 1;

        let template = self.resolve_template(&params.template_ids)?;
        let pattern = TemplatePattern::from_template(&template)?;
        let request = DistributionRequest {
            target_amount: params.target_amount,
            pattern: &pattern,
            payment_policy: params.payment_policy,
            settings: params.settings.unwrap_or(self.defaults),
            date: params.date,
        };
        let mut rngs = GenerationRngs::from_bank(&self.bank, index);
        let result = self.engine.distribute(&request, &mut rngs, observer)?;

        let report = DailyReport {
            id: Uuid::new_v4().to_string(),
            date: params.date,
            total_amount: orders_total(&result.orders),
            target_amount: params.target_amount,
            cash_amount: orders_total_for(&result.orders, PaymentMethod::Cash),
            card_amount: orders_total_for(&result.orders, PaymentMethod::Card),
            approximate: result.is_exhausted(),
            orders: result.orders,
            order_groups: result.order_groups,
            generated_at: Utc::now(),
            template_ids: params.template_ids.clone(),
        };
        if report.approximate {
            log::warn!(
                "report for {} is approximate: {} of {}",
                report.date,
                report.total_amount,
                report.target_amount
            );
        }
        self.store.save_report(&report)?;
        Ok(report)
    }

    /// Generate a batch. A failing entry is logged and skipped; the
    /// others still go through.
    pub fn generate_multiple_reports(
        &mut self,
        batch: &[ReportParams],
        observer: &mut dyn ProgressObserver,
    ) -> Vec<DailyReport> {
        let total = batch.len();
        observer.on_progress(&ProgressEvent {
            message: format!("Preparing to generate {total} reports..."),
            progress: 0,
        });

        let mut reports = Vec::with_capacity(total);
        for (i, params) in batch.iter().enumerate() {
            observer.on_progress(&ProgressEvent {
                message: format!("Generating report {} of {total}...", i + 1),
                progress: percent(i + 1, total),
            });
            match self.generate_daily_report(params, &mut NoProgress) {
                Ok(report) => reports.push(report),
                Err(e) => log::warn!("skipping report for {}: {e}", params.date),
            }
        }

        observer.on_progress(&ProgressEvent {
            message: format!("Successfully generated {} reports!", reports.len()),
            progress: 100,
        });
        reports
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        ((done * 100 + total / 2) / total).min(100) as u8
    }
}

/// Combine reports that share a date. Dates keep their first-seen
/// order; a date with a single report passes through unchanged.
pub fn merge_reports_by_date(reports: &[DailyReport]) -> Vec<DailyReport> {
    let mut by_date: Vec<(NaiveDate, Vec<&DailyReport>)> = Vec::new();
    for report in reports {
        match by_date.iter_mut().find(|(d, _)| *d == report.date) {
            Some((_, same_day)) => same_day.push(report),
            None => by_date.push((report.date, vec![report])),
        }
    }

    by_date
        .into_iter()
        .map(|(date, same_day)| match same_day.as_slice() {
            [only] => (*only).clone(),
            _ => combine(date, &same_day),
        })
        .collect()
}

fn combine(date: NaiveDate, same_day: &[&DailyReport]) -> DailyReport {
    let mut orders: Vec<Order> = same_day.iter().flat_map(|r| r.orders.iter().cloned()).collect();
    orders.sort_by_key(|o| o.timestamp);

    let mut template_ids: Vec<EntityId> = Vec::new();
    for id in same_day.iter().flat_map(|r| r.template_ids.iter()) {
        if !template_ids.contains(id) {
            template_ids.push(id.clone());
        }
    }

    DailyReport {
        id: Uuid::new_v4().to_string(),
        date,
        total_amount: same_day.iter().map(|r| r.total_amount).sum(),
        target_amount: same_day.iter().map(|r| r.target_amount).sum(),
        cash_amount: same_day.iter().map(|r| r.cash_amount).sum(),
        card_amount: same_day.iter().map(|r| r.card_amount).sum(),
        order_groups: regroup(&orders),
        orders,
        generated_at: Utc::now(),
        template_ids,
        approximate: same_day.iter().any(|r| r.approximate),
    }
}
