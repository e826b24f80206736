//! Report generation service tests.

use chrono::NaiveDate;
use daybook_core::{
    config::{AlgorithmSettings, GeneratorConfig},
    error::DistError,
    order::orders_total,
    progress::{NoProgress, ProgressEvent},
    report::{merge_reports_by_date, ReportParams, ReportService},
    store::Store,
    template::{NewTemplate, TemplateEntry},
    types::{PaymentMethod, PaymentPolicy},
};
use rust_decimal::Decimal;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store_with_templates() -> (Store, Vec<String>) {
    let store = Store::in_memory().expect("in-memory store");
    store.migrate().expect("migration");

    let bakery = NewTemplate {
        name: "Bakery".into(),
        date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        payment_policy: PaymentPolicy::Mixed,
        total_amount: Decimal::new(41_000, 2),
        entries: vec![
            TemplateEntry { id: "croissant".into(), amount: Decimal::new(180, 2), frequency: 40, payment_method: None, description: Some("Croissant".into()) },
            TemplateEntry { id: "loaf".into(), amount: Decimal::new(420, 2), frequency: 25, payment_method: None, description: Some("Loaf".into()) },
            TemplateEntry { id: "cake".into(), amount: Decimal::new(2800, 2), frequency: 4, payment_method: Some(PaymentMethod::Card), description: Some("Cake".into()) },
        ],
    };
    let deli = NewTemplate {
        name: "Deli".into(),
        date: NaiveDate::from_ymd_opt(2026, 9, 2).unwrap(),
        payment_policy: PaymentPolicy::Card,
        total_amount: Decimal::new(30_000, 2),
        entries: vec![
            TemplateEntry { id: "sandwich".into(), amount: Decimal::new(650, 2), frequency: 30, payment_method: None, description: None },
            TemplateEntry { id: "loaf".into(), amount: Decimal::new(420, 2), frequency: 5, payment_method: None, description: None },
        ],
    };

    let ids = vec![
        store.insert_template(bakery).unwrap().id,
        store.insert_template(deli).unwrap().id,
    ];
    (store, ids)
}

fn params(day: u32, target_cents: i64, template_ids: Vec<String>) -> ReportParams {
    ReportParams {
        date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
        target_amount: Decimal::new(target_cents, 2),
        payment_policy: PaymentPolicy::Mixed,
        template_ids,
        settings: None,
    }
}

#[test]
fn generated_report_is_consistent_and_persisted() {
    init_logging();
    let (store, ids) = store_with_templates();
    let mut service = ReportService::new(&store, &GeneratorConfig::default_test(), 42);

    let report = service
        .generate_daily_report(&params(17, 123_456, vec![ids[0].clone()]), &mut NoProgress)
        .unwrap();

    assert_eq!(report.total_amount, Decimal::new(123_456, 2));
    assert_eq!(report.total_amount, orders_total(&report.orders));
    assert_eq!(report.cash_amount + report.card_amount, report.total_amount);
    assert!(!report.approximate);
    assert_eq!(store.report_by_id(&report.id).unwrap().as_ref(), Some(&report));
    assert_eq!(store.report_count().unwrap(), 1);
}

#[test]
fn several_template_ids_use_the_merged_template() {
    let (store, ids) = store_with_templates();
    let mut service = ReportService::new(&store, &GeneratorConfig::default_test(), 7);

    let strict = ReportParams {
        settings: Some(AlgorithmSettings::strict()),
        ..params(18, 650, ids.clone())
    };
    let report = service.generate_daily_report(&strict, &mut NoProgress).unwrap();

    // 6.50 only exists in the deli template.
    assert_eq!(report.orders.len(), 1);
    assert_eq!(report.orders[0].amount, Decimal::new(650, 2));
    assert_eq!(report.template_ids, ids);
}

#[test]
fn unknown_or_missing_templates_fail() {
    let (store, _) = store_with_templates();
    let mut service = ReportService::new(&store, &GeneratorConfig::default_test(), 7);

    let err = service
        .generate_daily_report(&params(17, 1_000, vec!["missing".into()]), &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, DistError::TemplateNotFound { .. }), "got {err:?}");

    let err = service
        .generate_daily_report(&params(17, 1_000, vec![]), &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, DistError::TemplateNotFound { .. }), "got {err:?}");
    assert_eq!(store.report_count().unwrap(), 0);
}

#[test]
fn batch_skips_failures_and_reports_progress() {
    init_logging();
    let (store, ids) = store_with_templates();
    let mut service = ReportService::new(&store, &GeneratorConfig::default_test(), 11);

    let batch = vec![
        params(1, 50_000, vec![ids[0].clone()]),
        params(2, 0, vec![ids[0].clone()]),
        params(3, 75_025, vec![ids[1].clone()]),
    ];
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut record = |e: &ProgressEvent| events.push(e.clone());
    let reports = service.generate_multiple_reports(&batch, &mut record);

    assert_eq!(reports.len(), 2);
    assert_eq!(store.report_count().unwrap(), 2);
    assert_eq!(events.first().map(|e| e.progress), Some(0));
    assert_eq!(events.last().map(|e| e.progress), Some(100));
    assert_eq!(events.len(), batch.len() + 2);
    assert_eq!(store.reported_total().unwrap(), Decimal::new(125_025, 2));
}

#[test]
fn same_seed_same_reports() {
    let (store_a, ids_a) = store_with_templates();
    let (store_b, ids_b) = store_with_templates();
    let mut a = ReportService::new(&store_a, &GeneratorConfig::default_test(), 99);
    let mut b = ReportService::new(&store_b, &GeneratorConfig::default_test(), 99);

    let ra = a.generate_daily_report(&params(5, 98_765, vec![ids_a[0].clone()]), &mut NoProgress).unwrap();
    let rb = b.generate_daily_report(&params(5, 98_765, vec![ids_b[0].clone()]), &mut NoProgress).unwrap();

    assert_eq!(ra.orders, rb.orders);
    assert_eq!(ra.order_groups, rb.order_groups);
}

#[test]
fn reports_sharing_a_date_are_merged() {
    let (store, ids) = store_with_templates();
    let mut service = ReportService::new(&store, &GeneratorConfig::default_test(), 3);

    let cash_run = ReportParams {
        payment_policy: PaymentPolicy::Cash,
        ..params(20, 40_000, vec![ids[1].clone()])
    };
    let card_run = ReportParams {
        payment_policy: PaymentPolicy::Card,
        ..params(20, 25_000, vec![ids[0].clone()])
    };
    let other_day = params(21, 10_000, vec![ids[0].clone()]);
    for p in [&cash_run, &card_run, &other_day] {
        service.generate_daily_report(p, &mut NoProgress).unwrap();
    }

    let merged = merge_reports_by_date(&store.all_reports().unwrap());
    assert_eq!(merged.len(), 2);

    let day = &merged[0];
    assert_eq!(day.date, cash_run.date);
    assert_eq!(day.target_amount, Decimal::new(65_000, 2));
    assert_eq!(day.total_amount, Decimal::new(65_000, 2));
    assert_eq!(day.cash_amount, Decimal::new(40_000, 2));
    assert_eq!(day.card_amount, Decimal::new(25_000, 2));
    assert_eq!(orders_total(&day.orders), day.total_amount);
    assert!(day.orders.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    let regrouped: u32 = day.order_groups.iter().map(|g| g.count).sum();
    assert_eq!(regrouped as usize, day.orders.len());
    assert_eq!(day.template_ids, vec![ids[1].clone(), ids[0].clone()]);

    assert_eq!(merged[1].date, other_day.date);
}
