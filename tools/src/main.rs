//! daybook-runner: headless report generator.
//!
//! Usage:
//!   daybook-runner --templates data/templates.json --target 1234.50 --date 2026-10-17
//!   daybook-runner --templates data/templates.json --seed 7 --policy card --config data/gen.json
//!   daybook-runner --templates templates.json --ipc-mode

use anyhow::{Context, Result};
use chrono::NaiveDate;
use daybook_core::{
    config::GeneratorConfig,
    error::DistResult,
    progress::ProgressEvent,
    report::{merge_reports_by_date, DailyReport, ReportParams, ReportService},
    store::Store,
    template::NewTemplate,
    types::{Amount, PaymentPolicy},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

#[derive(serde::Deserialize)]
struct TemplatesFile {
    templates: Vec<NewTemplate>,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Generate { params: ReportParams },
    ListReports,
    MergeByDate,
    DeleteReport { id: String },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let templates_path = string_arg(&args, "--templates").unwrap_or("./templates.json");

    let config = match string_arg(&args, "--config") {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    let store = Store::open(db)?;
    store.migrate()?;
    let template_ids = load_templates(&store, templates_path)?;

    let mut service = ReportService::new(&store, &config, seed);

    if ipc_mode {
        return run_ipc_loop(&mut service, &store);
    }

    let target = match string_arg(&args, "--target") {
        Some(raw) => Amount::from_str(raw).with_context(|| format!("bad --target '{raw}'"))?,
        None => anyhow::bail!("--target is required outside --ipc-mode"),
    };
    let date = match string_arg(&args, "--date") {
        Some(raw) => NaiveDate::from_str(raw).with_context(|| format!("bad --date '{raw}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    let policy = match string_arg(&args, "--policy") {
        Some(raw) => PaymentPolicy::from_str(raw).map_err(anyhow::Error::msg)?,
        None => config.payment_policy,
    };

    println!("daybook-runner");
    println!("  seed:      {seed}");
    println!("  target:    {target}");
    println!("  date:      {date}");
    println!("  policy:    {}", policy.as_str());
    println!("  templates: {} from {templates_path}", template_ids.len());
    println!();

    let params = ReportParams {
        date,
        target_amount: target,
        payment_policy: policy,
        template_ids,
        settings: None,
    };
    let mut on_progress = |e: &ProgressEvent| log::info!("[{:>3}%] {}", e.progress, e.message);
    let report = service.generate_daily_report(&params, &mut on_progress)?;
    print_summary(&report);
    Ok(())
}

/// Insert every template in the file; returns their new ids.
fn load_templates(store: &Store, path: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let file: TemplatesFile = serde_json::from_str(&content)?;
    let mut ids = Vec::with_capacity(file.templates.len());
    for template in file.templates {
        ids.push(store.insert_template(template)?.id);
    }
    Ok(ids)
}

fn run_ipc_loop(service: &mut ReportService<'_>, store: &Store) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let response = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Generate { params } => to_response(
                service.generate_daily_report(&params, &mut |_: &ProgressEvent| {}),
            )?,
            IpcCommand::ListReports => to_response(store.all_reports())?,
            IpcCommand::MergeByDate => {
                to_response(store.all_reports().map(|r| merge_reports_by_date(&r)))?
            }
            IpcCommand::DeleteReport { id } => to_response(
                store
                    .delete_report(&id)
                    .map(|deleted| serde_json::json!({ "deleted": deleted })),
            )?,
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

/// A failed command answers `{"error": ...}` and keeps the session alive.
fn to_response<T: serde::Serialize>(result: DistResult<T>) -> Result<serde_json::Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(e) => {
            log::warn!("ipc command failed: {e}");
            Ok(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

fn print_summary(report: &DailyReport) {
    println!("=== REPORT {} ===", report.id);
    println!("  date:        {}", report.date);
    println!("  target:      {}", report.target_amount);
    println!("  total:       {}", report.total_amount);
    println!("  cash:        {}", report.cash_amount);
    println!("  card:        {}", report.card_amount);
    println!("  orders:      {}", report.orders.len());
    if report.approximate {
        println!("  (approximate: iteration ceiling reached)");
    }

    println!();
    println!("=== ORDER GROUPS ===");
    for g in &report.order_groups {
        println!("  {:>10} x{:<4} {}", g.amount, g.count, g.payment_method);
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::error::DistError;

    #[test]
    fn failed_command_answers_with_error_object() {
        let failed: DistResult<bool> = Err(DistError::ReportNotFound { id: "r-1".into() });
        let value = to_response(failed).unwrap();
        assert!(value["error"].as_str().is_some_and(|m| m.contains("r-1")), "{value}");
    }

    #[test]
    fn successful_command_is_serialized_as_is() {
        let ok: DistResult<serde_json::Value> = Ok(serde_json::json!({ "deleted": true }));
        assert_eq!(to_response(ok).unwrap(), serde_json::json!({ "deleted": true }));
    }
}
