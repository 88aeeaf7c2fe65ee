//! `billsync run` / `compare` / `check`.
//!
//! Strictly linear: load A, load B, compare, optionally push A-only records,
//! persist. Progress goes to stdout unless `--json` asks for the report
//! document there instead.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use billsync_config::Settings;
use billsync_gateway::{
    GatewayOptions, HttpTransport, HttpTransportConfig, LedgerGateway, QbxmlGateway,
};
use billsync_io::report::write_document;
use billsync_io::{parse_records, read_table, ParsedRecords, RecordSchema, ReportDocument};
use billsync_recon::{
    compare_with, compute_summary, CompareOptions, ComparisonReport, Origin, PushOutcome, Record,
};

use crate::exit_codes::EXIT_PUSH_FAILED;
use crate::CliError;

/// Stdout progress lines, silenced under `--json`.
pub struct Progress {
    quiet: bool,
}

impl Progress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn say(&self, message: impl Display) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}

pub struct RunArgs {
    pub workbook: PathBuf,
    pub report: Option<PathBuf>,
    pub sheet: Option<String>,
    pub no_push: bool,
    pub json: bool,
}

pub struct CompareArgs {
    pub workbook: PathBuf,
    pub ledger_csv: PathBuf,
    pub report: Option<PathBuf>,
    pub sheet: Option<String>,
    pub json: bool,
}

pub fn cmd_run(settings: &Settings, args: RunArgs) -> Result<(), CliError> {
    settings.validate(true).map_err(CliError::config)?;
    let progress = Progress::new(args.json);

    let sheet = args.sheet.as_deref().or(settings.workbook.sheet.as_deref());
    let source_a = load_source(&args.workbook, sheet, &settings.workbook.columns, Origin::A)?;
    progress.say(format_args!(
        "Loaded {} records from workbook ({} rows skipped)",
        source_a.records.len(),
        source_a.skipped_rows()
    ));

    let gateway = build_gateway(settings)?;
    let source_b = gateway.fetch_records().map_err(CliError::gateway)?;
    progress.say(format_args!("Fetched {} records from ledger", source_b.len()));

    let report = compare(settings, &source_a.records, &source_b)?;
    print_summary(&progress, &report);

    let outcome = if args.no_push {
        progress.say("Push-back disabled (--no-push)");
        PushOutcome::new()
    } else if report.a_only.is_empty() {
        PushOutcome::new()
    } else {
        progress.say(format_args!("Adding {} A-only records to ledger...", report.a_only.len()));
        let outcome = gateway.push_records(&report.a_only);
        let counts = outcome.counts();
        progress.say(format_args!(
            "  synchronized: {}  skipped: {}  failed: {}",
            counts.synchronized, counts.skipped, counts.failed
        ));
        outcome
    };

    let report_path = args.report.clone().unwrap_or_else(|| settings.report.path.clone());
    persist(&report, &outcome, &report_path, args.json, &progress)?;

    if outcome.has_failures() {
        let detail = outcome
            .batch_error
            .clone()
            .unwrap_or_else(|| format!("{} record(s) failed to sync", outcome.counts().failed));
        return Err(CliError {
            code: EXIT_PUSH_FAILED,
            message: format!("push-back incomplete: {}", detail),
            hint: Some(format!(
                "report written to {} with status \"partial\"",
                report_path.display()
            )),
        });
    }
    Ok(())
}

pub fn cmd_compare(settings: &Settings, args: CompareArgs) -> Result<(), CliError> {
    settings.validate(false).map_err(CliError::config)?;
    let progress = Progress::new(args.json);
    let columns = &settings.workbook.columns;

    let sheet = args.sheet.as_deref().or(settings.workbook.sheet.as_deref());
    let source_a = load_source(&args.workbook, sheet, columns, Origin::A)?;
    progress.say(format_args!(
        "Loaded {} records from workbook ({} rows skipped)",
        source_a.records.len(),
        source_a.skipped_rows()
    ));

    let source_b = load_source(&args.ledger_csv, None, columns, Origin::B)?;
    progress.say(format_args!(
        "Loaded {} records from ledger export ({} rows skipped)",
        source_b.records.len(),
        source_b.skipped_rows()
    ));

    let report = compare(settings, &source_a.records, &source_b.records)?;
    print_summary(&progress, &report);

    let report_path = args.report.unwrap_or_else(|| settings.report.path.clone());
    persist(&report, &PushOutcome::new(), &report_path, args.json, &progress)
}

pub fn cmd_check(
    settings: &Settings,
    workbook: &Path,
    sheet: Option<&str>,
) -> Result<(), CliError> {
    settings.validate(false).map_err(CliError::config)?;
    let sheet = sheet.or(settings.workbook.sheet.as_deref());
    let parsed = load_source(workbook, sheet, &settings.workbook.columns, Origin::A)?;

    for diag in &parsed.skipped {
        println!("{}", diag);
    }
    let field_warnings = parsed.skipped.len() - parsed.skipped_rows();
    println!(
        "{}: {} records, {} rows skipped, {} field warnings",
        workbook.display(),
        parsed.records.len(),
        parsed.skipped_rows(),
        field_warnings
    );
    Ok(())
}

fn load_source(
    path: &Path,
    sheet: Option<&str>,
    columns: &RecordSchema,
    origin: Origin,
) -> Result<ParsedRecords, CliError> {
    let table = read_table(path, sheet).map_err(|e| CliError::source(path, e))?;
    parse_records(&table, columns, origin).map_err(|e| CliError::source(path, e))
}

fn build_gateway(settings: &Settings) -> Result<QbxmlGateway<HttpTransport>, CliError> {
    let gw = &settings.gateway;
    let mut config = HttpTransportConfig::new(gw.endpoint.clone());
    config.token = gw.token.clone();
    config.app_name = gw.app_name.clone();
    config.timeout = std::time::Duration::from_secs(gw.timeout_secs);
    config.max_retries = gw.max_retries;

    let transport = HttpTransport::new(config).map_err(CliError::gateway)?;
    Ok(QbxmlGateway::new(
        transport,
        GatewayOptions {
            qbxml_version: gw.qbxml_version.clone(),
            batch_policy: gw.batch_policy,
        },
    ))
}

fn compare(settings: &Settings, a: &[Record], b: &[Record]) -> Result<ComparisonReport, CliError> {
    let options = CompareOptions {
        on_duplicate: settings.compare.on_duplicate,
    };
    compare_with(a, b, &options).map_err(CliError::duplicates)
}

fn print_summary(progress: &Progress, report: &ComparisonReport) {
    let summary = compute_summary(report);
    progress.say(format_args!(
        "Compared: {} matched, {} conflicts, {} only in workbook, {} only in ledger",
        summary.matched, summary.conflicts, summary.a_only, summary.b_only
    ));
    if !report.duplicates.is_empty() {
        progress.say(format_args!(
            "warning: {} duplicated keys (last occurrence used)",
            report.duplicates.len()
        ));
    }
}

fn persist(
    report: &ComparisonReport,
    outcome: &PushOutcome,
    path: &Path,
    json: bool,
    progress: &Progress,
) -> Result<(), CliError> {
    let document = ReportDocument::new(report, outcome);
    write_document(&document, path).map_err(CliError::report)?;
    if json {
        let rendered = document.to_json_pretty().map_err(CliError::report)?;
        println!("{}", rendered);
    }
    progress.say(format_args!("Report saved to {}", path.display()));
    Ok(())
}
