//! `sqlguard check` command: validate SQL templates against declared tables

use anyhow::{Context, Result};
use serde::Serialize;
use sg_analysis::{check_files, CheckOptions, CheckReport, Diagnostic, Severity};

use crate::cli::{CheckArgs, GlobalArgs, OutputFormat, SeverityFilter};
use crate::commands::common::{self, ExitCode};

/// JSON output of a check run
#[derive(Serialize)]
struct CheckOutput<'a> {
    diagnostics: Vec<&'a Diagnostic>,
    query_count: usize,
    table_count: usize,
    error_count: usize,
    warning_count: usize,
}

/// Execute the check command
pub fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let manifest_paths = common::discover_manifests(&args.paths, &config, global)?;
    let files = common::load_manifests(&manifest_paths, global)?;

    if files.is_empty() {
        println!("No manifests found.");
        return Ok(());
    }

    log::debug!(
        "Checking {} manifest(s) with the {:?} dialect",
        files.len(),
        config.dialect
    );
    if global.verbose {
        for file in &files {
            eprintln!(
                "[verbose] Checking {} ({} templates, {} tables)",
                file.path.display(),
                file.templates.len(),
                file.tables.len()
            );
        }
    }

    let options = CheckOptions::from_config(&config);
    let report = check_files(&files, &options).context("Failed to check SQL templates")?;

    let min_severity = match args.severity {
        SeverityFilter::Info => Severity::Info,
        SeverityFilter::Warning => Severity::Warning,
        SeverityFilter::Error => Severity::Error,
    };
    let shown: Vec<&Diagnostic> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity >= min_severity)
        .collect();

    match args.output {
        OutputFormat::Json => print_json(&report, shown)?,
        OutputFormat::Text => print_text(&report, &shown),
    }

    // filtered-out errors still fail the run
    if report.has_errors() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_text(report: &CheckReport, shown: &[&Diagnostic]) {
    for diagnostic in shown {
        println!("{diagnostic}\n");
    }

    if report.diagnostics.is_empty() {
        println!(
            "Validated {} queries against {} table schemas. All fine!",
            report.query_count, report.table_count
        );
    } else {
        println!(
            "Validated {} queries against {} table schemas: {} errors, {} warnings",
            report.query_count,
            report.table_count,
            report.error_count(),
            report.warning_count()
        );
    }
}

fn print_json(report: &CheckReport, shown: Vec<&Diagnostic>) -> Result<()> {
    let output = CheckOutput {
        diagnostics: shown,
        query_count: report.query_count,
        table_count: report.table_count,
        error_count: report.error_count(),
        warning_count: report.warning_count(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
