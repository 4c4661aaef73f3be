//! Migrate command: workspace markdown into the memory gateway.
//!
//! Only an unreachable gateway at start ends the command with an error.
//! Per-file and per-fact problems are counted and shown in the summary.

use anyhow::{Context, Result};
use colored::Colorize;
use cortex_core::extract::{ChatCompletionsGenerator, DelegatedExtractor, FactExtractor, LocalExtractor};
use cortex_core::migrate::{
    describe_file, discover, scan, FileReport, FileStatus, MigrationReport, Migrator, ScanEntry,
};
use cortex_core::{Config, HttpGateway, MemoryGateway};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cli::MigrateArgs;
use crate::error::CliError;

/// Apply command-line overrides on top of loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &MigrateArgs) {
    if let Some(ref url) = args.braindb {
        config.gateway.url = url.clone();
    }
    if let Some(enabled) = args.swarm_override() {
        config.swarm.enabled = enabled;
    }
}

/// Execute migrate command.
pub async fn execute(args: MigrateArgs, mut config: Config) -> Result<()> {
    apply_overrides(&mut config, &args);
    let workspace = args.workspace.clone().unwrap_or_else(|| PathBuf::from("."));

    if args.scan {
        return run_scan(&args, &workspace, &config);
    }

    let files = match args.file {
        Some(ref file) => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
            vec![describe_file(file, file.parent())]
        }
        None => discover(&workspace)
            .with_context(|| format!("Failed to read workspace {}", workspace.display()))?,
    };

    let gateway: Arc<dyn MemoryGateway> = Arc::new(HttpGateway::new(&config.gateway)?);
    let extractor = build_extractor(&config)?;
    let migrator = Migrator::new(gateway, extractor, config.extraction.clone()).dry_run(args.dry_run);

    if !args.json {
        print_header(&args, &config, &workspace, files.len(), migrator.extractor_name());
    }

    let verbose = args.verbose && !args.json;
    let quiet = args.json;
    let result = migrator
        .run_with(&files, |file| {
            if !quiet {
                print_file(file, verbose);
            }
        })
        .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            let err = CliError::GatewayUnreachable {
                url: config.gateway.url.clone(),
                reason: e.to_string(),
            };
            if !args.json {
                println!("{} {}", "✗".red(), err);
                println!();
            }
            emit_report(&empty_report(&args), args.json)?;
            return Err(err.into());
        }
    };

    emit_report(&report, args.json)
}

/// Zero tally printed when the run cannot start.
fn empty_report(args: &MigrateArgs) -> MigrationReport {
    MigrationReport {
        dry_run: args.dry_run,
        ..Default::default()
    }
}

fn report_json(report: &MigrationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn emit_report(report: &MigrationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report_json(report)?);
    } else {
        print_summary(report);
    }
    Ok(())
}

fn build_extractor(config: &Config) -> Result<Arc<dyn FactExtractor>> {
    let local = LocalExtractor::new(config.extraction.clone());
    if !config.swarm.enabled {
        return Ok(Arc::new(local));
    }
    debug!(url = %config.swarm.url, model = %config.swarm.model, "Using delegated extraction");
    let generator = ChatCompletionsGenerator::new(&config.swarm)
        .map_err(|e| CliError::Extractor(e.to_string()))?;
    Ok(Arc::new(DelegatedExtractor::new(Arc::new(generator), local)))
}

/// Scan entries for the command's target: one file or the workspace.
fn scan_entries(args: &MigrateArgs, workspace: &Path, config: &Config) -> Result<Vec<ScanEntry>> {
    let Some(ref file) = args.file else {
        return scan(workspace, &config.extraction)
            .with_context(|| format!("Failed to scan workspace {}", workspace.display()));
    };
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let chars = text.trim().chars().count();
    if chars < config.extraction.min_file_chars {
        return Ok(Vec::new());
    }
    Ok(vec![ScanEntry {
        file: describe_file(file, file.parent()),
        bytes: text.len() as u64,
        chars,
    }])
}

fn run_scan(args: &MigrateArgs, workspace: &Path, config: &Config) -> Result<()> {
    let entries = scan_entries(args, workspace, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Cortex Scan".cyan().bold());
    println!("{}", "─".repeat(50));
    if entries.is_empty() {
        println!("{} No migratable files found in {}", "⚠".yellow(), workspace.display());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "  {:>3}  {:<36} {:<10} {:<10} {} bytes",
            entry.file.priority,
            entry.file.relative_path.bold(),
            entry.file.file_type.to_string().cyan(),
            entry.file.shard_hint.to_string().dimmed(),
            entry.bytes
        );
    }
    println!();
    println!("{} migratable file(s)", entries.len());
    Ok(())
}

fn print_header(args: &MigrateArgs, config: &Config, workspace: &Path, files: usize, extractor: &str) {
    println!("{}", "Cortex Migration".cyan().bold());
    println!("{}", "─".repeat(50));
    match args.file {
        Some(ref file) => println!("  File:      {}", file.display()),
        None => println!("  Workspace: {}", workspace.display()),
    }
    println!("  Gateway:   {}", config.gateway.url);
    println!("  Extractor: {}", extractor);
    if args.dry_run {
        println!("  Mode:      {}", "dry run (nothing will be encoded)".yellow());
    }
    println!("  Files:     {}", files);
    println!();
}

fn print_file(file: &FileReport, verbose: bool) {
    match file.status {
        FileStatus::Skipped => {
            println!("  {} {} {}", "○".dimmed(), file.relative_path, "(too short, skipped)".dimmed());
        }
        FileStatus::Failed => {
            let reason = file.error.as_deref().unwrap_or("unreadable");
            println!("  {} {} {}", "✗".red(), file.relative_path, reason.red());
        }
        FileStatus::DryRun => {
            println!("  {} {}: {} facts", "•".cyan(), file.relative_path.bold(), file.found());
        }
        FileStatus::Migrated => {
            let marker = if file.errors > 0 { "⚠".yellow() } else { "✓".green() };
            println!(
                "  {} {}: {} facts, {} new, {} dedup{}",
                marker,
                file.relative_path.bold(),
                file.found(),
                file.encoded,
                file.deduplicated,
                if file.errors > 0 {
                    format!(", {} errors", file.errors).red().to_string()
                } else {
                    String::new()
                }
            );
        }
    }

    if verbose {
        for fact in &file.facts {
            let shard = fact.shard.map(|s| s.to_string()).unwrap_or_default();
            println!("      [{}] {}", shard.dimmed(), fact.trigger);
        }
    }
}

fn print_summary(report: &MigrationReport) {
    println!();
    println!("{}", "─".repeat(50));
    let title = if report.dry_run { "Dry run complete" } else { "Migration complete" };
    println!("{}", title.bold());
    println!(
        "  Files: {} processed, {} skipped",
        report.files_processed, report.files_skipped
    );
    println!("  Facts found:           {}", report.facts_found);
    if !report.dry_run {
        println!("  Newly encoded:         {}", report.encoded.to_string().green());
        println!("  Gateway-deduplicated:  {}", report.deduplicated);
    }
    let errors = if report.errors > 0 {
        report.errors.to_string().red()
    } else {
        report.errors.to_string().normal()
    };
    println!("  Errors:                {}", errors);
}
