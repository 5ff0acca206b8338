mod commands;
mod logging;
mod progress;

use std::process;

use acov_core::index::FileCategory;
use acov_core::{render, AppConfig, CoverageEngine, RunDiagnostics};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(args.verbose);

    let mut config = match acov_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    match args.command {
        Some(Commands::Run(run_args)) => {
            run_args.apply(&mut config);
            if let Err(err) = run_report(&config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Index(project_args)) => {
            project_args.apply(&mut config);
            if let Err(err) = run_index(&config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_report(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = CoverageEngine::new(config.clone());
    let reporter = CliReporter::new();
    let result = engine.run(&reporter)?;
    let summary = render::write_reports(&result.reports, &config.output_dir, &reporter)?;

    println!();
    info!(
        "Index: {}, Analysis: {}, Render: {}",
        format!("{:.2}s", result.index_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.analysis_duration.as_secs_f64()).green(),
        format!("{:.2}s", summary.duration.as_secs_f64()).green(),
    );
    info!(
        "{} files indexed, {} artifacts analyzed, {} without coverage data",
        format!("{}", result.files_indexed).cyan(),
        format!("{}", result.diagnostics.artifacts_analyzed).cyan(),
        format!("{}", result.diagnostics.artifacts_without_graph).cyan(),
    );
    info!(
        "{} reports written to {}",
        format!("{}", summary.pages_written).green(),
        config.output_dir.display(),
    );
    if summary.pages_failed > 0 {
        warn!(
            "{} reports could not be rendered",
            format!("{}", summary.pages_failed).red()
        );
    }
    report_diagnostics(&result.diagnostics);

    Ok(())
}

fn report_diagnostics(diagnostics: &RunDiagnostics) {
    let problems = [
        (diagnostics.tool_failures, "coverage tool failures"),
        (diagnostics.missing_data_files, "announced data files missing"),
        (diagnostics.malformed_records, "malformed coverage records"),
        (diagnostics.malformed_diff_hunks, "malformed diff hunks"),
        (diagnostics.diff_fallbacks, "files treated as new after a failed diff"),
        (diagnostics.dropped_reports, "reports dropped after a failed diff"),
    ];
    for (count, what) in problems {
        if count > 0 {
            warn!("{} {}", format!("{}", count).yellow(), what);
        }
    }
    if diagnostics.external_sources_skipped > 0 {
        info!(
            "{} data files for sources outside the projects were ignored",
            diagnostics.external_sources_skipped
        );
    }
}

fn run_index(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = CoverageEngine::new(config.clone());
    let index = engine.index()?;

    for project in index.projects() {
        println!("{}", project.root().display().to_string().bold());
        match project.old_root() {
            Some(old_root) => println!("  previous revision: {}", old_root.display()),
            None => println!("  previous revision: {}", "none".dimmed()),
        }
        for category in FileCategory::ALL {
            let tree = project.tree(category);
            let old_count = tree
                .previous()
                .map(|old| format!(" ({} in previous)", old.len()))
                .unwrap_or_default();
            println!(
                "  {:<15} {}{}",
                category.to_string(),
                format!("{}", tree.files().len()).cyan(),
                old_count
            );
        }
    }
    info!("{} files indexed", index.file_count());

    Ok(())
}
