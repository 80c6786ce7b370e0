//! Runs the registered regression scenarios and exits non-zero unless all pass.

use clap::Parser;
use regression_harness::provenance::write_reports;
use regression_harness::framework;
use regression_harness::scenarios::{run_selected, ScenarioManager};
use regression_harness::HarnessConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// JSON harness config. Defaults to the fixtures shipped with the crate.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Regenerate reference files from the current results.
    #[arg(long)]
    bless: bool,

    /// Write a JSON report of every run to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Only run the named scenario(s).
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    framework::init_stderr_logging();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("regress failed: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default_paths(),
    }
    .with_env_overrides()?;
    config.bless |= args.bless;

    let manager = ScenarioManager::new();
    let selected = if args.scenarios.is_empty() {
        manager.scenarios().iter().collect::<Vec<_>>()
    } else {
        args.scenarios
            .iter()
            .map(|name| manager.get(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut reports = Vec::with_capacity(selected.len());
    let mut all_passed = true;
    for (entry, outcome) in run_selected(&selected, &config) {
        match outcome {
            Ok(report) => {
                let status = if report.passed { "PASS" } else { "FAIL" };
                match &report.comparison {
                    Some(comparison) if !report.passed => {
                        println!("{}: {} ({})", entry.name, status, comparison)
                    }
                    _ => println!("{}: {}", entry.name, status),
                }
                all_passed &= report.passed;
                reports.push(report);
            }
            Err(e) => {
                println!("{}: FAIL ({})", entry.name, e);
                all_passed = false;
            }
        }
    }

    let report_path = args
        .report
        .or_else(|| config.report_dir.as_ref().map(|dir| dir.join("regression_report.json")));
    if let Some(path) = report_path {
        write_reports(&path, &reports)?;
        println!("wrote {}", path.display());
    }

    println!("Regression status: {}", if all_passed { "PASS" } else { "FAIL" });
    Ok(all_passed)
}
