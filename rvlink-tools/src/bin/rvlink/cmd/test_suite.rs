use std::path::PathBuf;

use anyhow::bail;
use colored::Colorize;
use rvlink::suite::{self, SuiteConfig, SuiteReport, TestOutcome};

use crate::config::Config;
use crate::util::common_options::SerialOptions;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,

    /// Directory with the `*.hex` programs
    #[clap(long, help_heading = "SUITE CONFIGURATION")]
    hex_dir: Option<PathBuf>,

    /// Directory with the `*.ans` expected results
    #[clap(long, help_heading = "SUITE CONFIGURATION")]
    expected_dir: Option<PathBuf>,

    /// Address read back after each program ran
    #[clap(long, value_parser = parse_u32, help_heading = "SUITE CONFIGURATION")]
    verify_address: Option<u32>,

    /// How long each program runs before the result is read, in milliseconds
    #[clap(long, help_heading = "SUITE CONFIGURATION")]
    run_delay_ms: Option<u64>,

    /// Print expected and actual values of every case
    #[clap(long, short)]
    verbose: bool,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let suite_config = self.suite_config(&config.suite);

        let cases = suite::discover(&suite_config)?;
        if cases.is_empty() {
            bail!(
                "No test cases found in {}",
                suite_config.hex_dir.display()
            );
        }
        println!("Running {} test cases\n", cases.len());

        let mut client = self.serial.connect(&config.serial)?;
        let total = cases.len();
        let report = suite::run_suite(&mut client, &cases, &suite_config, |index, outcome| {
            println!("{}", outcome_line(index, total, outcome, self.verbose));
        });

        println!("\n{}", summary_table(&report));
        finish(&report)
    }

    fn suite_config(&self, config: &SuiteConfig) -> SuiteConfig {
        SuiteConfig {
            hex_dir: self.hex_dir.clone().unwrap_or_else(|| config.hex_dir.clone()),
            expected_dir: self
                .expected_dir
                .clone()
                .unwrap_or_else(|| config.expected_dir.clone()),
            verify_address: self.verify_address.unwrap_or(config.verify_address),
            run_delay_ms: self.run_delay_ms.unwrap_or(config.run_delay_ms),
            ..config.clone()
        }
    }
}

/// {failed} of {total} test cases failed.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct SuiteFailed {
    pub failed: usize,
    pub total: usize,
}

fn finish(report: &SuiteReport) -> anyhow::Result<()> {
    let summary = format!("{}/{} passed", report.passed(), report.total());
    if report.all_passed() {
        println!("{}", summary.green().bold());
        return Ok(());
    }

    println!("{}", summary.red().bold());
    Err(SuiteFailed {
        failed: report.total() - report.passed(),
        total: report.total(),
    }
    .into())
}

/// One row per case with the name, status, expected and actual values.
fn summary_table(report: &SuiteReport) -> String {
    let name_width = report
        .outcomes
        .iter()
        .map(|outcome| outcome.name.len())
        .chain([NAME_HEADER.len()])
        .max()
        .unwrap_or_default();

    let header = format!(
        "{NAME_HEADER:<name_width$}  {:<6}  {:<12}  {:<12}",
        "Status", "Expected", "Actual"
    );
    let rule = "-".repeat(header.len());

    let mut table = vec![header.trim_end().to_string(), rule.clone()];
    for outcome in &report.outcomes {
        // Pad before coloring, escape codes would count towards the width.
        let status = if outcome.passed() {
            format!("{:<6}", "PASS").green()
        } else {
            format!("{:<6}", "FAIL").red()
        };
        let row = format!(
            "{:<name_width$}  {status}  {:<12}  {:<12}",
            outcome.name,
            table_value(outcome.expected),
            table_value(outcome.actual),
        );
        table.push(row.trim_end().to_string());
    }
    table.push(rule);

    table.join("\n")
}

const NAME_HEADER: &str = "Test Name";

fn table_value(value: Option<u32>) -> String {
    value.map_or_else(|| "N/A".to_string(), |value| value.to_string())
}

fn outcome_line(index: usize, total: usize, outcome: &TestOutcome, verbose: bool) -> String {
    let status = if outcome.passed() {
        "PASS".green()
    } else {
        "FAIL".red()
    };
    let mut line = format!("[{}/{total}] {status} {}", index + 1, outcome.name);

    if let Some(failure) = &outcome.failure {
        line.push_str(&format!(" ({failure})"));
    } else if verbose || !outcome.passed() {
        line.push_str(&format!(
            " expected {} got {} ({} instructions)",
            format_value(outcome.expected),
            format_value(outcome.actual),
            outcome.instructions
        ));
    }

    line
}

fn format_value(value: Option<u32>) -> String {
    match value {
        Some(value) => format!("{value} ({value:#010x})"),
        None => "-".to_string(),
    }
}
