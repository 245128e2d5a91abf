use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ppm_tracker::api::{self, parse_date, ServeOptions};
use ppm_tracker::config::{parse_grouping, parse_missing_id, parse_unknown_status, AppConfig};
use ppm_tracker::error::AppError;
use ppm_tracker::ppm::{PpmImporter, PpmReport, PpmSchedule};
use ppm_tracker::telemetry::{self, LogSink};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ppm-tracker",
    about = "Firefighting & alarm system PPM tracker: import exports and report progress",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Summarize a tracker export on the command line
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// CSV export with one row per location/equipment pair
    #[arg(long, conflicts_with = "json", required_unless_present = "json")]
    csv: Option<PathBuf>,
    /// JSON export: an array of row objects
    #[arg(long)]
    json: Option<PathBuf>,
    /// Report date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Period labels in schedule order, e.g. --periods Dec-24,Mar-25
    #[arg(long, value_delimiter = ',')]
    periods: Vec<String>,
    /// Findings grouping: dynamic or seeded
    #[arg(long)]
    grouping: Option<String>,
    /// Unrecognized status handling: pending, in_progress, completed or reject
    #[arg(long)]
    unknown_status: Option<String>,
    /// Missing id handling: positional or reject
    #[arg(long)]
    missing_id: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => {
            api::run(ServeOptions {
                host: args.host,
                port: args.port,
            })
            .await
        }
        Command::Report(args) => run_report(args),
    }
}

fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    if let Some(value) = args.grouping.as_deref() {
        config.ppm.grouping = parse_grouping(value)?;
    }
    if let Some(value) = args.unknown_status.as_deref() {
        config.ppm.unknown_status = parse_unknown_status(value)?;
    }
    if let Some(value) = args.missing_id.as_deref() {
        config.ppm.missing_id = parse_missing_id(value)?;
    }

    let schedule = if args.periods.is_empty() {
        PpmSchedule::standard()
    } else {
        PpmSchedule::from_labels(&args.periods)?
    };
    let importer = PpmImporter::new(schedule, config.ppm.transform_options());

    let records = match (args.csv, args.json) {
        (Some(path), _) => importer.csv_from_path(path)?,
        (None, Some(path)) => importer.json_from_path(path)?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "pass --csv or --json with a tracker export".to_string(),
            ))
        }
    };

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let report = PpmReport::build(&records, importer.schedule(), &config.ppm.grouping, as_of);

    match args.format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|err| AppError::Io(err.into()))?;
            println!("{rendered}");
        }
        OutputFormat::Text => render_report(&report),
    }

    Ok(())
}

fn render_report(report: &PpmReport) {
    println!("Firefighting & alarm PPM report (as of {})", report.as_of);
    println!(
        "Tracked locations: {} | equipment types: {}",
        report.record_count,
        report.equipment.len()
    );
    println!("Overall completion: {}%", report.overall_completion_rate);

    println!("\nPeriod progress");
    for entry in &report.period_progress {
        println!(
            "- {}: {}/{} completed ({}%), {} in progress, {} pending",
            entry.date,
            entry.completed,
            entry.total,
            entry.completion_rate,
            entry.in_progress,
            entry.pending
        );
    }

    if report.open_findings == 0 {
        println!("\nFindings: none");
        return;
    }

    println!("\nFindings ({} open)", report.open_findings);
    for bucket in report.findings.buckets() {
        let status = if bucket.status.is_empty() {
            "(no status)"
        } else {
            bucket.status.as_str()
        };
        println!("{} [{}]", status, bucket.entries.len());
        for entry in &bucket.entries {
            println!(
                "  - {} | {} | {}: {}",
                entry.date,
                entry.location,
                entry.equipment,
                entry.items().join("; ")
            );
        }
    }
}
