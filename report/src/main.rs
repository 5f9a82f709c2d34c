//! Sales Report CLI - filter and aggregate sales transaction datasets
//!
//! # Commands
//!
//! ```bash
//! sales-report report                      # Full run using ./filter.txt, ./kolom.txt, ...
//! sales-report report -c config/ --export laporan
//! sales-report columns                     # List the dataset's columns
//! sales-report check-update                # Compare with the published version
//! ```

use clap::{Args, Parser, Subcommand};
use sales_report::config::{resolve_dataset, ReportConfig};
use sales_report::logs::{log_error, log_info, log_success, log_warning};
use sales_report::prompt::DEFAULT_PROMPT_TIMEOUT;
use sales_report::view::DEFAULT_ROW_LIMIT;
use sales_report::{
    confirm_export, export_json, export_path, export_xlsx, load_dataset, print_report, report_update_status,
    run_report, AggregateSpec, HttpUpdateChecker, ReportOptions, ReportStatus, StdinPrompter, ViewOptions,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sales-report", version)]
#[command(about = "Filter and aggregate sales transaction datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, group and print the dataset, then offer an xlsx export
    Report(ReportArgs),

    /// List the columns of the dataset
    Columns {
        /// Directory holding lokasi_dbase.txt
        #[arg(short, long, default_value = ".")]
        config_dir: PathBuf,

        /// Dataset file (overrides lokasi_dbase.txt)
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Check whether a newer version is published
    CheckUpdate,
}

#[derive(Args)]
struct ReportArgs {
    /// Directory holding filter.txt, kolom.txt, group.txt and lokasi_dbase.txt
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Dataset file (overrides lokasi_dbase.txt)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Rows shown in the terminal
    #[arg(short, long, default_value_t = DEFAULT_ROW_LIMIT)]
    limit: usize,

    /// Export to this xlsx file without asking
    #[arg(short, long, conflicts_with = "no_export")]
    export: Option<String>,

    /// Never export
    #[arg(long)]
    no_export: bool,

    /// Seconds to wait for each export prompt answer
    #[arg(long, default_value_t = DEFAULT_PROMPT_TIMEOUT.as_secs())]
    prompt_timeout: u64,

    /// Re-apply the QTY threshold to each group after aggregation
    #[arg(long)]
    recheck_threshold: bool,

    /// Skip the version check
    #[arg(long)]
    skip_update_check: bool,

    /// Also write the result table as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report(args) => cmd_report(args).await,
        Commands::Columns { config_dir, dataset } => cmd_columns(config_dir, dataset),
        Commands::CheckUpdate => cmd_check_update().await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.skip_update_check {
        report_update_status(&HttpUpdateChecker::from_env()).await;
    }

    let options = ReportOptions {
        recheck_threshold: args.recheck_threshold,
        ..ReportOptions::default()
    };
    let config = ReportConfig::load(&args.config_dir, &options.schema, args.dataset)?;

    log_info(format!("📄 Loading: {}", config.dataset.display()));
    let records = load_dataset(&config.dataset)?;
    log_success(format!("Loaded {} rows, {} columns", records.len(), records.columns().len()));

    let spec = AggregateSpec::new(config.group_columns).with_display(config.display_columns);
    let view = ViewOptions {
        limit: args.limit,
        format: spec.format,
    };
    let report = match run_report(&records, &config.filters, spec, &options)? {
        ReportStatus::Ready(report) => report,
        ReportStatus::Empty(stage) => {
            log_error(format!("No data left after {}", stage));
            return Ok(());
        }
    };
    log_info(format!("Grouping columns: {}", report.group_columns.join(", ")));

    print_report(&report.table, &view);

    if let Some(json_path) = &args.json {
        export_json(&report, json_path)?;
        log_success(format!("JSON saved to: {}", json_path.display()));
    }

    let target = if args.no_export {
        None
    } else if let Some(name) = &args.export {
        Some(export_path(name))
    } else {
        let timeout = Duration::from_secs(args.prompt_timeout);
        confirm_export(&mut StdinPrompter, timeout).await
    };

    if let Some(path) = target {
        export_xlsx(&report.table, &path)?;
        log_success(format!("Data saved to: {}", path.display()));
    }

    Ok(())
}

fn cmd_columns(config_dir: PathBuf, dataset: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = resolve_dataset(&config_dir, dataset)?;
    log_info(format!("📄 Loading: {}", dataset.display()));

    let records = load_dataset(&dataset)?;
    println!("{} rows", records.len());
    for name in records.column_names() {
        println!("  {}", name);
    }
    Ok(())
}

async fn cmd_check_update() -> Result<(), Box<dyn std::error::Error>> {
    let checker = HttpUpdateChecker::from_env();
    log_info(format!("Version file: {}", checker.url()));

    if report_update_status(&checker).await.is_none() {
        log_warning("Could not determine the published version");
    }
    Ok(())
}
