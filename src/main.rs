use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use gridslice::cli::{Cli, Commands, ReportFormat, layered_config};
use gridslice::error::{ErrorReport, ProcessError};
use gridslice::extract::NetCdfReader;
use gridslice::info::{get_input_info, input_info_csv, print_input_info_human, print_input_info_json, print_input_info_yaml};
use gridslice::input::JobConfig;
use gridslice::log::{config_echo, show_farewell, show_greeting};
use gridslice::selection::DateRange;
use gridslice::run_job;
use log::{debug, info};
use std::fs::File;
use std::io;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("{}", error_line(&e));
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// One JSON line: the structured report of a `ProcessError`, or a generic one.
fn error_line(error: &anyhow::Error) -> String {
    let report = match error.downcast_ref::<ProcessError>() {
        Some(process_error) => process_error.report(),
        None => ErrorReport {
            kind: "Error",
            subject: None,
            message: format!("{error:#}"),
        },
    };
    serde_json::to_string(&report).unwrap_or_else(|_| format!("{error:#}"))
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Subset { .. } | Commands::Regrid { .. } => run_operation(&cli).await,
        Commands::Info {
            in_path,
            start_date,
            end_date,
            detailed,
            format,
        } => {
            let dates = match (start_date, end_date) {
                (Some(start), Some(end)) => Some(DateRange::new(*start, *end)?),
                _ => None,
            };
            let dims = match &cli.config {
                Some(path) => JobConfig::from_file(path)?.dimensions.unwrap_or_default(),
                None => Default::default(),
            };
            let reader = NetCdfReader::new(dims);
            let info = get_input_info(&reader, in_path, dates.as_ref(), *detailed)?;
            match format {
                ReportFormat::Human => print_input_info_human(&info),
                ReportFormat::Json => print_input_info_json(&info)?,
                ReportFormat::Yaml => print_input_info_yaml(&info)?,
                ReportFormat::Csv => print!("{}", input_info_csv(&info)),
            }
            Ok(())
        }
        Commands::Validate {
            config_file,
            operation,
        } => {
            let path = config_file
                .as_ref()
                .or(cli.config.as_ref())
                .context("No configuration file given; pass one or use --config")?;
            let config = JobConfig::from_file(path)?;
            let operation = operation.or(config.operation).unwrap_or_default();
            let job = config.into_job(operation)?;
            config_echo(&job);
            info!("{} is a valid {} configuration", path.display(), operation);
            Ok(())
        }
        Commands::Completions { shell, output } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            match output {
                Some(path) => {
                    let mut file = File::create(path)
                        .with_context(|| format!("Failed to create completions file {}", path.display()))?;
                    generate(*shell, &mut cmd, name, &mut file);
                }
                None => generate(*shell, &mut cmd, name, &mut io::stdout()),
            }
            Ok(())
        }
    }
}

async fn run_operation(cli: &Cli) -> Result<()> {
    let Some((operation, overrides)) = cli.command.job_overrides() else {
        return Ok(());
    };
    let start_time = Instant::now();
    let config_path = cli.config.as_ref().map(|p| p.display().to_string());
    show_greeting(operation, config_path.as_deref());

    let job = layered_config(cli.config.as_deref(), overrides)?.into_job(operation)?;
    config_echo(&job);

    if cli.command.is_dry_run() {
        info!("Dry run: configuration is valid, nothing processed");
        return Ok(());
    }

    debug!("Starting {} of {}", operation, job.in_path);
    let summary = run_job(&job, !cli.quiet).await?;
    show_farewell(&summary, start_time.elapsed());
    Ok(())
}
