//! # easy-forecast
//!
//! Command-line front-end: a one-shot `run` and a line-oriented `session`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use easy_forecast::config::{Settings, API_KEY_ENV};
use easy_forecast::gateway::TimeGptClient;
use easy_forecast::io::load_dataset;
use easy_forecast::pipeline::{run_forecast, ForecastRun};
use easy_forecast::presentation::{render_dataset, CsvExport, Presenter, SvgChart, TablePresenter};
use easy_forecast::session::{Command, Outcome, Session, TimeGptFactory};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "easy-forecast")]
#[command(about = "Regularize a spreadsheet and forecast its holdout with TimeGPT", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// TimeGPT API key
    #[arg(long, env = "NIXTLA_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file, forecast its trailing horizon and compare
    Run {
        /// Input file (CSV or XLSX)
        input: PathBuf,

        /// Time column
        #[arg(short, long)]
        time: String,

        /// Column to forecast
        #[arg(long)]
        target: String,

        /// Columns to delete before regularizing
        #[arg(short, long)]
        delete: Vec<String>,

        /// Renames as OLD=NEW, applied after deletes
        #[arg(short, long, value_parser = parse_rename)]
        rename: Vec<(String, String)>,

        /// Write the comparison as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the comparison chart as SVG
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Holdout length and forecast horizon
        #[arg(long)]
        horizon: Option<usize>,

        /// Confidence level in percent
        #[arg(long)]
        level: Option<u8>,

        /// TimeGPT model
        #[arg(short, long)]
        model: Option<String>,

        /// Grid step in minutes
        #[arg(long)]
        step_minutes: Option<i64>,
    },

    /// Interactive session reading commands from stdin
    Session,
}

fn parse_rename(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => {
            Ok((from.to_string(), to.to_string()))
        }
        _ => Err(format!("expected OLD=NEW, got {:?}", arg)),
    }
}

fn settings_for(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.apply_env();
    if let Some(key) = &cli.api_key {
        settings.api_key = Some(key.clone());
    }
    Ok(settings)
}

fn print_comparison(run: &ForecastRun, rows: usize) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    println!(
        "trained on {} rows, forecast {} steps",
        run.train_rows,
        run.forecast.horizon()
    );
    TablePresenter::new(stdout.lock(), rows).render(&run.comparison)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "easy_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = settings_for(&cli)?;

    match cli.command {
        Commands::Run {
            input,
            time,
            target,
            delete,
            rename,
            output,
            chart,
            horizon,
            level,
            model,
            step_minutes,
        } => {
            let mut settings = settings;
            if let Some(h) = horizon {
                settings.horizon = h;
            }
            if let Some(l) = level {
                settings.level = l;
            }
            if let Some(m) = model {
                settings.model = m;
            }
            if let Some(s) = step_minutes {
                settings.step_minutes = s;
            }
            let options = settings.forecast_options()?;

            let Some(credential) = settings.credential() else {
                bail!("no API key: pass --api-key or set {}", API_KEY_ENV);
            };

            let mut dataset = load_dataset(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            for name in &delete {
                dataset.delete_column(name)?;
            }
            for (from, to) in &rename {
                dataset.rename_column(from, to)?;
            }

            let client =
                TimeGptClient::with_config(credential, &settings.base_url, settings.timeout_secs)?;
            let run = run_forecast(&dataset, &time, &target, &options, &client)
                .await
                .context("forecast failed")?;

            print_comparison(&run, settings.preview_rows)?;
            if let Some(path) = output {
                CsvExport::new(path).render(&run.comparison)?;
            }
            if let Some(path) = chart {
                SvgChart::new(path).render(&run.comparison)?;
            }
        }
        Commands::Session => run_session(settings).await?,
    }
    Ok(())
}

async fn run_session(settings: Settings) -> anyhow::Result<()> {
    let preview_rows = settings.preview_rows;
    let mut session = Session::new(settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("session started; commands: load, delete, rename, key, show, columns, export, train, report, close");

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("error: {}", err);
                continue;
            }
        };

        match session.execute(command, &TimeGptFactory).await {
            Ok(Outcome::Loaded { rows, columns }) => {
                println!("loaded {} rows: {}", rows, columns.join(", "));
            }
            Ok(Outcome::Edited { columns }) | Ok(Outcome::Columns(columns)) => {
                println!("{}", columns.join(", "));
            }
            Ok(Outcome::CredentialSet) => println!("API key set"),
            Ok(Outcome::Preview(head)) => {
                render_dataset(&mut std::io::stdout().lock(), &head, head.row_count())?;
            }
            Ok(Outcome::Exported { path, rows }) => {
                println!("wrote {} rows to {}", rows, path.display());
            }
            Ok(Outcome::Forecast(run)) => print_comparison(&run, preview_rows)?,
            Ok(Outcome::Reported { path, points }) => {
                println!("wrote {} forecast points to {}", points, path.display());
            }
            Ok(Outcome::Closed) => break,
            Err(err) => {
                warn!(error = %err, "command failed");
                eprintln!("error: {}", err);
            }
        }
    }
    Ok(())
}
