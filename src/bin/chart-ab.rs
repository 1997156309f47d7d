//! chart-ab - Chart readability A/B testing CLI
//!
//! ## Commands
//!
//! - `run`: interactive trial loop in the terminal
//! - `summary`: per-condition statistics and Welch's t-test
//! - `export`: interaction log as CSV
//! - `debug`: interaction log dump with total count

use anyhow::{Context, Result};
use chart_ab::config::{AppConfig, DEFAULT_CONFIG_FILE};
use chart_ab::experiment::InteractionLog;
use chart_ab::export::{export_csv, write_csv};
use chart_ab::session::{Answer, DebugInfo, ExperimentSession};
use chart_ab::stats::{compute_significance, compute_summary};
use chart_ab::store::CsvDirStore;
use chart_ab::telemetry::{init_tracing, level_for};
use chart_ab::Error;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(name = "chart-ab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chart readability A/B testing", long_about = None)]
struct Cli {
    /// Configuration file (created with commented defaults if missing)
    #[arg(short, long, global = true, env = "CHART_AB_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run trials interactively
    Run,

    /// Print summary statistics and the significance test
    Summary,

    /// Export the interaction log as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Dump the interaction log
    Debug,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, level_for(cli.verbose));

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let store = Arc::new(CsvDirStore::new(&config.store.dir));

    match cli.command {
        Commands::Run => cmd_run(store, &config).await,
        Commands::Summary => cmd_summary(store, &config).await,
        Commands::Export { out } => cmd_export(store, &config, out).await,
        Commands::Debug => cmd_debug(store, &config).await,
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    println!("{text}");
    let line = lines.next_line().await.context("Failed to read stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

async fn cmd_run(store: Arc<CsvDirStore>, config: &AppConfig) -> Result<()> {
    let mut session =
        ExperimentSession::new(store, config).with_chart_output(&config.chart.output);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", session.title());
    println!("Question: {}", session.question());
    println!("Participant: {}", session.participant_id());

    loop {
        match prompt(&mut lines, "\nPress Enter to show a chart (q to quit)").await? {
            None => break,
            Some(input) if input == "q" => break,
            Some(_) => {}
        }

        let shown = match session.show_chart().await {
            Ok(shown) => shown,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        for warning in &shown.warnings {
            eprintln!("warning: {warning}");
        }
        println!(
            "{} written to {}",
            shown.chart.title(),
            config.chart.output.display()
        );

        if prompt(&mut lines, "Press Enter once you have answered the question")
            .await?
            .is_none()
        {
            break;
        }
        record_answer(&mut session, &mut lines).await?;
    }
    Ok(())
}

async fn record_answer(
    session: &mut ExperimentSession<CsvDirStore>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    loop {
        match session.answered().await {
            Ok(answer @ Answer::Recorded(_)) => {
                if let Some(message) = answer.message() {
                    println!("{message}");
                }
                println!("Interaction logged successfully!");
                return Ok(());
            }
            Ok(Answer::Ignored(_)) => return Ok(()),
            Err(err @ Error::LogWriteFailure(_)) => {
                eprintln!("{err}");
                match prompt(lines, "r to retry, s to skip this trial").await? {
                    Some(input) if input == "r" => {}
                    _ => {
                        session.skip_logging();
                        return Ok(());
                    }
                }
            }
            Err(err) => return Err(err).context("Failed to record answer"),
        }
    }
}

async fn cmd_summary(store: Arc<CsvDirStore>, config: &AppConfig) -> Result<()> {
    let log = InteractionLog::new(store, config.store.interactions_table.clone());
    let snapshot = log.read().await;
    for message in snapshot.messages() {
        eprintln!("warning: {message}");
    }

    let summary = compute_summary(&snapshot.records);
    if summary.is_empty() {
        println!("No interactions recorded yet.");
    } else {
        println!(
            "{:<8} {:>6} {:>10} {:>10} {:>10} {:>10}",
            "chart", "count", "mean", "min", "max", "std"
        );
        for (condition, stats) in summary.iter() {
            let std_dev = stats
                .std_dev
                .map_or_else(|| "-".to_string(), |sd| format!("{sd:.3}"));
            println!(
                "{:<8} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10}",
                condition.as_str(),
                stats.count,
                stats.mean,
                stats.min,
                stats.max,
                std_dev
            );
        }
    }

    println!();
    println!(
        "{}",
        compute_significance(&snapshot.records, &config.analysis.policy())
    );
    Ok(())
}

async fn cmd_export(
    store: Arc<CsvDirStore>,
    config: &AppConfig,
    out: Option<PathBuf>,
) -> Result<()> {
    let log = InteractionLog::new(store, config.store.interactions_table.clone());
    let snapshot = log
        .read_strict()
        .await
        .context("Failed to read interaction log")?;
    for message in snapshot.messages() {
        eprintln!("warning: {message}");
    }

    match out {
        Some(path) => {
            write_csv(&path, &snapshot.records)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} interactions to {}", snapshot.len(), path.display());
        }
        None => print!("{}", export_csv(&snapshot.records)),
    }
    Ok(())
}

async fn cmd_debug(store: Arc<CsvDirStore>, config: &AppConfig) -> Result<()> {
    let log = InteractionLog::new(store, config.store.interactions_table.clone());
    let snapshot = log.read().await;
    let info = DebugInfo {
        total: snapshot.len(),
        log: snapshot,
    };

    println!("Current Interactions Data:");
    print!("{}", export_csv(&info.log.records));
    for line in info.lines() {
        println!("{line}");
    }
    Ok(())
}
