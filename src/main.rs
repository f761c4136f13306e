use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use envdiff::alert::{
    apply_alert_rules, dispatch_alerts, evaluate_alerts, sinks_from_config, AlertEvent,
};
use envdiff::classifiers::ClassifierRegistry;
use envdiff::config::{Config, ConfigOverrides};
use envdiff::engine::DiffEngine;
use envdiff::model::codes::{is_registered, CODE_TABLE};
use envdiff::model::{ComparisonMeta, EnvDiff, SignalEnvelope};
use envdiff::output::csv::{findings_to_csv, history_to_csv};
use envdiff::output::json::{render_json, DiffReport};
use envdiff::output::table::{render_codes_table, render_findings_table, render_history_table};
use envdiff::output::text::render_header_diff;
use envdiff::server::run_server;
use envdiff::snapshot::{DiffRecord, DiffStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "envdiff",
    about = "Compare HTTP probe captures from two environments"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Comma-separated finding codes to skip.
    #[arg(short, long)]
    disable: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Diff {
        #[arg(long)]
        left: PathBuf,
        #[arg(long)]
        right: PathBuf,
        #[arg(long = "id", default_value = "adhoc")]
        comparison_id: String,
        #[arg(long)]
        persist: bool,
        #[arg(long)]
        headers: bool,
    },
    History {
        #[arg(long)]
        comparison: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Codes,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let (host, port) = match &cli.command {
        Commands::Serve { host, port } => (host.clone(), *port),
        _ => (None, None),
    };
    config.apply_overrides(ConfigOverrides {
        disabled_codes: cli.disable.as_deref().map(parse_code_list).transpose()?,
        host,
        port,
        ..ConfigOverrides::default()
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)?;
        }
        Commands::Serve { .. } => {
            let bind = config.bind_addr();
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await?;
        }
        Commands::Codes => match cli.output {
            OutputFormat::Table => println!("{}", render_codes_table(&config.diff_settings())),
            OutputFormat::Json => println!("{}", render_json(CODE_TABLE)?),
            OutputFormat::Csv => {
                warn!("CSV output for codes not implemented, using JSON");
                println!("{}", render_json(CODE_TABLE)?);
            }
        },
        Commands::History { comparison, limit } => {
            let store = DiffStore::open(&config.resolved_db_path())?;
            let records = store.list_recent(comparison.as_deref(), (*limit).max(1))?;
            print_history(&records, cli.output)?;
        }
        Commands::Diff {
            left,
            right,
            comparison_id,
            persist,
            headers,
        } => {
            let left_envelope = read_envelope(left)?;
            let right_envelope = read_envelope(right)?;
            let engine =
                DiffEngine::new(ClassifierRegistry::with_defaults(), config.diff_settings());
            let diff = engine.build(
                &left_envelope,
                &right_envelope,
                &ComparisonMeta::new(comparison_id.as_str()),
            );

            let previous = if *persist {
                let store = DiffStore::open(&config.resolved_db_path())?;
                let previous = store.latest_for_comparison(&diff.comparison_id)?;
                store.insert_diff(&diff)?;
                previous
            } else {
                None
            };
            let alerts = apply_alert_rules(
                evaluate_alerts(previous.as_ref(), &diff),
                &config.alerts.rules,
            );

            print_diff(&diff, &alerts, cli.output)?;
            if *headers {
                match cli.output {
                    OutputFormat::Table => {
                        println!("{}", render_header_diff(&left_envelope, &right_envelope));
                    }
                    _ => warn!("--headers is only rendered with table output"),
                }
            }
            if *persist {
                let mut alert_config = config.alerts.clone();
                // Keep stdout machine-readable.
                if !matches!(cli.output, OutputFormat::Table) {
                    alert_config.enable_stdout = false;
                }
                let sinks = sinks_from_config(&alert_config)?;
                dispatch_alerts(&sinks, &alerts).await;
            }
        }
    }
    Ok(())
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &Path,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn parse_code_list(raw: &str) -> Result<Vec<String>> {
    let mut codes = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let code = code.to_ascii_uppercase();
        if !is_registered(&code) {
            bail!("unknown finding code: {code}");
        }
        codes.push(code);
    }
    Ok(codes)
}

fn read_envelope(path: &Path) -> Result<SignalEnvelope> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading envelope: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed parsing envelope JSON: {}", path.display()))
}

fn print_diff(diff: &EnvDiff, alerts: &[AlertEvent], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_findings_table(diff)),
        OutputFormat::Json => {
            let report = DiffReport::new(diff.clone(), alerts.to_vec());
            println!("{}", render_json(&report)?);
        }
        OutputFormat::Csv => print!("{}", findings_to_csv(diff)?),
    }
    Ok(())
}

fn print_history(records: &[DiffRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_history_table(records)),
        OutputFormat::Json => println!("{}", render_json(records)?),
        OutputFormat::Csv => print!("{}", history_to_csv(records)?),
    }
    Ok(())
}
