//! dgov - request governor for the generative diary service
//!
//! CLI entry point for inspecting configuration and exercising the governor.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use diary_governor::cli::{Cli, Command, SimulateArgs};
use diary_governor::config::Config;
use diary_governor::governor::{Governor, logging_observer};
use diary_governor::remote::RemoteError;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("diary-governor")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_path = log_dir.join("diary-governor.log");
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(log_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    let log_path =
        setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Simulate(args) => cmd_simulate(&config, &args, &log_path).await,
        Command::Config => cmd_config(&config),
    }
}

/// Print the resolved configuration
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

/// Run synthetic calls through a governor, printing every queue transition
async fn cmd_simulate(config: &Config, args: &SimulateArgs, log_path: &std::path::Path) -> Result<()> {
    let governor_config = args.governor_config(&config.governor);
    info!(?governor_config, ?args, "cmd_simulate: starting");

    println!(
        "Simulating {} calls (concurrency {}, spacing {}ms, {} attempts, backoff base {}ms)",
        args.tasks,
        governor_config.max_concurrency,
        governor_config.request_delay_ms,
        governor_config.max_retry_attempts,
        governor_config.retry_base_delay_ms,
    );

    let log_observer = logging_observer();
    let governor = Governor::with_observer(
        &governor_config,
        Arc::new(move |active, waiting| {
            log_observer(active, waiting);
            println!("  {} active={} waiting={}", "queue".dimmed(), active, waiting);
        }),
    );

    let latency = Duration::from_millis(args.latency_ms);
    let (transient_rate, fatal_rate) = (args.transient_rate, args.fatal_rate);

    let tickets: Vec<_> = (1..=args.tasks)
        .map(|n| {
            governor.submit(move || async move {
                tokio::time::sleep(latency).await;
                let roll: f64 = rand::random();
                if roll < fatal_rate {
                    Err(RemoteError::service("permission denied"))
                } else if roll < fatal_rate + transient_rate {
                    Err(RemoteError::Api {
                        status: 503,
                        message: "The model is overloaded. Please try again later.".to_string(),
                    })
                } else {
                    Ok(n)
                }
            })
        })
        .collect();

    let results = futures::future::join_all(tickets).await;

    println!();
    for (n, result) in (1..).zip(&results) {
        match result {
            Ok(_) => println!("{} call {} succeeded", "✓".green(), n),
            Err(e) if e.is_retryable() => println!("{} call {} gave up: {}", "✗".yellow(), n, e),
            Err(e) => println!("{} call {} failed: {}", "✗".red(), n, e),
        }
    }

    let stats = governor.queue_state().stats;
    println!(
        "\n{} succeeded, {} failed, peak active {}, peak waiting {}",
        stats.total_succeeded, stats.total_failed, stats.peak_active, stats.peak_waiting
    );
    println!("Log: {}", log_path.display());
    Ok(())
}
