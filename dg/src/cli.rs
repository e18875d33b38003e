//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::governor::GovernorConfig;

/// dgov - request governor for the generative diary service
#[derive(Parser)]
#[command(
    name = "dgov",
    about = "Paced, retrying request queue for the generative diary service",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Push synthetic calls through a governor and watch the queue
    Simulate(SimulateArgs),

    /// Print the resolved configuration as YAML
    Config,
}

/// Synthetic load and governor overrides for `simulate`
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Number of calls to submit
    #[arg(short = 'n', long, default_value_t = 6)]
    pub tasks: usize,

    /// Simulated service latency per attempt
    #[arg(long, default_value_t = 300)]
    pub latency_ms: u64,

    /// Probability an attempt fails with a 503 overload
    #[arg(long, default_value_t = 0.3, value_parser = parse_rate)]
    pub transient_rate: f64,

    /// Probability an attempt fails with a permission error
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    pub fatal_rate: f64,

    /// Override max concurrent calls
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Override delay before a freed slot dispatches again
    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    /// Override attempts per call
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Override the first retry backoff
    #[arg(long)]
    pub base_delay_ms: Option<u64>,

    /// Fail a dispatched call after this long
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl SimulateArgs {
    /// Apply the overrides on top of the loaded governor config
    pub fn governor_config(&self, base: &GovernorConfig) -> GovernorConfig {
        GovernorConfig {
            max_concurrency: self.max_concurrency.unwrap_or(base.max_concurrency),
            request_delay_ms: self.request_delay_ms.unwrap_or(base.request_delay_ms),
            max_retry_attempts: self.max_attempts.unwrap_or(base.max_retry_attempts),
            retry_base_delay_ms: self.base_delay_ms.unwrap_or(base.retry_base_delay_ms),
            operation_timeout_ms: self.timeout_ms.or(base.operation_timeout_ms),
        }
    }
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("rate must be between 0.0 and 1.0, got {}", rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate_overrides() {
        let cli = Cli::try_parse_from([
            "dgov",
            "simulate",
            "-n",
            "10",
            "--max-concurrency",
            "3",
            "--transient-rate",
            "0.5",
        ])
        .unwrap();

        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.tasks, 10);
        assert_eq!(args.transient_rate, 0.5);

        let config = args.governor_config(&GovernorConfig::default());
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(config.max_retry_attempts, 5);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["dgov", "simulate", "--fatal-rate", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["dgov", "simulate", "--fatal-rate", "abc"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["dgov", "config", "--log-level", "debug", "-c", "dg.yml"]).unwrap();
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("dg.yml")));
    }
}
