use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clashcheck::config::HarnessConfig;

#[derive(Parser)]
#[command(
    name = "clashcheck",
    about = "Contract test harness for the Clash Intelligence dashboard API",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $CLASHCHECK_CONFIG, then ./clashcheck.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenarios against a dashboard
    Run {
        /// Dashboard base URL
        #[arg(long, env = "CLASHCHECK_BASE_URL")]
        base_url: Option<String>,

        /// Clan tag used for roster and insights calls
        #[arg(long)]
        clan_tag: Option<String>,

        /// Report output path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Only run the named scenario (repeatable)
        #[arg(long = "only", value_name = "SCENARIO")]
        only: Vec<String>,

        /// Also print the full report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List scenarios in execution order
    Scenarios,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_cli().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n💥 Test execution failed: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::load_or_default(),
    };
    init_tracing(&config.logging.filter, cli.log_json || config.logging.json);

    match cli.command {
        Commands::Scenarios => {
            for s in clashcheck::scenario::all() {
                println!("{:<12} {}", s.name(), s.title());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            base_url,
            clan_tag,
            report,
            timeout_secs,
            only,
            json,
        } => {
            if let Some(url) = base_url {
                config.target.base_url = url;
            }
            if let Some(tag) = clan_tag {
                config.target.clan_tag = tag;
            }
            if let Some(path) = report {
                config.report.path = path;
            }
            if timeout_secs.is_some() {
                config.target.timeout_secs = timeout_secs;
            }
            tracing::info!(base_url = %config.target.base_url, ?only, "Running dashboard contract tests");

            let report = tokio::select! {
                res = clashcheck::run(&config, &only) => res?,
                _ = tokio::signal::ctrl_c() => {
                    println!("\n⚠️  Tests interrupted by user");
                    return Ok(ExitCode::from(1));
                }
            };

            println!("{}", report.render_summary());
            report.write(&config.report.path)?;
            println!("\n📄 Detailed results saved to {}", config.report.path.display());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }

            Ok(ExitCode::from(report.exit_code()))
        }
    }
}

fn init_tracing(default_filter: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
