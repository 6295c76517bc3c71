use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sleuth_common::observability::{LogConfig, init_logging};
use sleuth_config::{SleuthConfig, SleuthConfigLoader};
use sleuth_tools::CallContext;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wiring::build_registry;
mod wiring;

/// Invoke Sleuth tools from the command line.
#[derive(Debug, Parser)]
#[command(name = "sleuth", version)]
struct Cli {
    /// YAML config file; `SLEUTH__*` environment variables override it.
    #[arg(short, long, env = "SLEUTH_CONFIG", default_value = "sleuth.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the enabled tools.
    List,
    /// Call a tool by id and print its output.
    Call {
        /// Tool id from the config.
        tool: String,
        /// Tool input; `-` reads it from stdin.
        input: String,
        /// Give up after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: SleuthConfig = SleuthConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let log_path = init_logging(LogConfig {
        app_name: "sleuth".to_string(),
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(config = %cli.config.display(), log = %log_path.display(), "sleuth starting");

    let registry = build_registry(&cfg).await?;

    match cli.command {
        Command::List => {
            for tool in registry.list() {
                println!("{}\t{}\n    {}", tool.id, tool.name, tool.description);
            }
        }
        Command::Call {
            tool,
            input,
            timeout_secs,
        } => {
            let input = if input == "-" {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("reading tool input from stdin")?;
                buf
            } else {
                input
            };

            let cancel = CancellationToken::new();
            let mut ctx = CallContext::with_token(cancel.clone());
            if let Some(secs) = timeout_secs {
                ctx = ctx.with_timeout(Duration::from_secs(secs));
            }
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling call");
                    cancel.cancel();
                }
            });

            let output = registry.call(&tool, &ctx, &input).await?;
            println!("{output}");
        }
    }

    Ok(())
}
