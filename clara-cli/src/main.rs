use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod logs;

use cli::{Args, Mode};
use config::Config;

/// Initialize tracing on stderr, plus the orchestrator log file when requested
///
/// The returned guard flushes the file writer and must outlive `main`'s work.
fn initialize_tracing(config: &Config, log_to_file: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,clara_orchestrations=debug".into());

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    if !log_to_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return Ok(None);
    }

    let path = config.orchestrator_log_file();
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid log path {}", path.display()))?;
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid log path {}", path.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load .env and the CLARA_* environment
    let config = Config::load()?;

    let _guard = initialize_tracing(&config, args.log_to_file)?;

    match args.mode {
        Mode::Name { name, output } => commands::inspect::run_name(name, output),
        Mode::Decode { payload, output } => commands::inspect::run_decode(payload, output),
        Mode::LogFile { dpe } => commands::inspect::run_log_file(&config, dpe),
        Mode::Plan { request, output } => commands::plan::run(&config, request, output).await,
    }
}
