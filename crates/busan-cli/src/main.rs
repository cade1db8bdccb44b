mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use busan::daemon::DEFAULT_ENDPOINT;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "busan",
    about = "Build a Docker image when its VERSION changes and keep one container of it running"
)]
#[command(version)]
struct Cli {
    /// Directory containing the Dockerfile
    #[arg(value_name = "DOCKERFILE_DIRECTORY")]
    directory: PathBuf,

    /// Docker daemon address (unix:// or tcp://)
    #[arg(short = 'd', long, value_name = "ADDR", default_value = DEFAULT_ENDPOINT)]
    docker_host: String,

    /// Service name (defaults to the directory name)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Log-style output with timestamps
    #[arg(long)]
    log: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log);

    match commands::deploy(&cli.directory, &cli.docker_host, cli.name.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bollard=error,hyper=error"));

    if log {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .without_time()
            .with_target(false)
            .with_level(false)
            .compact()
            .init();
    }
}
