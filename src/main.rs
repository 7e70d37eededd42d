use clap::Parser;

use portlens::cli::Args;
use portlens::config::{FileConfig, Settings};
use portlens::orchestrator;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(FileConfig::default_path);
    let file_config = FileConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("load config {}: {e}", config_path.display()))?;

    let settings = Settings::merge(&args, file_config);
    if settings.interface.is_empty() {
        anyhow::bail!("interface: required (pass --interface/-i or set it in the config file)");
    }

    orchestrator::run(settings).await
}
