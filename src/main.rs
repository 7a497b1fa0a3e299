use anyhow::Context;
use clap::Parser;
use macdbot::{App, Settings, telemetry};

#[derive(Debug, Parser)]
#[command(version, about = "MACD signal scanner with chat alerts")]
struct Cli {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config))?;
    telemetry::init(&settings.telemetry).context("initialising telemetry")?;
    App::new(settings).run().await?;
    Ok(())
}
