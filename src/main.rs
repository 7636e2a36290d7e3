use anyhow::Result;
use cnpj_etl::{config::Config, transform};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) load configuration ───────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load_or_default(Path::new(&config_path))?;

    // ─── 3) run the transform over the discovered period ─────────────
    let outputs = transform::transform_data(&config, Vec::new())?;
    info!(files = outputs.len(), "transform run complete");

    Ok(())
}
