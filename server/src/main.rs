use anyhow::{anyhow, Context};

use tourney_server::config::{self, Config, Insecure};
use tourney_server::server;

async fn load_config(path: &str, insecure: Insecure) -> anyhow::Result<Config> {
    let text = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read config file {path}"))?;
    let config: Config = toml::from_str(&text).context("Failed to parse config")?;
    config::validate(&config, insecure).map_err(|e| anyhow!("Config validation failed: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("sqlx", log::LevelFilter::Error)
        .init();
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        return Err(anyhow!("config file must be specified as the first arg"));
    };
    let mut insecure = Insecure::Deny;
    for f in args[2..].iter() {
        match f.as_str() {
            "--insecure" => insecure = Insecure::Allow,
            _ => return Err(anyhow!("Unrecognized flag: {f}")),
        }
    }
    if matches!(insecure, Insecure::Allow) {
        log::warn!("Running in insecure mode: empty admin passwords are accepted");
    }
    let config = load_config(path, insecure).await?;
    server::run(config).await
}
