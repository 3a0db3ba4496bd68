use anyhow::Context;
use clap::Parser;
use sea_orm::TransactionTrait;

use tourney_server::engine;

/// Re-derives every player and team lifetime row from match history.
#[derive(Parser, Debug)]
struct Config {
    #[arg(long)]
    db: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("sqlx", log::LevelFilter::Error)
        .init();
    let cfg = Config::parse();
    let db = sea_orm::Database::connect(&cfg.db)
        .await
        .context(format!("Failed to connect to {}", cfg.db))?;
    let (players, teams) = db
        .transaction(|txn| Box::pin(async move { engine::recalculate_all(txn).await }))
        .await
        .context("Recalculation failed")?;
    println!("Recalculated stats of {players} players and {teams} teams");
    Ok(())
}
