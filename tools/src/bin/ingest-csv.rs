use anyhow::{anyhow, Context};
use clap::Parser;

use tourney_server::engine;
use tourney_server::ingest::{self, UploadError};

/// Runs a match sheet through the same validation and write path as the
/// upload endpoint.
#[derive(Parser, Debug)]
struct Config {
    #[arg(long)]
    db: String,
    #[arg(long)]
    file: std::path::PathBuf,
    /// Validate only.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("sqlx", log::LevelFilter::Error)
        .init();
    let cfg = Config::parse();
    let content = tokio::fs::read_to_string(&cfg.file)
        .await
        .context(format!("Failed to read {:?}", cfg.file))?;
    let db = sea_orm::Database::connect(&cfg.db)
        .await
        .context(format!("Failed to connect to {}", cfg.db))?;
    let players = engine::player_ids_by_name(&db).await?;
    let upload = match ingest::parse_and_validate(&content, &players) {
        Ok(upload) => upload,
        Err(UploadError::Parse(details)) => {
            println!("{}", serde_json::json!({ "error": "parse", "details": details }));
            return Err(anyhow!("Failed to parse {:?}", cfg.file));
        }
        Err(UploadError::Invalid(report)) => {
            println!(
                "{}",
                serde_json::json!({
                    "error": "validation",
                    "details": report.details,
                    "missing_players": report.missing_players,
                })
            );
            return Err(anyhow!("{:?} failed validation", cfg.file));
        }
    };
    if cfg.dry_run {
        println!(
            "Match {}: {} rows valid, final score {}-{}",
            upload.match_id,
            upload.rows.len(),
            upload.score_a,
            upload.score_b
        );
        return Ok(());
    }
    let summary = engine::ingest_match_stats(&db, upload).await?;
    println!(
        "Stored stats of {} players for match {}",
        summary.players_processed, summary.match_id
    );
    Ok(())
}
