use actix_multipart::form::MultipartFormConfig;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sea_orm::Database;

use std::sync::Arc;

use crate::cache::{DataCache, SystemClock};
use crate::config::*;
use crate::handlers::*;
use crate::http_types::*;
use crate::server_state::*;

pub struct Handle {
    pub server: actix_web::dev::Server,
    pub addrs: Vec<std::net::SocketAddr>,
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let handle = create(config).await?;
    handle.server.await?;
    Ok(())
}

const PARTIALS: [&str; 3] = ["header", "footer", "match_lines"];

const TEMPLATES: [&str; 8] = [
    "index",
    "teams",
    "team",
    "players",
    "player",
    "matches",
    "match",
    "admin",
];

pub async fn create(config: Config) -> anyhow::Result<Handle> {
    let mut db_options = sea_orm::ConnectOptions::new(&config.db_path);
    db_options.max_connections(32);
    let db = Database::connect(db_options)
        .await
        .context(format!("Failed to connect to {}", config.db_path))?;
    let mut tmpl = handlebars::Handlebars::new();
    tmpl.set_strict_mode(true);
    tmpl.set_dev_mode(true);
    let tf = |t: &str| -> std::path::PathBuf {
        std::path::Path::new(&config.server_config.fs_root_dir)
            .join("templates")
            .join(format!("{t}.hbs"))
    };
    for name in PARTIALS {
        tmpl.register_template_file(name, tf(&format!("partials/{name}")))
            .context(format!("Failed to register {name} partial"))?;
    }
    for name in TEMPLATES {
        tmpl.register_template_file(name, tf(name))
            .context(format!("Failed to register {name} template"))?;
    }
    let port = config.server_config.port;
    log::info!(
        "Caching reads for {:?}, listening on port {port}",
        config.cache.ttl
    );

    let app_state = ServerState {
        tmpl,
        db,
        admin: config.admin,
        cache: Arc::new(DataCache::new(config.cache.ttl, Arc::new(SystemClock))),
        config: config.server_config,
    };

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppHttpError::BadClientData(format!("Invalid JSON body: {err}")).into()
            }))
            .app_data(MultipartFormConfig::default().error_handler(|err, _req| {
                AppHttpError::BadClientData(format!("Invalid multipart body: {err}")).into()
            }))
            .service(get_index::get_index)
            .service(get_teams::get_teams)
            .service(get_teams::get_team)
            .service(get_players::get_players)
            .service(get_players::get_player)
            .service(get_matches::get_matches)
            .service(get_matches::get_match)
            .service(get_admin::get_admin)
            .service(post_process_stats_csv::post_process_stats_csv)
            .service(post_generate_tournament::post_generate_tournament)
            .service(post_reset_all_stats::post_reset_all_stats)
            .service(post_roster::post_create_team)
            .service(post_roster::post_create_player_and_assign)
            .service(post_roster::post_update_player_team)
            .service(post_roster::post_update_team_name)
            .service(get_admin_data::get_admin_teams)
            .service(get_admin_data::get_admin_players)
            .service(get_admin_data::get_unassigned_players)
            .service(get_admin_data::get_check_matches_exist)
            .service(post_refresh_data::post_refresh_data)
            .service(actix_files::Files::new(
                "/static",
                std::path::Path::new(&app_state.config.fs_root_dir).join("static"),
            ))
    })
    .workers(8)
    .bind(("::", port))?;
    let addrs = server.addrs();
    let server = server.run(); // Does not actually run the server but creates a future.
    Ok(Handle { server, addrs })
}
