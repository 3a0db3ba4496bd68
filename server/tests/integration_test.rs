#[cfg(feature = "integration_tests")]
mod tests {
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};

    use tourney_db as db;

    const UPLOAD_PASSWORD: &str = "upload-secret";
    const API_PASSWORD: &str = "api-secret";
    const RESET_PASSWORD: &str = "reset-secret";

    fn config(db_path: &str) -> tourney_server::config::Config {
        tourney_server::config::Config {
            server_config: tourney_server::config::ServerConfig {
                port: 0,
                site_base_url_path: "".to_owned(),
                fs_root_dir: "".into(),
            },
            admin: tourney_server::config::AdminConfig {
                upload_password: UPLOAD_PASSWORD.to_owned(),
                api_password: API_PASSWORD.to_owned(),
                reset_password: RESET_PASSWORD.to_owned(),
            },
            cache: Default::default(),
            db_path: db_path.to_owned(),
        }
    }

    fn sheet(rows: &[String]) -> String {
        let mut s = "match_id,player_name,final_score_a,final_score_b,flag_captures,flag_returns,bc_kills,dbs_kills,dfa_kills,overall_kills,overall_deaths,flaghold_time,impact\n".to_owned();
        for r in rows {
            s.push_str(r);
            s.push('\n');
        }
        s
    }

    async fn upload(
        client: &reqwest::Client,
        base: &str,
        csv: String,
        mime: &str,
        password: &str,
    ) -> (reqwest::StatusCode, Value) {
        let part = reqwest::multipart::Part::text(csv)
            .file_name("sheet.csv")
            .mime_str(mime)
            .expect("Invalid mime type");
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("password", password.to_owned());
        let resp = client
            .post(format!("{base}/api/process-player-stats-csv"))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed");
        let status = resp.status();
        (status, resp.json().await.expect("Upload response is not JSON"))
    }

    async fn post_json(
        client: &reqwest::Client,
        url: String,
        body: Value,
    ) -> (reqwest::StatusCode, Value) {
        let resp = client
            .post(url)
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        let status = resp.status();
        (status, resp.json().await.expect("Response is not JSON"))
    }

    async fn team_roster(db: &sea_orm::DatabaseConnection, team_id: i64) -> Vec<String> {
        db::players::Entity::find()
            .filter(db::players::Column::TeamId.eq(team_id))
            .all(db)
            .await
            .expect("Failed to fetch roster")
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[tokio::test]
    async fn server_smoke() {
        env_logger::Builder::from_env(env_logger::Env::default())
            .is_test(true)
            .filter_module("sqlx", log::LevelFilter::Error)
            .init();
        let dir = tempdir::TempDir::new("tourney-test").expect("Failed to create test dir");
        let db_url = format!(
            "sqlite://{}/db.sqlite?mode=rwc",
            dir.path().to_str().unwrap()
        );
        let db = sea_orm::Database::connect(&db_url)
            .await
            .expect("Failed to connect to the database");
        unsafe {
            std::env::set_var("TOURNEY_POPULATE_DATABASE", "true");
        }
        migration::Migrator::up(&db, None)
            .await
            .expect("Applying initial DB migrations failed");

        let handle = tourney_server::server::create(config(&db_url))
            .await
            .expect("Failed to create the server");
        let server_handle = handle.server.handle();
        let port = handle.addrs[0].port();
        let server_join = tokio::task::spawn(async move {
            let _ = handle.server.await.inspect_err(|e| {
                log::error!("Running the server failed: {e:?}");
            });
        });
        let base = format!("http://localhost:{port}");
        let client = reqwest::Client::new();

        let exist: Value = client
            .get(format!("{base}/api/admin/check-matches-exist"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(exist, json!({ "matchesExist": false }));

        // Fixtures: 4 teams play each other twice, plus three elimination slots.
        let (status, body) = post_json(
            &client,
            format!("{base}/api/admin/generate-tournament"),
            json!({}),
        )
        .await;
        assert!(status.is_success(), "{body}");
        assert_eq!(body["fixtures"].as_array().map(|f| f.len()), Some(15));
        let (status, body) = post_json(
            &client,
            format!("{base}/api/admin/generate-tournament"),
            json!({}),
        )
        .await;
        assert_eq!(status, 400, "{body}");

        let first = db::matches::Entity::find()
            .filter(db::matches::Column::Order.eq(1))
            .one(&db)
            .await
            .unwrap()
            .expect("No first fixture");
        let home = team_roster(&db, first.team_a_id.unwrap()).await;
        let away = team_roster(&db, first.team_b_id.unwrap()).await;
        let rows: Vec<String> = home
            .iter()
            .map(|p| format!("{},{p},5,2,2,1,3,2,1,6,3,90,3", first.id))
            .chain(
                away.iter()
                    .map(|p| format!("{},{p},5,2,1,2,1,1,0,2,6,20,1", first.id)),
            )
            .collect();

        let (status, _) = upload(&client, &base, sheet(&rows), "text/csv", "wrong").await;
        assert_eq!(status, 401);
        let (status, body) =
            upload(&client, &base, sheet(&rows), "text/plain", UPLOAD_PASSWORD).await;
        assert_eq!(status, 400, "{body}");

        let mut with_strangers = rows.clone();
        with_strangers.push(format!("{},Mara Jade,5,2,0,0,0,0,0,0,0,0,2", first.id));
        with_strangers.push(format!("{},Mara Jade,5,2,0,0,0,0,0,0,0,0,2", first.id));
        let (status, body) = upload(
            &client,
            &base,
            sheet(&with_strangers),
            "text/csv",
            UPLOAD_PASSWORD,
        )
        .await;
        assert_eq!(status, 400, "{body}");
        assert_eq!(body["missing_players"], json!(["Mara Jade"]));
        let stored = db::player_match_stats::Entity::find().count(&db).await.unwrap();
        assert_eq!(stored, 0);

        // Warm the cache so the upload has something to invalidate.
        let teams: Value = client
            .get(format!("{base}/api/admin/get-teams"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(teams.as_array().unwrap().iter().all(|t| t["stats"]["points"] == 0));

        for _ in 0..2 {
            let (status, body) =
                upload(&client, &base, sheet(&rows), "text/csv", UPLOAD_PASSWORD).await;
            assert!(status.is_success(), "{body}");
            assert_eq!(body["match_id"], json!(first.id));
            assert_eq!(body["players_processed"], json!(rows.len()));
        }
        let stored = db::player_match_stats::Entity::find().count(&db).await.unwrap();
        assert_eq!(stored as usize, rows.len());

        let teams: Value = client
            .get(format!("{base}/api/admin/get-teams"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let leader = &teams[0];
        assert_eq!(leader["id"], json!(first.team_a_id.unwrap()));
        assert_eq!(leader["stats"]["points"], json!(3));
        assert_eq!(leader["stats"]["kills"], json!(18));

        for page in [
            "/".to_owned(),
            "/teams".to_owned(),
            format!("/teams/{}", first.team_a_id.unwrap()),
            "/players".to_owned(),
            "/matches".to_owned(),
            format!("/matches/{}", first.id),
            "/admin".to_owned(),
        ] {
            let resp = client.get(format!("{base}{page}")).send().await.unwrap();
            assert!(resp.status().is_success(), "GET {page}: {}", resp.status());
            let html = resp.text().await.unwrap();
            assert!(html.contains("Tourney"), "GET {page}");
        }
        let resp = client.get(format!("{base}/matches/99999")).send().await.unwrap();
        assert_eq!(resp.status(), 404);

        let (status, body) = post_json(
            &client,
            format!("{base}/api/admin/create-player-and-assign"),
            json!({ "playerName": home[0], "teamId": null, "password": API_PASSWORD }),
        )
        .await;
        assert_eq!(status, 409, "{body}");
        let (status, body) = post_json(
            &client,
            format!("{base}/api/admin/create-player-and-assign"),
            json!({ "playerName": "Mara Jade", "teamId": null, "password": API_PASSWORD }),
        )
        .await;
        assert!(status.is_success(), "{body}");
        let unassigned: Value = client
            .get(format!("{base}/api/admin/get-unassigned-players"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(unassigned.as_array().map(|p| p.len()), Some(1));
        let (status, _) = post_json(
            &client,
            format!("{base}/api/admin/update-team-name"),
            json!({ "teamId": 99999, "newName": "Nobody", "password": API_PASSWORD }),
        )
        .await;
        assert_eq!(status, 404);

        let (status, _) = post_json(
            &client,
            format!("{base}/api/admin/reset-all-stats"),
            json!({ "password": API_PASSWORD }),
        )
        .await;
        assert_eq!(status, 401);
        let (status, body) = post_json(
            &client,
            format!("{base}/api/admin/reset-all-stats"),
            json!({ "password": RESET_PASSWORD }),
        )
        .await;
        assert!(status.is_success(), "{body}");
        let completed = db::matches::Entity::find()
            .filter(db::matches::Column::IsCompleted.eq(true))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(completed, 0);
        let players = db::players::Entity::find().count(&db).await.unwrap();
        assert_eq!(players, 13);

        let resp = client
            .post(format!("{base}/api/admin/create-team"))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        server_handle.stop(true).await;
        server_join.await.expect("Server task panicked");
    }
}
