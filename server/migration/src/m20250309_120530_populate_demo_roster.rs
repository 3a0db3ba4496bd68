use tourney_db::{player_stats, players, team_stats, teams};
use sea_orm::entity::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const DEMO_ROSTER: [(&str, &str, [&str; 3]); 4] = [
    ("Rebel Squadron", "2003", ["Kyle", "Jan", "Rosh"]),
    ("Dark Side", "2003", ["Desann", "Tavion", "Alora"]),
    ("Bespin Blades", "2005", ["Lando", "Lobot", "Ugnaught"]),
    ("Yavin Temple", "2005", ["Luke", "Kam", "Tionne"]),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        if std::env::var("TOURNEY_POPULATE_DATABASE").is_err() {
            return Ok(());
        }
        let db = m.get_connection();
        for (name, founded, roster) in DEMO_ROSTER {
            populate_team(db, name, founded, &roster).await?;
        }
        Ok(())
    }

    async fn down(&self, _m: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

async fn populate_team<C: ConnectionTrait>(
    db: &C,
    name: &str,
    founded: &str,
    roster: &[&str],
) -> Result<(), DbErr> {
    let now = TimeDateTimeWithTimeZone::now_utc();
    let team = teams::ActiveModel {
        name: Set(name.to_owned()),
        founded: Set(Some(founded.to_owned())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let team_id = teams::Entity::insert(team).exec(db).await?.last_insert_id;
    team_stats::Entity::insert(team_stats::ActiveModel {
        team_id: Set(team_id),
        matches_played: Set(0),
        matches_won: Set(0),
        matches_drawn: Set(0),
        matches_lost: Set(0),
        captures: Set(0),
        flag_returns: Set(0),
        kills: Set(0),
        points: Set(0),
        updated_at: Set(now),
    })
    .exec_without_returning(db)
    .await?;
    for player_name in roster {
        let player = players::ActiveModel {
            name: Set((*player_name).to_owned()),
            team_id: Set(Some(team_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let player_id = players::Entity::insert(player)
            .exec(db)
            .await
            .map_err(|e| DbErr::Custom(format!("Failed to seed player {player_name}: {e}")))?
            .last_insert_id;
        player_stats::Entity::insert(player_stats::ActiveModel {
            player_id: Set(player_id),
            impact: Set(0),
            flag_captures: Set(0),
            flag_returns: Set(0),
            bc_kills: Set(0),
            dbs_kills: Set(0),
            dfa_kills: Set(0),
            overall_kills: Set(0),
            overall_deaths: Set(0),
            flaghold_time: Set(0),
            updated_at: Set(now),
        })
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}
