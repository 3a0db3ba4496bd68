use tourney_db::{player_match_stats, prelude::*};
use sea_orm::EntityTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn idx<E: EntityTrait>(s: &sea_orm::Schema, e: E) -> Vec<IndexCreateStatement> {
    s.create_index_from_entity(e)
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        let s = sea_orm::Schema::new(m.get_database_backend());
        m.create_table(s.create_table_from_entity(Teams)).await?;
        m.create_table(s.create_table_from_entity(Players)).await?;
        m.create_table(s.create_table_from_entity(Matches)).await?;
        m.create_table(s.create_table_from_entity(TeamStats)).await?;
        m.create_table(s.create_table_from_entity(PlayerStats)).await?;
        m.create_table(s.create_table_from_entity(PlayerMatchStats))
            .await?;
        let s = &s;
        let all_idx = [
            idx(s, Teams),
            idx(s, Players),
            idx(s, Matches),
            idx(s, TeamStats),
            idx(s, PlayerStats),
            idx(s, PlayerMatchStats),
        ]
        .into_iter()
        .flatten();
        for i in all_idx {
            m.create_index(i).await?;
        }
        // Upsert target for uploaded match sheets.
        let mut match_player_index = Index::create();
        match_player_index
            .name("player-match-stats-match-id-player-id-index")
            .if_not_exists()
            .table(PlayerMatchStats)
            .col(player_match_stats::Column::MatchId)
            .col(player_match_stats::Column::PlayerId)
            .unique();
        m.create_index(match_player_index).await?;
        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(PlayerMatchStats).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop player_match_stats"))?;
        m.drop_table(Table::drop().table(PlayerStats).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop player_stats"))?;
        m.drop_table(Table::drop().table(TeamStats).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop team_stats"))?;
        m.drop_table(Table::drop().table(Matches).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop matches"))?;
        m.drop_table(Table::drop().table(Players).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop players"))?;
        m.drop_table(Table::drop().table(Teams).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop teams"))?;
        Ok(())
    }
}

fn log_err<'a>(ctx: &'a str) -> impl FnOnce(&DbErr) + 'a {
    move |e| {
        eprintln!("{ctx}: {e}");
    }
}
