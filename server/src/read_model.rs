use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::DataCache;
use crate::engine::{db_err, Error};
use tourney_db as db;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct TeamStatsView {
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub captures: i32,
    pub flag_returns: i32,
    pub kills: i32,
    pub points: i32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub founded: Option<String>,
    pub player_count: usize,
    pub stats: TeamStatsView,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PlayerStatsView {
    pub impact: i32,
    pub flag_captures: i32,
    pub flag_returns: i32,
    pub bc_kills: i32,
    pub dbs_kills: i32,
    pub dfa_kills: i32,
    pub overall_kills: i32,
    pub overall_deaths: i32,
    pub flaghold_time: i32,
    pub kd: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PlayerSummary {
    pub id: i64,
    pub name: String,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub role: Option<String>,
    pub stats: PlayerStatsView,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchSummary {
    pub id: i64,
    pub round: String,
    pub stage: String,
    pub order: Option<i32>,
    pub team_a_id: Option<i64>,
    pub team_b_id: Option<i64>,
    pub team_a_name: Option<String>,
    pub team_b_name: Option<String>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub team_a_returns: Option<i32>,
    pub team_b_returns: Option<i32>,
    pub team_a_kills: Option<i32>,
    pub team_b_kills: Option<i32>,
    pub team_a_flag_time: Option<i32>,
    pub team_b_flag_time: Option<i32>,
    pub is_completed: bool,
    pub scheduled_time: Option<String>,
}

impl MatchSummary {
    pub fn involves(&self, team_id: i64) -> bool {
        self.team_a_id == Some(team_id) || self.team_b_id == Some(team_id)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchPlayerLine {
    pub player_id: i64,
    pub player_name: String,
    pub team_name: Option<String>,
    pub stats: PlayerStatsView,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchSides {
    pub team_a: Vec<MatchPlayerLine>,
    pub team_b: Vec<MatchPlayerLine>,
    pub other: Vec<MatchPlayerLine>,
}

fn kd(kills: i32, deaths: i32) -> String {
    if deaths == 0 {
        format!("{:.2}", kills as f64)
    } else {
        format!("{:.2}", kills as f64 / deaths as f64)
    }
}

fn player_stats_view(s: &db::player_stats::Model) -> PlayerStatsView {
    PlayerStatsView {
        impact: s.impact,
        flag_captures: s.flag_captures,
        flag_returns: s.flag_returns,
        bc_kills: s.bc_kills,
        dbs_kills: s.dbs_kills,
        dfa_kills: s.dfa_kills,
        overall_kills: s.overall_kills,
        overall_deaths: s.overall_deaths,
        flaghold_time: s.flaghold_time,
        kd: kd(s.overall_kills, s.overall_deaths),
    }
}

fn match_stats_view(s: &db::player_match_stats::Model) -> PlayerStatsView {
    PlayerStatsView {
        impact: s.impact,
        flag_captures: s.flag_captures,
        flag_returns: s.flag_returns,
        bc_kills: s.bc_kills,
        dbs_kills: s.dbs_kills,
        dfa_kills: s.dfa_kills,
        overall_kills: s.overall_kills,
        overall_deaths: s.overall_deaths,
        flaghold_time: s.flaghold_time,
        kd: kd(s.overall_kills, s.overall_deaths),
    }
}

async fn team_names<C: ConnectionTrait>(db: &C) -> Result<HashMap<i64, String>, Error> {
    let names: Vec<(i64, String)> = db::teams::Entity::find()
        .select_only()
        .column(db::teams::Column::Id)
        .column(db::teams::Column::Name)
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch team names"))?;
    Ok(names.into_iter().collect())
}

/// Teams in standings order: points, then wins, then captures.
pub async fn load_teams<C: ConnectionTrait>(db: &C) -> Result<Vec<TeamSummary>, Error> {
    let rows = db::teams::Entity::find()
        .find_also_related(db::team_stats::Entity)
        .all(db)
        .await
        .map_err(db_err("Failed to fetch teams"))?;
    let memberships: Vec<Option<i64>> = db::players::Entity::find()
        .select_only()
        .column(db::players::Column::TeamId)
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch team memberships"))?;
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for team_id in memberships.into_iter().flatten() {
        *counts.entry(team_id).or_default() += 1;
    }
    let mut teams: Vec<TeamSummary> = rows
        .into_iter()
        .map(|(t, s)| TeamSummary {
            player_count: counts.get(&t.id).copied().unwrap_or(0),
            stats: s
                .map(|s| TeamStatsView {
                    played: s.matches_played,
                    won: s.matches_won,
                    drawn: s.matches_drawn,
                    lost: s.matches_lost,
                    captures: s.captures,
                    flag_returns: s.flag_returns,
                    kills: s.kills,
                    points: s.points,
                })
                .unwrap_or_default(),
            id: t.id,
            name: t.name,
            founded: t.founded,
        })
        .collect();
    teams.sort_by(|a, b| {
        (b.stats.points, b.stats.won, b.stats.captures)
            .cmp(&(a.stats.points, a.stats.won, a.stats.captures))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(teams)
}

/// Players by lifetime impact, then kills.
pub async fn load_players<C: ConnectionTrait>(db: &C) -> Result<Vec<PlayerSummary>, Error> {
    let rows = db::players::Entity::find()
        .find_also_related(db::player_stats::Entity)
        .all(db)
        .await
        .map_err(db_err("Failed to fetch players"))?;
    let names = team_names(db).await?;
    let mut players: Vec<PlayerSummary> = rows
        .into_iter()
        .map(|(p, s)| PlayerSummary {
            team_name: p.team_id.and_then(|id| names.get(&id).cloned()),
            stats: s.as_ref().map(player_stats_view).unwrap_or_else(|| PlayerStatsView {
                kd: kd(0, 0),
                ..Default::default()
            }),
            id: p.id,
            name: p.name,
            team_id: p.team_id,
            role: p.role,
        })
        .collect();
    players.sort_by(|a, b| {
        (b.stats.impact, b.stats.overall_kills)
            .cmp(&(a.stats.impact, a.stats.overall_kills))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(players)
}

/// Matches in schedule order. Rows without an order go last.
pub async fn load_matches<C: ConnectionTrait>(db: &C) -> Result<Vec<MatchSummary>, Error> {
    let rows = db::matches::Entity::find()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch matches"))?;
    let names = team_names(db).await?;
    let name_of = |id: Option<i64>| id.and_then(|id| names.get(&id).cloned());
    let mut matches: Vec<MatchSummary> = rows
        .into_iter()
        .map(|m| MatchSummary {
            id: m.id,
            stage: m.stage.as_str().to_owned(),
            order: m.order,
            team_a_name: name_of(m.team_a_id),
            team_b_name: name_of(m.team_b_id),
            team_a_id: m.team_a_id,
            team_b_id: m.team_b_id,
            score_a: m.score_a,
            score_b: m.score_b,
            team_a_returns: m.team_a_returns,
            team_b_returns: m.team_b_returns,
            team_a_kills: m.team_a_kills,
            team_b_kills: m.team_b_kills,
            team_a_flag_time: m.team_a_flag_time,
            team_b_flag_time: m.team_b_flag_time,
            is_completed: m.is_completed,
            scheduled_time: m.scheduled_time.and_then(|t| t.format(&Rfc3339).ok()),
            round: m.round,
        })
        .collect();
    matches.sort_by_key(|m| (m.order.is_none(), m.order, m.id));
    Ok(matches)
}

pub async fn teams<C: ConnectionTrait>(
    cache: &DataCache,
    db: &C,
) -> Result<Arc<Vec<TeamSummary>>, Error> {
    if let Some(teams) = cache.teams() {
        return Ok(teams);
    }
    let teams = Arc::new(load_teams(db).await?);
    cache.put_teams(teams.clone());
    Ok(teams)
}

pub async fn players<C: ConnectionTrait>(
    cache: &DataCache,
    db: &C,
) -> Result<Arc<Vec<PlayerSummary>>, Error> {
    if let Some(players) = cache.players() {
        return Ok(players);
    }
    let players = Arc::new(load_players(db).await?);
    cache.put_players(players.clone());
    Ok(players)
}

pub async fn matches<C: ConnectionTrait>(
    cache: &DataCache,
    db: &C,
) -> Result<Arc<Vec<MatchSummary>>, Error> {
    if let Some(matches) = cache.matches() {
        return Ok(matches);
    }
    let matches = Arc::new(load_matches(db).await?);
    cache.put_matches(matches.clone());
    Ok(matches)
}

pub fn upcoming(matches: &[MatchSummary], limit: usize) -> Vec<MatchSummary> {
    matches
        .iter()
        .filter(|m| !m.is_completed)
        .take(limit)
        .cloned()
        .collect()
}

/// Completed matches, latest in schedule order first.
pub fn recent(matches: &[MatchSummary], limit: usize) -> Vec<MatchSummary> {
    matches
        .iter()
        .rev()
        .filter(|m| m.is_completed)
        .take(limit)
        .cloned()
        .collect()
}

/// Per-player lines of one match, split by the players' current teams. Always
/// read live.
pub async fn match_sides<C: ConnectionTrait>(
    db: &C,
    m: &MatchSummary,
) -> Result<MatchSides, Error> {
    let rows = db::player_match_stats::Entity::find()
        .filter(db::player_match_stats::Column::MatchId.eq(m.id))
        .find_also_related(db::players::Entity)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch player stats of match {}", m.id)))?;
    let names = team_names(db).await?;
    let mut sides = MatchSides::default();
    for (stats, player) in rows {
        let team_id = player.as_ref().and_then(|p| p.team_id);
        let line = MatchPlayerLine {
            player_id: stats.player_id,
            player_name: player.map(|p| p.name).unwrap_or_default(),
            team_name: team_id.and_then(|id| names.get(&id).cloned()),
            stats: match_stats_view(&stats),
        };
        match team_id {
            Some(_) if team_id == m.team_a_id => sides.team_a.push(line),
            Some(_) if team_id == m.team_b_id => sides.team_b.push(line),
            _ => sides.other.push(line),
        }
    }
    for side in [&mut sides.team_a, &mut sides.team_b, &mut sides.other] {
        side.sort_by(|a, b| {
            b.stats
                .impact
                .cmp(&a.stats.impact)
                .then_with(|| a.player_name.cmp(&b.player_name))
        });
    }
    Ok(sides)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::test::ManualClock;
    use crate::engine::test::{add_match, add_player, add_team, test_db};
    use std::time::Duration;

    fn m(id: i64, order: Option<i32>, done: bool) -> MatchSummary {
        MatchSummary {
            id,
            order,
            is_completed: done,
            ..Default::default()
        }
    }

    #[test]
    fn test_upcoming_and_recent() {
        let all = vec![
            m(1, Some(1), true),
            m(2, Some(2), true),
            m(3, Some(3), false),
            m(4, Some(4), false),
            m(5, Some(5), false),
        ];
        let ids = |v: Vec<MatchSummary>| v.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(upcoming(&all, 2)), vec![3, 4]);
        assert_eq!(ids(recent(&all, 5)), vec![2, 1]);
    }

    #[test]
    fn test_kd() {
        assert_eq!(kd(9, 4), "2.25");
        assert_eq!(kd(3, 0), "3.00");
        assert_eq!(kd(0, 0), "0.00");
    }

    #[tokio::test]
    async fn test_reads_go_through_cache() {
        let db = test_db().await;
        let rebels = add_team(&db, "Rebels").await;
        add_player(&db, "Kyle", Some(rebels)).await;
        add_player(&db, "Jan", None).await;
        let clock = Arc::new(ManualClock::new());
        let cache = DataCache::new(Duration::from_secs(300), clock.clone());

        let first = teams(&cache, &db).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].player_count, 1);
        add_team(&db, "Empire").await;
        assert_eq!(teams(&cache, &db).await.unwrap().len(), 1);

        cache.invalidate();
        assert_eq!(teams(&cache, &db).await.unwrap().len(), 2);

        add_team(&db, "Smugglers").await;
        clock.advance(Duration::from_secs(300));
        assert_eq!(teams(&cache, &db).await.unwrap().len(), 3);

        let players = players(&cache, &db).await.unwrap();
        let jan = players.iter().find(|p| p.name == "Jan").unwrap();
        assert_eq!((jan.team_id, jan.team_name.as_deref()), (None, None));
        let kyle = players.iter().find(|p| p.name == "Kyle").unwrap();
        assert_eq!(kyle.team_name.as_deref(), Some("Rebels"));
    }

    #[tokio::test]
    async fn test_match_names_and_order() {
        let db = test_db().await;
        let rebels = add_team(&db, "Rebels").await;
        let empire = add_team(&db, "Empire").await;
        let id = add_match(&db, rebels, empire).await;
        let loaded = load_matches(&db).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, id);
        assert_eq!(loaded[0].team_a_name.as_deref(), Some("Rebels"));
        assert_eq!(loaded[0].team_b_name.as_deref(), Some("Empire"));
        assert_eq!(loaded[0].stage, "group");
        assert!(loaded[0].involves(empire));
        let sides = match_sides(&db, &loaded[0]).await.unwrap();
        assert!(sides.team_a.is_empty() && sides.team_b.is_empty() && sides.other.is_empty());
    }
}
