use derive_more::Display;
use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, SqlErr, TransactionError, TransactionTrait,
};
use sea_query::OnConflict;

use std::collections::HashMap;

use crate::ingest::ValidatedUpload;
use crate::validation;
use tourney_db as db;

#[derive(Debug)]
pub struct DbError {
    pub context: String,
    pub db_error: DbErr,
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.db_error)
    }
}

impl std::error::Error for DbError {}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ResetStage {
    #[display(fmt = "delete player match stats")]
    DeletePlayerMatchStats,
    #[display(fmt = "reset player stats")]
    ZeroPlayerStats,
    #[display(fmt = "reset team stats")]
    ZeroTeamStats,
    #[display(fmt = "reset matches")]
    ResetMatches,
}

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{_0}")]
    Db(DbError),
    #[display(fmt = "Failed to {stage}: {db_error}")]
    Reset { stage: ResetStage, db_error: DbErr },
    #[display(fmt = "{_0}")]
    NotFound(String),
    #[display(fmt = "{_0}")]
    InvalidArgument(String),
    #[display(fmt = "{_0}")]
    Conflict(String),
    #[display(fmt = "{_0}")]
    AlreadyExists(String),
}

impl std::error::Error for Error {}

pub(crate) fn db_err(context: impl Into<String>) -> impl FnOnce(DbErr) -> Error {
    let context = context.into();
    move |db_error| Error::Db(DbError { context, db_error })
}

fn reset_err(stage: ResetStage) -> impl FnOnce(DbErr) -> Error {
    move |db_error| Error::Reset { stage, db_error }
}

fn flatten_txn_error(context: &str, e: TransactionError<Error>) -> Error {
    match e {
        TransactionError::Connection(db_error) => Error::Db(DbError {
            context: context.to_owned(),
            db_error,
        }),
        TransactionError::Transaction(e) => e,
    }
}

/// A result that succeeded in its main effect but not in a follow-up one.
#[derive(Debug)]
pub struct WithWarning<T> {
    pub value: T,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub match_id: i64,
    pub players_processed: usize,
}

pub async fn player_ids_by_name<C: ConnectionTrait>(db: &C) -> Result<HashMap<String, i64>, Error> {
    let players = db::players::Entity::find()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch players"))?;
    Ok(players.into_iter().map(|p| (p.name, p.id)).collect())
}

/// Writes a validated match sheet. Per-player rows, the match score and the
/// side aggregates are committed together; lifetime stats are refreshed
/// afterwards and a failure there is only logged.
pub async fn ingest_match_stats(
    db: &DatabaseConnection,
    upload: ValidatedUpload,
) -> Result<IngestSummary, Error> {
    let summary = IngestSummary {
        match_id: upload.match_id,
        players_processed: upload.rows.len(),
    };
    let player_ids: Vec<i64> = upload.rows.iter().map(|r| r.player_id).collect();
    db.transaction::<_, (), Error>(|txn| Box::pin(async move { write_match_sheet(txn, upload).await }))
        .await
        .map_err(|e| flatten_txn_error("Match sheet transaction failed", e))?;
    log::info!(
        "Stored stats of {} players for match {}",
        summary.players_processed,
        summary.match_id
    );

    for player_id in player_ids {
        if let Err(e) = recalculate_player_lifetime_stats(db, player_id).await {
            log::error!("Failed to recalculate lifetime stats of player {player_id}: {e}");
        }
    }
    if let Err(e) = update_team_stats_for_match(db, summary.match_id).await {
        log::error!(
            "Failed to update team stats for match {}: {e}",
            summary.match_id
        );
    }
    Ok(summary)
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct SideTotals {
    returns: i32,
    kills: i32,
    flag_time: i32,
}

impl SideTotals {
    fn add(&mut self, s: &db::player_match_stats::Model) -> Result<(), Error> {
        self.returns = add_stat(self.returns, s.flag_returns, "flag_returns")?;
        self.kills = add_stat(self.kills, s.overall_kills, "overall_kills")?;
        self.flag_time = add_stat(self.flag_time, s.flaghold_time, "flaghold_time")?;
        Ok(())
    }
}

fn add_stat(total: i32, value: i32, column: &str) -> Result<i32, Error> {
    total.checked_add(value).ok_or_else(|| {
        Error::InvalidArgument(format!("Total of {column} is out of range."))
    })
}

async fn write_match_sheet<C: ConnectionTrait>(
    txn: &C,
    upload: ValidatedUpload,
) -> Result<(), Error> {
    let match_id = upload.match_id;
    let Some(m) = db::matches::Entity::find_by_id(match_id)
        .one(txn)
        .await
        .map_err(db_err(format!("Failed to fetch match {match_id}")))?
    else {
        return Err(Error::NotFound(format!("Match {match_id} not found.")));
    };
    let now = TimeDateTimeWithTimeZone::now_utc();

    use db::player_match_stats::Column as Pms;
    let rows = upload.rows.iter().map(|r| db::player_match_stats::ActiveModel {
        match_id: Set(match_id),
        player_id: Set(r.player_id),
        flag_captures: Set(r.stats.flag_captures),
        flag_returns: Set(r.stats.flag_returns),
        bc_kills: Set(r.stats.bc_kills),
        dbs_kills: Set(r.stats.dbs_kills),
        dfa_kills: Set(r.stats.dfa_kills),
        overall_kills: Set(r.stats.overall_kills),
        overall_deaths: Set(r.stats.overall_deaths),
        flaghold_time: Set(r.stats.flaghold_time),
        impact: Set(r.stats.impact.get()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    });
    db::player_match_stats::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([Pms::MatchId, Pms::PlayerId])
                .update_columns([
                    Pms::FlagCaptures,
                    Pms::FlagReturns,
                    Pms::BcKills,
                    Pms::DbsKills,
                    Pms::DfaKills,
                    Pms::OverallKills,
                    Pms::OverallDeaths,
                    Pms::FlagholdTime,
                    Pms::Impact,
                    Pms::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(db_err(format!("Failed to upsert player stats of match {match_id}")))?;

    let stored = db::player_match_stats::Entity::find()
        .filter(Pms::MatchId.eq(match_id))
        .find_also_related(db::players::Entity)
        .all(txn)
        .await
        .map_err(db_err(format!("Failed to re-read player stats of match {match_id}")))?;
    let mut side_a = SideTotals::default();
    let mut side_b = SideTotals::default();
    for (stats, player) in stored.iter() {
        let team_id = player.as_ref().and_then(|p| p.team_id);
        match team_id {
            Some(t) if Some(t) == m.team_a_id => side_a.add(stats)?,
            Some(t) if Some(t) == m.team_b_id => side_b.add(stats)?,
            _ => log::warn!(
                "Player {} (team {team_id:?}) is on neither side of match {match_id}; not attributed",
                stats.player_id
            ),
        }
    }

    let update = db::matches::ActiveModel {
        id: Set(match_id),
        score_a: Set(Some(upload.score_a)),
        score_b: Set(Some(upload.score_b)),
        team_a_returns: Set(Some(side_a.returns)),
        team_b_returns: Set(Some(side_b.returns)),
        team_a_kills: Set(Some(side_a.kills)),
        team_b_kills: Set(Some(side_b.kills)),
        team_a_flag_time: Set(Some(side_a.flag_time)),
        team_b_flag_time: Set(Some(side_b.flag_time)),
        is_completed: Set(true),
        updated_at: Set(now),
        ..Default::default()
    };
    db::matches::Entity::update(update)
        .exec(txn)
        .await
        .map_err(db_err(format!("Failed to update match {match_id}")))?;
    Ok(())
}

fn zeroed_player_stats(
    player_id: i64,
    now: TimeDateTimeWithTimeZone,
) -> db::player_stats::ActiveModel {
    db::player_stats::ActiveModel {
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
    }
}

fn zeroed_team_stats(team_id: i64, now: TimeDateTimeWithTimeZone) -> db::team_stats::ActiveModel {
    db::team_stats::ActiveModel {
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
    }
}

fn player_stats_upsert() -> OnConflict {
    use db::player_stats::Column as C;
    OnConflict::column(C::PlayerId)
        .update_columns([
            C::Impact,
            C::FlagCaptures,
            C::FlagReturns,
            C::BcKills,
            C::DbsKills,
            C::DfaKills,
            C::OverallKills,
            C::OverallDeaths,
            C::FlagholdTime,
            C::UpdatedAt,
        ])
        .to_owned()
}

fn team_stats_upsert() -> OnConflict {
    use db::team_stats::Column as C;
    OnConflict::column(C::TeamId)
        .update_columns([
            C::MatchesPlayed,
            C::MatchesWon,
            C::MatchesDrawn,
            C::MatchesLost,
            C::Captures,
            C::FlagReturns,
            C::Kills,
            C::Points,
            C::UpdatedAt,
        ])
        .to_owned()
}

/// Re-derives the lifetime row of a player from all of their match rows.
pub async fn recalculate_player_lifetime_stats<C: ConnectionTrait>(
    db: &C,
    player_id: i64,
) -> Result<(), Error> {
    let history = db::player_match_stats::Entity::find()
        .filter(db::player_match_stats::Column::PlayerId.eq(player_id))
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch match stats of player {player_id}")))?;
    let now = TimeDateTimeWithTimeZone::now_utc();
    let mut total = zeroed_player_stats(player_id, now);
    let sum = |column: &'static str, field: fn(&db::player_match_stats::Model) -> i32| {
        history
            .iter()
            .map(field)
            .try_fold(0, |acc, v| add_stat(acc, v, column))
    };
    total.impact = Set(sum("impact", |s| s.impact)?);
    total.flag_captures = Set(sum("flag_captures", |s| s.flag_captures)?);
    total.flag_returns = Set(sum("flag_returns", |s| s.flag_returns)?);
    total.bc_kills = Set(sum("bc_kills", |s| s.bc_kills)?);
    total.dbs_kills = Set(sum("dbs_kills", |s| s.dbs_kills)?);
    total.dfa_kills = Set(sum("dfa_kills", |s| s.dfa_kills)?);
    total.overall_kills = Set(sum("overall_kills", |s| s.overall_kills)?);
    total.overall_deaths = Set(sum("overall_deaths", |s| s.overall_deaths)?);
    total.flaghold_time = Set(sum("flaghold_time", |s| s.flaghold_time)?);
    db::player_stats::Entity::insert(total)
        .on_conflict(player_stats_upsert())
        .exec_without_returning(db)
        .await
        .map_err(db_err(format!("Failed to store lifetime stats of player {player_id}")))?;
    Ok(())
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamTotals {
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub captures: i32,
    pub flag_returns: i32,
    pub kills: i32,
}

impl TeamTotals {
    pub fn points(&self) -> i32 {
        3 * self.won + self.drawn
    }
}

/// Folds completed matches into the totals of `team_id`. Matches the team did
/// not play and unfinished ones are ignored.
pub fn team_totals(team_id: i64, matches: &[db::matches::Model]) -> Result<TeamTotals, Error> {
    let mut t = TeamTotals::default();
    for m in matches.iter().filter(|m| m.is_completed) {
        let (own, other, returns, kills) = if m.team_a_id == Some(team_id) {
            (m.score_a, m.score_b, m.team_a_returns, m.team_a_kills)
        } else if m.team_b_id == Some(team_id) {
            (m.score_b, m.score_a, m.team_b_returns, m.team_b_kills)
        } else {
            continue;
        };
        let (own, other) = (own.unwrap_or(0), other.unwrap_or(0));
        t.played += 1;
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => t.won += 1,
            std::cmp::Ordering::Equal => t.drawn += 1,
            std::cmp::Ordering::Less => t.lost += 1,
        }
        t.captures = add_stat(t.captures, own, "captures")?;
        t.flag_returns = add_stat(t.flag_returns, returns.unwrap_or(0), "flag_returns")?;
        t.kills = add_stat(t.kills, kills.unwrap_or(0), "kills")?;
    }
    Ok(t)
}

pub async fn recalculate_team_stats<C: ConnectionTrait>(db: &C, team_id: i64) -> Result<(), Error> {
    use db::matches::Column as M;
    let matches = db::matches::Entity::find()
        .filter(
            Condition::all().add(M::IsCompleted.eq(true)).add(
                Condition::any()
                    .add(M::TeamAId.eq(team_id))
                    .add(M::TeamBId.eq(team_id)),
            ),
        )
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch matches of team {team_id}")))?;
    let t = team_totals(team_id, &matches)?;
    let row = db::team_stats::ActiveModel {
        team_id: Set(team_id),
        matches_played: Set(t.played),
        matches_won: Set(t.won),
        matches_drawn: Set(t.drawn),
        matches_lost: Set(t.lost),
        captures: Set(t.captures),
        flag_returns: Set(t.flag_returns),
        kills: Set(t.kills),
        points: Set(t.points()),
        updated_at: Set(TimeDateTimeWithTimeZone::now_utc()),
    };
    db::team_stats::Entity::insert(row)
        .on_conflict(team_stats_upsert())
        .exec_without_returning(db)
        .await
        .map_err(db_err(format!("Failed to store stats of team {team_id}")))?;
    Ok(())
}

pub async fn update_team_stats_for_match<C: ConnectionTrait>(
    db: &C,
    match_id: i64,
) -> Result<(), Error> {
    let Some(m) = db::matches::Entity::find_by_id(match_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch match {match_id}")))?
    else {
        return Err(Error::NotFound(format!("Match {match_id} not found.")));
    };
    for team_id in [m.team_a_id, m.team_b_id].into_iter().flatten() {
        recalculate_team_stats(db, team_id).await?;
    }
    Ok(())
}

/// Re-derives every lifetime row. Returns the number of players and teams
/// processed.
pub async fn recalculate_all<C: ConnectionTrait>(db: &C) -> Result<(usize, usize), Error> {
    let player_ids: Vec<i64> = db::players::Entity::find()
        .select_only()
        .column(db::players::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch player ids"))?;
    let team_ids: Vec<i64> = db::teams::Entity::find()
        .select_only()
        .column(db::teams::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch team ids"))?;
    for id in player_ids.iter() {
        recalculate_player_lifetime_stats(db, *id).await?;
    }
    for id in team_ids.iter() {
        recalculate_team_stats(db, *id).await?;
    }
    Ok((player_ids.len(), team_ids.len()))
}

/// Returns every derived statistic to zero. Teams, players and matches stay.
/// Stages run in order and a failed stage does not undo the earlier ones.
pub async fn reset_all_stats<C: ConnectionTrait>(db: &C) -> Result<(), Error> {
    let now = TimeDateTimeWithTimeZone::now_utc();

    let res = db::player_match_stats::Entity::delete_many()
        .exec(db)
        .await
        .map_err(reset_err(ResetStage::DeletePlayerMatchStats))?;
    log::info!("Deleted {} player match stats rows", res.rows_affected);

    let player_ids: Vec<i64> = db::players::Entity::find()
        .select_only()
        .column(db::players::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(reset_err(ResetStage::ZeroPlayerStats))?;
    if !player_ids.is_empty() {
        db::player_stats::Entity::insert_many(
            player_ids.iter().map(|id| zeroed_player_stats(*id, now)),
        )
        .on_conflict(player_stats_upsert())
        .exec_without_returning(db)
        .await
        .map_err(reset_err(ResetStage::ZeroPlayerStats))?;
    }

    let team_ids: Vec<i64> = db::teams::Entity::find()
        .select_only()
        .column(db::teams::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(reset_err(ResetStage::ZeroTeamStats))?;
    if !team_ids.is_empty() {
        db::team_stats::Entity::insert_many(team_ids.iter().map(|id| zeroed_team_stats(*id, now)))
            .on_conflict(team_stats_upsert())
            .exec_without_returning(db)
            .await
            .map_err(reset_err(ResetStage::ZeroTeamStats))?;
    }

    let reset = db::matches::ActiveModel {
        score_a: Set(Some(0)),
        score_b: Set(Some(0)),
        team_a_returns: Set(Some(0)),
        team_b_returns: Set(Some(0)),
        team_a_kills: Set(Some(0)),
        team_b_kills: Set(Some(0)),
        team_a_flag_time: Set(Some(0)),
        team_b_flag_time: Set(Some(0)),
        is_completed: Set(false),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = db::matches::Entity::update_many()
        .set(reset)
        .exec(db)
        .await
        .map_err(reset_err(ResetStage::ResetMatches))?;
    log::info!(
        "Reset stats of {} players, {} teams and {} matches",
        player_ids.len(),
        team_ids.len(),
        res.rows_affected
    );
    Ok(())
}

pub async fn matches_exist<C: ConnectionTrait>(db: &C) -> Result<bool, Error> {
    let n = db::matches::Entity::find()
        .select_only()
        .column(db::matches::Column::Id)
        .count(db)
        .await
        .map_err(db_err("Failed to count matches"))?;
    Ok(n > 0)
}

async fn ensure_team_exists<C: ConnectionTrait>(db: &C, team_id: i64) -> Result<(), Error> {
    let found = db::teams::Entity::find_by_id(team_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch team {team_id}")))?;
    match found {
        Some(_) => Ok(()),
        None => Err(Error::NotFound(format!("Team {team_id} not found."))),
    }
}

pub async fn create_team(
    db: &DatabaseConnection,
    name: &str,
    founded: Option<String>,
) -> Result<db::teams::Model, Error> {
    let name = name.trim().to_owned();
    validation::validate_team_name(&name).map_err(Error::InvalidArgument)?;
    let founded = founded.map(|f| f.trim().to_owned()).filter(|f| !f.is_empty());
    let team = db
        .transaction::<_, db::teams::Model, Error>(|txn| {
            Box::pin(async move {
                let now = TimeDateTimeWithTimeZone::now_utc();
                let team = db::teams::ActiveModel {
                    name: Set(name),
                    founded: Set(founded),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                let team = db::teams::Entity::insert(team)
                    .exec_with_returning(txn)
                    .await
                    .map_err(db_err("Failed to insert team"))?;
                db::team_stats::Entity::insert(zeroed_team_stats(team.id, now))
                    .exec_without_returning(txn)
                    .await
                    .map_err(db_err(format!("Failed to create stats of team {}", team.id)))?;
                Ok(team)
            })
        })
        .await
        .map_err(|e| flatten_txn_error("Team creation transaction failed", e))?;
    log::info!("Created team {} '{}'", team.id, team.name);
    Ok(team)
}

/// Creates a player with a zeroed lifetime row. The player is kept even if
/// the lifetime row cannot be written; the caller gets a warning instead.
pub async fn create_player_and_assign<C: ConnectionTrait>(
    db: &C,
    name: &str,
    team_id: Option<i64>,
) -> Result<WithWarning<db::players::Model>, Error> {
    let name = name.trim();
    validation::validate_player_name(name).map_err(Error::InvalidArgument)?;
    if let Some(team_id) = team_id {
        ensure_team_exists(db, team_id).await?;
    }
    let already_exists = || Error::AlreadyExists(format!("Player with name '{name}' already exists."));
    let taken = db::players::Entity::find()
        .filter(db::players::Column::Name.eq(name))
        .count(db)
        .await
        .map_err(db_err("Failed to look up player name"))?;
    if taken > 0 {
        return Err(already_exists());
    }
    let now = TimeDateTimeWithTimeZone::now_utc();
    let player = db::players::ActiveModel {
        name: Set(name.to_owned()),
        team_id: Set(team_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let player = match db::players::Entity::insert(player).exec_with_returning(db).await {
        Ok(p) => p,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(already_exists());
        }
        Err(db_error) => {
            return Err(Error::Db(DbError {
                context: "Failed to insert player".to_owned(),
                db_error,
            }));
        }
    };
    log::info!("Created player {} '{}' in team {team_id:?}", player.id, player.name);
    let warning = match db::player_stats::Entity::insert(zeroed_player_stats(player.id, now))
        .exec_without_returning(db)
        .await
    {
        Ok(_) => None,
        Err(e) => {
            log::error!("Failed to create stats of new player {}: {e}", player.id);
            Some(format!("Failed to initialize player_stats: {e}"))
        }
    };
    Ok(WithWarning {
        value: player,
        warning,
    })
}

pub async fn update_player_team<C: ConnectionTrait>(
    db: &C,
    player_id: i64,
    new_team_id: Option<i64>,
) -> Result<db::players::Model, Error> {
    let Some(player) = db::players::Entity::find_by_id(player_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch player {player_id}")))?
    else {
        return Err(Error::NotFound(format!("Player {player_id} not found.")));
    };
    if let Some(team_id) = new_team_id {
        ensure_team_exists(db, team_id).await?;
    }
    if player.team_id != new_team_id {
        // Earlier matches keep being attributed by the current team.
        log::info!(
            "Moving player {player_id} from team {:?} to {new_team_id:?}",
            player.team_id
        );
    }
    let update = db::players::ActiveModel {
        id: Set(player_id),
        team_id: Set(new_team_id),
        updated_at: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    db::players::Entity::update(update)
        .exec(db)
        .await
        .map_err(db_err(format!("Failed to update player {player_id}")))
}

pub async fn update_team_name<C: ConnectionTrait>(
    db: &C,
    team_id: i64,
    new_name: &str,
) -> Result<db::teams::Model, Error> {
    let new_name = new_name.trim();
    validation::validate_team_name(new_name).map_err(Error::InvalidArgument)?;
    ensure_team_exists(db, team_id).await?;
    let update = db::teams::ActiveModel {
        id: Set(team_id),
        name: Set(new_name.to_owned()),
        updated_at: Set(TimeDateTimeWithTimeZone::now_utc()),
        ..Default::default()
    };
    db::teams::Entity::update(update)
        .exec(db)
        .await
        .map_err(db_err(format!("Failed to rename team {team_id}")))
}
