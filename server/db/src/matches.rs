use sea_orm::entity::prelude::*;

use crate::common::Stage;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub round: String,
    #[sea_orm(indexed)]
    pub stage: Stage,
    // Older deployments have no such column, see fixtures::insert_fixtures.
    pub order: Option<i32>,
    #[sea_orm(indexed)]
    pub team_a_id: Option<i64>,
    #[sea_orm(indexed)]
    pub team_b_id: Option<i64>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub team_a_returns: Option<i32>,
    pub team_b_returns: Option<i32>,
    pub team_a_kills: Option<i32>,
    pub team_b_kills: Option<i32>,
    pub team_a_flag_time: Option<i32>,
    pub team_b_flag_time: Option<i32>,
    #[sea_orm(indexed)]
    pub is_completed: bool,
    pub scheduled_time: Option<TimeDateTimeWithTimeZone>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::player_match_stats::Entity")]
    PlayerMatchStats,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamAId",
        to = "super::teams::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    TeamA,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamBId",
        to = "super::teams::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    TeamB,
}

impl Related<super::player_match_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerMatchStats.def()
    }
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        super::player_match_stats::Relation::Players.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::player_match_stats::Relation::Matches.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
