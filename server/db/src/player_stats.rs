use sea_orm::entity::prelude::*;

/// Lifetime totals of a player, derived from `player_match_stats`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "player_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub player_id: i64,
    #[sea_orm(indexed)]
    pub impact: i32,
    pub flag_captures: i32,
    pub flag_returns: i32,
    pub bc_kills: i32,
    pub dbs_kills: i32,
    pub dfa_kills: i32,
    pub overall_kills: i32,
    pub overall_deaths: i32,
    pub flaghold_time: i32,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::players::Entity",
        from = "Column::PlayerId",
        to = "super::players::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Players,
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Players.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
