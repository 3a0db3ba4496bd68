use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    // Uploaded match sheets refer to players by exact name.
    #[sea_orm(unique, indexed)]
    pub name: String,
    #[sea_orm(indexed)]
    pub team_id: Option<i64>,
    pub role: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Teams,
    #[sea_orm(has_one = "super::player_stats::Entity")]
    PlayerStats,
    #[sea_orm(has_many = "super::player_match_stats::Entity")]
    PlayerMatchStats,
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl Related<super::player_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerStats.def()
    }
}

impl Related<super::player_match_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerMatchStats.def()
    }
}

impl Related<super::matches::Entity> for Entity {
    fn to() -> RelationDef {
        super::player_match_stats::Relation::Matches.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::player_match_stats::Relation::Players.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
