use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    // Renaming is allowed; uniqueness is left to the operator.
    #[sea_orm(indexed)]
    pub name: String,
    pub founded: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::players::Entity")]
    Players,
    #[sea_orm(has_one = "super::team_stats::Entity")]
    TeamStats,
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Players.def()
    }
}

impl Related<super::team_stats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamStats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
