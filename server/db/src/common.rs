use sea_orm::{DeriveActiveEnum, EnumIter};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum Stage {
    #[default]
    #[sea_orm(string_value = "group")]
    Group,
    #[sea_orm(string_value = "semi-final")]
    SemiFinal,
    #[sea_orm(string_value = "final")]
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Group => "group",
            Stage::SemiFinal => "semi-final",
            Stage::Final => "final",
        }
    }
}
