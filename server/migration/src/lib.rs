pub use sea_orm_migration::prelude::*;

mod m20250302_181204_create_tables;
mod m20250309_120530_populate_demo_roster;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250302_181204_create_tables::Migration),
            Box::new(m20250309_120530_populate_demo_roster::Migration),
        ]
    }
}
