pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_campaign_schema;
mod m20251001_000002_reporting_indexes;
mod m20251001_000003_name_search_extension;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_campaign_schema::Migration),
            Box::new(m20251001_000002_reporting_indexes::Migration),
            Box::new(m20251001_000003_name_search_extension::Migration),
        ]
    }
}
