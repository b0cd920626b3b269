//! Database migrations

use sea_orm_migration::prelude::*;

mod m20130301_000001_init_directory_schema;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20130301_000001_init_directory_schema::Migration)]
    }
}
