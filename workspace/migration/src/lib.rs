pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_ledger_tables;
mod m20240815_000001_add_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_ledger_tables::Migration),
            Box::new(m20240815_000001_add_audit_logs::Migration),
        ]
    }
}
