use sea_orm_migration::prelude::*;

mod m20260301_create_admin_users;
mod m20260301_create_sessions;
mod m20260305_create_documents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_admin_users::Migration),
            Box::new(m20260301_create_sessions::Migration),
            Box::new(m20260305_create_documents::Migration),
        ]
    }
}
