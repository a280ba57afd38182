pub use sea_orm_migration::prelude::*;

mod m20260601_000000_bootstrap;
mod m20260601_000001_create_users;
mod m20260601_000002_create_campaigns;
mod m20260601_000003_create_linkedin_accounts;
mod m20260601_000004_create_leads;
mod m20260601_000005_create_messages;
mod m20260601_000006_create_workflow_jobs;
mod m20260601_000007_create_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000000_bootstrap::Migration),
            Box::new(m20260601_000001_create_users::Migration),
            Box::new(m20260601_000002_create_campaigns::Migration),
            Box::new(m20260601_000003_create_linkedin_accounts::Migration),
            Box::new(m20260601_000004_create_leads::Migration),
            Box::new(m20260601_000005_create_messages::Migration),
            Box::new(m20260601_000006_create_workflow_jobs::Migration),
            Box::new(m20260601_000007_create_posts::Migration),
        ]
    }
}
