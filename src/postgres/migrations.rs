//! Database migrations for Postgres.
//!
//! # Example
//!
//! ```rust,ignore
//! use cohort::postgres::migrations;
//! use sqlx::PgPool;
//!
//! async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::PgPool;

/// Runs the teams migrations.
///
/// This includes the `team_members` table and its lookup index.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/teams").run(pool).await
}
