//! Postgres database backend implementations.
//!
//! Provides a Postgres-backed membership store. Enable the `sqlx_postgres`
//! feature to use it.

mod membership;
pub mod migrations;

pub use membership::PostgresMembershipStore;
