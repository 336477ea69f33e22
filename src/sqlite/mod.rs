//! `SQLite` database backend implementations.
//!
//! Provides a `SQLite`-backed membership store. Enable the `sqlx_sqlite`
//! feature to use it.

mod membership;
pub mod migrations;

pub use membership::SqliteMembershipStore;
