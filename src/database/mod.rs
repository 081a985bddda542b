// Copyright 2023 Remi Bernotavicius

use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error as StdError;
use std::path::Path;

pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod validate;

pub use error::{Error, IntegrityKind, Result, ValidationError};

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_connection(
    path: impl AsRef<Path>,
) -> std::result::Result<Connection, Box<dyn StdError + Send + Sync + 'static>> {
    let path = path.as_ref();
    let url = path
        .to_str()
        .ok_or_else(|| format!("database path {path:?} is not valid UTF-8"))?;
    let mut connection = Connection::establish(url)?;

    // Cascading deletes rely on the foreign keys being enforced.
    connection.batch_execute("PRAGMA foreign_keys = ON;")?;

    let applied = connection.run_pending_migrations(MIGRATIONS)?;
    for migration in applied {
        log::info!("applied migration {migration}");
    }
    Ok(connection)
}

#[cfg(test)]
pub fn establish_test_connection() -> Connection {
    establish_connection(":memory:").unwrap()
}

#[test]
fn migrations() {
    let mut conn = establish_test_connection();

    let reverted = conn.revert_all_migrations(MIGRATIONS).unwrap();
    assert_eq!(reverted.len(), 3);
    assert!(conn.has_pending_migration(MIGRATIONS).unwrap());

    let applied = conn.run_pending_migrations(MIGRATIONS).unwrap();
    assert_eq!(applied.len(), 3);
    assert!(!conn.has_pending_migration(MIGRATIONS).unwrap());
}
