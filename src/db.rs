//! SQLite connection management.
//!
//! The database file and its parent directories are created automatically.
//! The `sqlite-vec` extension is compiled into the binary and registered as a
//! SQLite auto-extension before the first connection opens, so every
//! connection sees `vec0`, `vec_distance_cosine` and friends.
//!
//! # Connection Pool
//!
//! The server handles one request at a time, so the pool is capped at a
//! single long-lived connection that the store reuses for every query.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Once;

use crate::config::Config;

static VEC_EXTENSION: Once = Once::new();

/// Register `sqlite-vec` with every SQLite connection opened afterwards.
///
/// Idempotent; [`connect_path`] calls it before opening the pool.
pub fn register_vector_extension() {
    VEC_EXTENSION.call_once(|| unsafe {
        #[allow(clippy::missing_transmute_annotations)]
        libsqlite3_sys::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

/// Open the database configured in `[db].path`.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    connect_path(&config.db.path).await
}

/// Open (creating if missing) the SQLite database at `db_path`.
pub async fn connect_path(db_path: &Path) -> Result<SqlitePool> {
    register_vector_extension();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}
