use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::error::CoreError;

pub use sqlx::SqlitePool as DbPool;

/// Opens the SQLite database at `db_path` and brings its schema up to date.
///
/// The file and its parent directory are created when missing.
pub async fn establish_connection(db_path: &Path) -> Result<SqlitePool, CoreError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    if !db_path.exists() {
        tokio::fs::File::create(db_path).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(SqliteConnectOptions::new().filename(db_path))
        .await
        .map_err(|e| CoreError::StoreUnavailable(format!("cannot open {}: {}", db_path.display(), e)))?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// An in-memory database with the schema applied. Each call is isolated.
pub async fn in_memory() -> Result<SqlitePool, CoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
