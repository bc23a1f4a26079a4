// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use solace_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Create SQLite connection pool with WAL mode and foreign keys on.
///
/// In-memory databases are per connection, so they get a single-connection pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid database URL '{}': {}", database_url, e)))?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 10 });
    if in_memory {
        // Dropping the only connection would drop the database
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options.connect_with(options).await.map_err(map_sqlx_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        tokio_test::assert_ok!(pool.acquire().await);
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_one_database() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (x INTEGER)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO t VALUES (1)").execute(&pool).await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t").fetch_one(&pool).await.unwrap();
        assert_eq!(n, 1);
    }
}
