// Migration Runner

use crate::error::map_sqlx_error;
use solace_core::error::Result;
use sqlx::SqlitePool;
use tracing::info;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (1, "Job queue", include_str!("../migrations/001_initial_schema.sql")),
    (
        2,
        "Conversations & content",
        include_str!("../migrations/002_conversations_and_content.sql"),
    ),
    (3, "Key-value cache", include_str!("../migrations/003_kv_cache.sql")),
];

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current schema version: {}", current_version);

    for (version, name, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration {:03}: {}", version, name);
            apply_migration(pool, sql).await?;
        }
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    // Statements never contain ';' inside literals
    for statement in sql.split(';') {
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
    }

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        for table in ["jobs", "subjects", "conversations", "topics", "generated_content", "quotes", "kv_cache"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "table {}", table);
        }

        let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, 3);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 3);
    }
}
