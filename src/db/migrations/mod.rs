//! Database schema migrations.
//!
//! Each schema version `NN` has a pair of SQL files in this directory:
//! - `migration_NN_up.sql` brings the schema from `NN-1` to `NN`
//! - `migration_NN_down.sql` takes it back from `NN` to `NN-1`
//!
//! The tables are `STRICT`, so the store itself refuses a quantity or price that is not a number.

use crate::error::Res;
use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// One SQL script to apply and the version recorded once it has been applied.
struct Step {
    sql: &'static str,
    label: String,
    resulting_version: i32,
}

/// Moves the schema from `current_ver` to `target_ver`, up or down. Every step runs in its own
/// transaction together with the `schema_version` update.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Res<()> {
    let steps = plan(current_ver, target_ver)?;
    if steps.is_empty() {
        debug!("Database schema is at version {target_ver}");
        return Ok(());
    }
    for step in steps {
        debug!("Running migration {}", step.label);
        apply(pool, &step).await?;
    }
    debug!("Database schema migrated from version {current_ver} to {target_ver}");
    Ok(())
}

/// Lists the steps needed to go from `current_ver` to `target_ver`. Fails before anything is
/// applied if any migration in between is missing.
fn plan(current_ver: i32, target_ver: i32) -> Res<Vec<Step>> {
    let find = |version: i32| {
        MIGRATIONS.iter().find(|m| m.version == version).with_context(|| {
            format!(
                "Migration {version} is missing but required to migrate from version \
                 {current_ver} to {target_ver}"
            )
        })
    };

    let mut steps = Vec::new();
    if current_ver < target_ver {
        for version in (current_ver + 1)..=target_ver {
            steps.push(Step {
                sql: find(version)?.up_sql,
                label: format!("{version:02} (up)"),
                resulting_version: version,
            });
        }
    } else if current_ver > target_ver {
        if target_ver < 0 {
            bail!("Cannot migrate below schema version 0");
        }
        for version in ((target_ver + 1)..=current_ver).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                label: format!("{version:02} (down)"),
                resulting_version: version - 1,
            });
        }
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: &Step) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    tx.execute(step.sql)
        .await
        .with_context(|| format!("Failed to execute migration {}", step.label))?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.resulting_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    async fn create_test_db() -> (TempDir, SqlitePool) {
        let temp_dir = TempDir::new().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(temp_dir.path().join("test.sqlite"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .unwrap();
        (temp_dir, pool)
    }

    async fn schema_version(pool: &SqlitePool) -> i32 {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .unwrap();
        row.0
    }

    async fn table_exists(pool: &SqlitePool, table_name: &str) -> bool {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .unwrap();
        row.0 > 0
    }

    #[tokio::test]
    async fn test_up_creates_record_tables() {
        let (_temp_dir, pool) = create_test_db().await;
        run(&pool, 0, 1).await.unwrap();

        assert_eq!(schema_version(&pool).await, 1);
        assert!(table_exists(&pool, "egg_production").await);
        assert!(table_exists(&pool, "egg_prices").await);
        assert!(table_exists(&pool, "sales").await);
    }

    #[tokio::test]
    async fn test_down_drops_record_tables() {
        let (_temp_dir, pool) = create_test_db().await;
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 0).await.unwrap();

        assert_eq!(schema_version(&pool).await, 0);
        assert!(!table_exists(&pool, "egg_production").await);
        assert!(!table_exists(&pool, "egg_prices").await);
        assert!(!table_exists(&pool, "sales").await);
    }

    #[tokio::test]
    async fn test_no_op_when_at_target() {
        let (_temp_dir, pool) = create_test_db().await;
        run(&pool, 0, 1).await.unwrap();
        sqlx::query("INSERT INTO sales (date, quantity) VALUES ('2024-01-01', 12)")
            .execute(&pool)
            .await
            .unwrap();

        run(&pool, 1, 1).await.unwrap();

        assert_eq!(schema_version(&pool).await, 1);
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_strict_tables_reject_text_quantity() {
        let (_temp_dir, pool) = create_test_db().await;
        run(&pool, 0, 1).await.unwrap();
        let result = sqlx::query("INSERT INTO sales (date, quantity) VALUES (?, ?)")
            .bind("2024-01-01")
            .bind("a dozen")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_for_valid_range() {
        assert_eq!(plan(0, 1).unwrap().len(), 1);
        assert_eq!(plan(1, 0).unwrap()[0].resulting_version, 0);
        assert!(plan(1, 1).unwrap().is_empty());
    }

    #[test]
    fn test_plan_fails_for_missing_migration() {
        assert!(plan(0, 2).is_err());
        assert!(plan(1, 3).is_err());
    }
}
