// SPDX-License-Identifier: Apache-2.0

use crate::{StoreError, WineCatalog};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::instrument;
use vinoteca_model::WineRecord;

#[derive(Debug, Clone)]
pub struct SqliteCatalogConfig {
    pub db_path: PathBuf,
    /// Upper bound on concurrent read connections.
    pub max_connections: usize,
    pub sql_timeout: Duration,
}

impl Default for SqliteCatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("wine_data.db"),
            max_connections: 8,
            sql_timeout: Duration::from_secs(3),
        }
    }
}

const WINE_COLUMNS: &str = "id, name, category_1, category_2, origin, description";

/// Read-only catalog over the `wine_descriptions` table. Random-row
/// selection is pushed down to SQLite (`ORDER BY RANDOM() LIMIT 1`) rather
/// than materializing the table in process.
#[derive(Debug)]
pub struct SqliteCatalog {
    cfg: SqliteCatalogConfig,
    pool: Arc<Semaphore>,
}

impl SqliteCatalog {
    pub fn open(cfg: SqliteCatalogConfig) -> Result<Self, StoreError> {
        if !cfg.db_path.is_file() {
            return Err(StoreError(format!(
                "catalog database missing: {}",
                cfg.db_path.display()
            )));
        }
        let pool = Arc::new(Semaphore::new(cfg.max_connections.max(1)));
        Ok(Self { cfg, pool })
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let _permit = self
            .pool
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        let path = self.cfg.db_path.clone();
        let run = timeout(
            self.cfg.sql_timeout,
            tokio::task::spawn_blocking(move || {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.execute_batch("PRAGMA query_only=ON; PRAGMA temp_store=MEMORY;")?;
                op(&conn)
            }),
        )
        .await;
        match run {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(StoreError(format!("catalog query failed: {e}"))),
            Ok(Err(e)) => Err(StoreError(format!("catalog worker failed: {e}"))),
            Err(_) => Err(StoreError("catalog query timed out".to_string())),
        }
    }
}

fn row_to_wine(row: &rusqlite::Row<'_>) -> Result<WineRecord, rusqlite::Error> {
    Ok(WineRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category_1: row.get(2)?,
        category_2: row.get(3)?,
        origin: row.get(4)?,
        description: row.get(5)?,
    })
}

#[async_trait]
impl WineCatalog for SqliteCatalog {
    fn catalog_tag(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(name = "catalog_random_in_category", skip(self))]
    async fn random_in_category(&self, category: &str) -> Result<Option<WineRecord>, StoreError> {
        let category = category.to_string();
        self.with_connection(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {WINE_COLUMNS} FROM wine_descriptions \
                     WHERE category_2 = ?1 ORDER BY RANDOM() LIMIT 1"
                ),
                [category.as_str()],
                row_to_wine,
            )
            .optional()
        })
        .await
    }

    #[instrument(name = "catalog_random_any", skip(self))]
    async fn random_any(&self) -> Result<Option<WineRecord>, StoreError> {
        self.with_connection(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {WINE_COLUMNS} FROM wine_descriptions ORDER BY RANDOM() LIMIT 1"
                ),
                [],
                row_to_wine,
            )
            .optional()
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinoteca_model::CategoryMap;

    fn fixture_db(rows: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wine_data.db");
        let conn = Connection::open(&path).expect("open sqlite");
        conn.execute_batch(
            "CREATE TABLE wine_descriptions (
                 id TEXT PRIMARY KEY,
                 name TEXT,
                 category_1 TEXT,
                 category_2 TEXT,
                 origin TEXT,
                 description TEXT
             );
             CREATE INDEX idx_category_2 ON wine_descriptions(category_2);",
        )
        .expect("create schema");
        for (ix, (name, category)) in rows.iter().enumerate() {
            conn.execute(
                "INSERT INTO wine_descriptions (id, name, category_1, category_2, origin, description)
                 VALUES (?1, ?2, 'Red', ?3, 'Chile', 'A test pour.')",
                rusqlite::params![format!("w{ix}"), name, category],
            )
            .expect("insert row");
        }
        (dir, path)
    }

    fn catalog_at(path: PathBuf) -> SqliteCatalog {
        SqliteCatalog::open(SqliteCatalogConfig {
            db_path: path,
            ..SqliteCatalogConfig::default()
        })
        .expect("open catalog")
    }

    #[tokio::test]
    async fn category_query_returns_a_matching_row() {
        let cabernet = CategoryMap::lookup(2).expect("code 2");
        let (_dir, path) = fixture_db(&[("Test Wine", cabernet), ("Other", "Merlot")]);
        let catalog = catalog_at(path);
        let wine = catalog
            .random_in_category(cabernet)
            .await
            .expect("query")
            .expect("row present");
        assert_eq!(wine.name, "Test Wine");
        assert_eq!(wine.category_2, cabernet);
    }

    #[tokio::test]
    async fn category_query_returns_none_when_no_row_matches() {
        let (_dir, path) = fixture_db(&[("Other", "Merlot")]);
        let catalog = catalog_at(path);
        let wine = catalog
            .random_in_category("Cabernet Sauvignon")
            .await
            .expect("query");
        assert_eq!(wine, None);
    }

    #[tokio::test]
    async fn random_any_covers_the_whole_table_and_empty_tables() {
        let (_dir, path) = fixture_db(&[("Only Wine", "Riesling")]);
        let catalog = catalog_at(path);
        let wine = catalog.random_any().await.expect("query").expect("row");
        assert_eq!(wine.name, "Only Wine");

        let (_dir2, empty_path) = fixture_db(&[]);
        let empty = catalog_at(empty_path);
        assert_eq!(empty.random_any().await.expect("query"), None);
    }

    #[tokio::test]
    async fn ping_runs_a_noop_query() {
        let (_dir, path) = fixture_db(&[]);
        let catalog = catalog_at(path);
        catalog.ping().await.expect("ping");
    }

    #[test]
    fn open_rejects_a_missing_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SqliteCatalog::open(SqliteCatalogConfig {
            db_path: dir.path().join("nope.db"),
            ..SqliteCatalogConfig::default()
        })
        .expect_err("missing file");
        assert!(err.0.contains("catalog database missing"));
    }
}
