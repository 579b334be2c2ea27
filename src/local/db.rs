//! SQLite storage for installed projects and cached API responses.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::models::{CreateInstalled, InstalledProjectRow};

/// Local SQLite database.
#[derive(Clone)]
pub struct LocalDb {
    pool: SqlitePool,
}

impl LocalDb {
    /// Open or create the database at the given path.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open SQLite database")?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS installed_projects (
                id TEXT PRIMARY KEY,
                repository TEXT NOT NULL,
                project_id TEXT NOT NULL,
                version_id TEXT NOT NULL,
                file_name TEXT,
                installed_at TEXT NOT NULL,
                UNIQUE(repository, project_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_cache (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== Installed Projects ====================

    /// Record an installation; reinstalling the same project replaces the row.
    pub async fn insert_installed(&self, input: &CreateInstalled) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO installed_projects (id, repository, project_id, version_id, file_name, installed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(repository, project_id) DO UPDATE SET
                version_id = excluded.version_id,
                file_name = excluded.file_name,
                installed_at = excluded.installed_at
            RETURNING id
            "#,
        )
        .bind(&id)
        .bind(&input.repository)
        .bind(&input.project_id)
        .bind(&input.version_id)
        .bind(&input.file_name)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.get("id"))
    }

    /// List all installed projects, oldest install first.
    pub async fn list_installed(&self) -> Result<Vec<InstalledProjectRow>> {
        let rows = sqlx::query_as::<_, InstalledProjectRow>(
            "SELECT * FROM installed_projects ORDER BY installed_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Find an installed project by repository and upstream project id.
    pub async fn find_installed(
        &self,
        repository: &str,
        project_id: &str,
    ) -> Result<Option<InstalledProjectRow>> {
        let row = sqlx::query_as::<_, InstalledProjectRow>(
            "SELECT * FROM installed_projects WHERE repository = ? AND project_id = ?",
        )
        .bind(repository)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Point an installed row at a new version.
    pub async fn update_installed_version(
        &self,
        id: &str,
        version_id: &str,
        file_name: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE installed_projects SET version_id = ?, file_name = ?, installed_at = ? WHERE id = ?",
        )
        .bind(version_id)
        .bind(file_name)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete an installed row.
    pub async fn remove_installed(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM installed_projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== API Cache ====================
    //
    // These are only called through the repo request context; nothing else
    // writes cached responses.

    /// Read a cached payload and its RFC 3339 store time.
    pub async fn read_cache(&self, key: &str) -> Result<Option<(String, String)>> {
        let row = sqlx::query("SELECT payload, stored_at FROM api_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| (row.get("payload"), row.get("stored_at"))))
    }

    /// Insert or overwrite a cached payload.
    pub async fn write_cache(&self, key: &str, payload: &str, stored_at: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO api_cache (key, payload, stored_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(stored_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop all cached responses. Returns the number of removed rows.
    pub async fn clear_cache(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM api_cache")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> (tempfile::TempDir, LocalDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = LocalDb::open(&dir.path().join("test.db")).await.unwrap();
        (dir, db)
    }

    fn sample_install() -> CreateInstalled {
        CreateInstalled {
            repository: "modrinth".to_string(),
            project_id: "AANobbMI".to_string(),
            version_id: "Yp8wLY1P".to_string(),
            file_name: Some("sodium-fabric-0.5.3.jar".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_installed() {
        let (_dir, db) = test_db().await;

        db.insert_installed(&sample_install()).await.unwrap();
        let rows = db.list_installed().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].repository, "modrinth");
        assert_eq!(rows[0].project_id, "AANobbMI");
        assert_eq!(rows[0].version_id, "Yp8wLY1P");
    }

    #[tokio::test]
    async fn test_reinstall_replaces_row() {
        let (_dir, db) = test_db().await;

        db.insert_installed(&sample_install()).await.unwrap();
        let mut updated = sample_install();
        updated.version_id = "newer".to_string();
        db.insert_installed(&updated).await.unwrap();

        let rows = db.list_installed().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].version_id, "newer");
    }

    #[tokio::test]
    async fn test_find_update_and_remove_installed() {
        let (_dir, db) = test_db().await;

        db.insert_installed(&sample_install()).await.unwrap();
        let row = db
            .find_installed("modrinth", "AANobbMI")
            .await
            .unwrap()
            .unwrap();

        db.update_installed_version(&row.id, "v2", Some("sodium-0.6.jar"))
            .await
            .unwrap();
        let row = db
            .find_installed("modrinth", "AANobbMI")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.version_id, "v2");
        assert_eq!(row.file_name.as_deref(), Some("sodium-0.6.jar"));

        db.remove_installed(&row.id).await.unwrap();
        assert!(db.list_installed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_round_trip_and_clear() {
        let (_dir, db) = test_db().await;

        assert!(db.read_cache("k").await.unwrap().is_none());

        db.write_cache("k", "{\"a\":1}", "2026-01-01T00:00:00Z")
            .await
            .unwrap();
        let (payload, stored_at) = db.read_cache("k").await.unwrap().unwrap();
        assert_eq!(payload, "{\"a\":1}");
        assert_eq!(stored_at, "2026-01-01T00:00:00Z");

        db.write_cache("k", "{\"a\":2}", "2026-01-02T00:00:00Z")
            .await
            .unwrap();
        let (payload, _) = db.read_cache("k").await.unwrap().unwrap();
        assert_eq!(payload, "{\"a\":2}");

        assert_eq!(db.clear_cache().await.unwrap(), 1);
        assert!(db.read_cache("k").await.unwrap().is_none());
    }
}
