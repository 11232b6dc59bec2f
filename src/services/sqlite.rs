//! src/services/sqlite.rs
//!
//! SqliteModel — camera records persisted in SQLite. Each row keeps the
//! attribute bag as a JSON document, the owner id in its own indexed column,
//! and an autoincrement `seq` that fixes listing order and backs page tokens.

use crate::{
    models::camera::{CREATED_BY_ID, Camera, CameraFields, Page, sanitize},
    services::model::{ModelError, ModelResult, decode_page_token, encode_page_token},
};
use sqlx::{
    FromRow, QueryBuilder, SqlitePool,
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr, sync::Arc};
use tracing::{debug, info};
use uuid::Uuid;

const MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(FromRow, Debug)]
struct CameraRow {
    seq: i64,
    id: String,
    fields: String,
}

impl CameraRow {
    fn into_camera(self) -> ModelResult<Camera> {
        let fields: CameraFields = serde_json::from_str(&self.fields)?;
        Ok(Camera::new(self.id, fields))
    }
}

#[derive(Clone)]
pub struct SqliteModel {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SqliteModel {
    /// Wrap an existing pool. The schema must already exist, see `migrate`.
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Open (creating if needed) the database behind `database_url`.
    pub async fn connect(database_url: &str) -> ModelResult<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .trim_start_matches("file:");
        debug!("Interpreted SQLite path => {}", db_path);

        if !db_path.starts_with(":memory:") {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)
                        .map_err(|err| ModelError::Unavailable(err.to_string()))?;
                    info!("Created missing directory {:?}", parent);
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self::new(Arc::new(pool)))
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> ModelResult<()> {
        let statements = MIGRATION
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> ModelResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }

    async fn fetch_row(&self, id: &str) -> ModelResult<CameraRow> {
        sqlx::query_as::<_, CameraRow>("SELECT seq, id, fields FROM cameras WHERE id = ?")
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => ModelError::NotFound(id.to_string()),
                other => ModelError::from(other),
            })
    }

    /// Page through cameras in insertion order, optionally filtered by owner.
    ///
    /// Fetches one row past `limit`; if it exists the last returned row's
    /// sequence number becomes the next page token.
    pub async fn list(
        &self,
        owner_id: Option<&str>,
        limit: usize,
        page_token: Option<&str>,
    ) -> ModelResult<Page> {
        let limit = limit.max(1);
        let fetch_limit = limit + 1;
        let after = page_token.map(decode_page_token).transpose()?;

        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT seq, id, fields FROM cameras WHERE 1 = 1");
        if let Some(owner) = owner_id {
            builder.push(" AND created_by_id = ");
            builder.push_bind(owner);
        }
        if let Some(seq) = after {
            builder.push(" AND seq > ");
            builder.push_bind(seq);
        }
        builder.push(" ORDER BY seq ASC LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut rows: Vec<CameraRow> = builder.build_query_as().fetch_all(&*self.db).await?;

        let mut next_page_token = None;
        if rows.len() == fetch_limit {
            rows.pop();
            next_page_token = rows.last().map(|row| encode_page_token(row.seq));
        }

        let cameras = rows
            .into_iter()
            .map(CameraRow::into_camera)
            .collect::<ModelResult<Vec<_>>>()?;

        Ok(Page {
            cameras,
            next_page_token,
        })
    }

    pub async fn create(&self, data: CameraFields) -> ModelResult<Camera> {
        let fields = sanitize(data);
        let id = Uuid::new_v4().to_string();
        let doc = serde_json::to_string(&fields)?;

        let row = sqlx::query_as::<_, CameraRow>(
            "INSERT INTO cameras (id, created_by_id, fields) VALUES (?, ?, ?)
             RETURNING seq, id, fields",
        )
        .bind(&id)
        .bind(fields.get(CREATED_BY_ID))
        .bind(&doc)
        .fetch_one(&*self.db)
        .await?;

        debug!(id = %row.id, seq = row.seq, "created camera");
        row.into_camera()
    }

    pub async fn read(&self, id: &str) -> ModelResult<Camera> {
        self.fetch_row(id).await?.into_camera()
    }

    /// Merge `data` over the stored document inside one transaction.
    pub async fn update(&self, id: &str, data: CameraFields) -> ModelResult<Camera> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, CameraRow>("SELECT seq, id, fields FROM cameras WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ModelError::NotFound(id.to_string()))?;

        let mut camera = row.into_camera()?;
        camera.fields.extend(sanitize(data));
        let doc = serde_json::to_string(&camera.fields)?;

        sqlx::query("UPDATE cameras SET created_by_id = ?, fields = ? WHERE id = ?")
            .bind(camera.fields.get(CREATED_BY_ID))
            .bind(&doc)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(camera)
    }

    pub async fn delete(&self, id: &str) -> ModelResult<()> {
        let result = sqlx::query("DELETE FROM cameras WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ModelError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
