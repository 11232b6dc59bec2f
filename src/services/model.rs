//! CameraModel — the storage contract every backend satisfies.
//!
//! One variant per concrete backend. The variant is chosen once at startup
//! from `DataBackend` and never changes for the lifetime of the process.

use crate::{
    config::DataBackend,
    models::camera::{Camera, CameraFields, Page},
    services::{memory::MemoryModel, sqlite::SqliteModel},
};
use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("camera `{0}` not found")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid page token `{0}`")]
    InvalidPageToken(String),
    #[error(transparent)]
    Sqlx(sqlx::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ModelError::Unavailable(err.to_string())
            }
            other => ModelError::Sqlx(other),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// The active storage backend.
#[derive(Clone)]
pub enum CameraModel {
    Memory(MemoryModel),
    Sqlite(SqliteModel),
}

impl CameraModel {
    /// Build the backend selected by configuration. SQLite databases get the
    /// schema applied before the model is handed out.
    pub async fn connect(backend: DataBackend, database_url: &str) -> ModelResult<Self> {
        match backend {
            DataBackend::Memory => Ok(Self::Memory(MemoryModel::new())),
            DataBackend::Sqlite => {
                let model = SqliteModel::connect(database_url).await?;
                model.migrate().await?;
                Ok(Self::Sqlite(model))
            }
        }
    }

    pub fn backend(&self) -> DataBackend {
        match self {
            Self::Memory(_) => DataBackend::Memory,
            Self::Sqlite(_) => DataBackend::Sqlite,
        }
    }

    /// Return at most `limit` cameras after the position encoded in `page_token`.
    pub async fn list(&self, limit: usize, page_token: Option<&str>) -> ModelResult<Page> {
        debug!(limit, ?page_token, "list cameras");
        match self {
            Self::Memory(m) => m.list(None, limit, page_token).await,
            Self::Sqlite(m) => m.list(None, limit, page_token).await,
        }
    }

    /// Same as `list`, restricted to cameras whose `createdById` is `owner_id`.
    pub async fn list_by(
        &self,
        owner_id: &str,
        limit: usize,
        page_token: Option<&str>,
    ) -> ModelResult<Page> {
        debug!(owner_id, limit, ?page_token, "list cameras by owner");
        match self {
            Self::Memory(m) => m.list(Some(owner_id), limit, page_token).await,
            Self::Sqlite(m) => m.list(Some(owner_id), limit, page_token).await,
        }
    }

    pub async fn create(&self, data: CameraFields) -> ModelResult<Camera> {
        match self {
            Self::Memory(m) => m.create(data).await,
            Self::Sqlite(m) => m.create(data).await,
        }
    }

    pub async fn read(&self, id: &str) -> ModelResult<Camera> {
        match self {
            Self::Memory(m) => m.read(id).await,
            Self::Sqlite(m) => m.read(id).await,
        }
    }

    /// Merge `data` over the stored fields of `id`.
    pub async fn update(&self, id: &str, data: CameraFields) -> ModelResult<Camera> {
        match self {
            Self::Memory(m) => m.update(id, data).await,
            Self::Sqlite(m) => m.update(id, data).await,
        }
    }

    pub async fn delete(&self, id: &str) -> ModelResult<()> {
        match self {
            Self::Memory(m) => m.delete(id).await,
            Self::Sqlite(m) => m.delete(id).await,
        }
    }

    /// Cheap connectivity check used by the readiness probe.
    pub async fn ping(&self) -> ModelResult<()> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Sqlite(m) => m.ping().await,
        }
    }
}

/// Encode the sequence number of the last returned record as an opaque cursor.
pub(crate) fn encode_page_token(seq: i64) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(seq.to_string())
}

/// Decode a cursor produced by `encode_page_token`.
pub(crate) fn decode_page_token(token: &str) -> ModelResult<i64> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| ModelError::InvalidPageToken(token.to_string()))
}
