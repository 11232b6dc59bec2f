//! ImageStore — turns an uploaded image into a public URL.
//!
//! The local store writes payloads beneath
//! `base_path/{shard}/{shard}/{millis}-{uuid}-{stem}.{ext}` and serves them back
//! through `GET /images/{*key}`. The extension always comes from the accepted
//! MIME type, never from the client's file name. The disabled store accepts
//! nothing and returns no URL.

use bytes::Bytes;
use chrono::Utc;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info};
use uuid::Uuid;

const MAX_KEY_LEN: usize = 1024;

/// A file part received with a camera submission.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Original filename as sent by the browser.
    pub file_name: String,

    /// Declared MIME type of the part.
    pub content_type: Option<String>,

    /// Raw payload.
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported image type `{0}`")]
    UnsupportedType(String),
    #[error("image `{0}` not found")]
    NotFound(String),
    #[error("invalid image key")]
    InvalidKey,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Clone, Debug)]
pub enum ImageStore {
    Disabled,
    Local(LocalImageStore),
}

#[derive(Clone, Debug)]
pub struct LocalImageStore {
    /// Directory holding the image payloads.
    pub base_path: PathBuf,

    /// Prefix prepended to keys to build public URLs.
    pub public_base_url: String,
}

impl ImageStore {
    pub fn local(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self::Local(LocalImageStore {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Store `image` and return its public URL.
    ///
    /// Returns `Ok(None)` when no image accompanies the request or the store
    /// is disabled.
    pub async fn upload(&self, image: Option<&UploadedImage>) -> UploadResult<Option<String>> {
        match (self, image) {
            (Self::Local(store), Some(image)) => store.upload(image).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Open a stored image for streaming, with its guessed content type.
    pub async fn open(&self, key: &str) -> UploadResult<(File, String)> {
        match self {
            Self::Local(store) => store.open(key).await,
            Self::Disabled => Err(UploadError::NotFound(key.to_string())),
        }
    }

    /// Write/read/delete probe for the readiness check. `None` when disabled.
    pub async fn check(&self) -> Option<UploadResult<()>> {
        match self {
            Self::Local(store) => Some(store.check().await),
            Self::Disabled => None,
        }
    }
}

impl LocalImageStore {
    async fn upload(&self, image: &UploadedImage) -> UploadResult<String> {
        let content_type = image
            .content_type
            .clone()
            .unwrap_or_else(|| {
                mime_guess::from_path(&image.file_name)
                    .first_or_octet_stream()
                    .to_string()
            });
        let extension = image_extension(&content_type)?;

        let name = format!(
            "{}-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            file_stem(&image.file_name),
            extension
        );
        let (shard_a, shard_b) = shards(&name);
        let key = format!("{}/{}/{}", shard_a, shard_b, name);

        let dir = self.base_path.join(&shard_a).join(&shard_b);
        fs::create_dir_all(&dir).await?;
        let final_path = dir.join(&name);
        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));

        if let Err(err) = write_synced(&tmp_path, &image.data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(UploadError::Io(err));
        }
        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(UploadError::Io(err));
        }

        info!(key = %key, bytes = image.data.len(), "stored uploaded image");
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn open(&self, key: &str) -> UploadResult<(File, String)> {
        ensure_key_safe(key)?;
        let path = self.base_path.join(key);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                UploadError::NotFound(key.to_string())
            } else {
                UploadError::Io(err)
            }
        })?;
        let content_type = match mime_guess::from_path(&path).first() {
            Some(mime) if is_servable_image(mime.essence_str()) => mime.to_string(),
            _ => "application/octet-stream".to_string(),
        };
        Ok((file, content_type))
    }

    async fn check(&self) -> UploadResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz").await?;
        let bytes = fs::read(&tmp_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        if bytes? != b"readyz" {
            return Err(UploadError::Io(io::Error::new(
                ErrorKind::Other,
                "file content mismatch",
            )));
        }
        debug!("image directory {} is writable", self.base_path.display());
        Ok(())
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Two-level shard directories from the md5 of the stored name.
fn shards(name: &str) -> (String, String) {
    let digest = md5::compute(name);
    (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
}

/// Raster image types only; SVG can carry script.
fn is_servable_image(essence: &str) -> bool {
    essence.starts_with("image/") && essence != "image/svg+xml"
}

/// Validate a declared MIME type and pick the extension the file is stored under.
fn image_extension(content_type: &str) -> UploadResult<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !is_servable_image(&essence) {
        return Err(UploadError::UnsupportedType(content_type.to_string()));
    }
    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| {
            exts.iter()
                .copied()
                .find(|ext| mime_guess::from_ext(ext).first_raw() == Some(essence.as_str()))
        })
        .ok_or_else(|| UploadError::UnsupportedType(content_type.to_string()))
}

/// Sanitized client file name without its extension.
fn file_stem(name: &str) -> String {
    let cleaned = sanitize_file_name(name);
    match cleaned.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => cleaned,
    }
}

/// Keep the last path segment and replace anything outside `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Rejects keys that could escape the image directory.
fn ensure_key_safe(key: &str) -> UploadResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(UploadError::InvalidKey);
    }
    if key.starts_with('/') || key.contains("..") {
        return Err(UploadError::InvalidKey);
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(UploadError::InvalidKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(b"\x89PNG fake"),
        }
    }

    #[tokio::test]
    async fn local_upload_returns_public_url_and_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images/");

        let url = store
            .upload(Some(&png("my camera.png")))
            .await
            .unwrap()
            .unwrap();
        assert!(url.starts_with("/images/"));
        assert!(url.ends_with("-my_camera.png"));

        let key = url.trim_start_matches("/images/");
        let (_file, content_type) = store.open(key).await.unwrap();
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn disabled_store_and_missing_image_yield_no_url() {
        assert_eq!(
            ImageStore::Disabled.upload(Some(&png("a.png"))).await.unwrap(),
            None
        );

        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        assert_eq!(store.upload(None).await.unwrap(), None);
        assert!(ImageStore::Disabled.check().await.is_none());
    }

    #[tokio::test]
    async fn non_image_uploads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        let doc = UploadedImage {
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            data: Bytes::from_static(b"hello"),
        };
        assert!(matches!(
            store.upload(Some(&doc)).await,
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn stored_extension_follows_declared_type_not_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        let disguised = UploadedImage {
            file_name: "x.html".to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(b"<script>alert(1)</script>"),
        };

        let url = store.upload(Some(&disguised)).await.unwrap().unwrap();
        assert!(url.ends_with("-x.png"), "unexpected url {}", url);

        let (_file, content_type) = store.open(url.trim_start_matches("/images/")).await.unwrap();
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn svg_uploads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        let svg = UploadedImage {
            file_name: "logo.svg".to_string(),
            content_type: Some("image/svg+xml".to_string()),
            data: Bytes::from_static(b"<svg onload=\"alert(1)\"/>"),
        };
        assert!(matches!(
            store.upload(Some(&svg)).await,
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn same_name_in_the_same_millisecond_gets_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        let first = store.upload(Some(&png("a.png"))).await.unwrap().unwrap();
        let second = store.upload(Some(&png("a.png"))).await.unwrap().unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn non_image_files_on_disk_are_served_as_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("aa/bb")).unwrap();
        std::fs::write(dir.path().join("aa/bb/page.html"), "<p>hi</p>").unwrap();
        let store = ImageStore::local(dir.path(), "/images");

        let (_file, content_type) = store.open("aa/bb/page.html").await.unwrap();
        assert_eq!(content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn traversal_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path(), "/images");
        assert!(matches!(
            store.open("../etc/passwd").await,
            Err(UploadError::InvalidKey)
        ));
        assert!(matches!(
            store.open("aa/bb/missing.png").await,
            Err(UploadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn readiness_probe_passes_on_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::local(dir.path().join("nested"), "/images");
        assert!(matches!(store.check().await, Some(Ok(()))));
    }

    #[test]
    fn file_names_are_flattened() {
        assert_eq!(sanitize_file_name("../../x y.jpg"), "x_y.jpg");
        assert_eq!(sanitize_file_name("C:\\pics\\a.png"), "a.png");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(file_stem("holiday.photo.JPG"), "holiday.photo");
        assert_eq!(file_stem(".png"), "png");
        assert_eq!(image_extension("image/png; charset=binary").unwrap(), "png");
        assert!(image_extension("text/html").is_err());
    }
}
