//! Image blobs uploaded alongside events and testimonies.
//!
//! Files live under `<uploads_dir>/<entity>/<entity>-<uuid>.<ext>` and are
//! referenced from the database by their public path `/uploads/<entity>/<file>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Image types accepted by both the extension and the declared MIME subtype.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Event,
    Testimony,
}

impl UploadKind {
    pub fn dir(self) -> &'static str {
        match self {
            UploadKind::Event => "events",
            UploadKind::Testimony => "testimonies",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            UploadKind::Event => "event",
            UploadKind::Testimony => "testimony",
        }
    }

    pub fn max_files(self) -> usize {
        match self {
            UploadKind::Event => 10,
            UploadKind::Testimony => crate::domain::MAX_TESTIMONY_IMAGES,
        }
    }
}

/// Checks an uploaded image and returns its lower-cased extension.
pub fn image_extension(file_name: &str, content_type: Option<&str>) -> Result<String> {
    let rejected = || {
        AppError::invalid(
            "images",
            format!("Only image files are allowed ({})", ALLOWED_IMAGE_TYPES.join(", ")),
        )
    };

    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .ok_or_else(rejected)?;
    if !ALLOWED_IMAGE_TYPES.contains(&extension.as_str()) {
        return Err(rejected());
    }

    let subtype = content_type
        .and_then(|mime| mime.split(';').next())
        .and_then(|mime| mime.trim().to_lowercase().strip_prefix("image/").map(str::to_string))
        .ok_or_else(rejected)?;
    if !ALLOWED_IMAGE_TYPES.contains(&subtype.as_str()) {
        return Err(rejected());
    }

    Ok(extension)
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` and returns its public path.
    async fn save(&self, kind: UploadKind, extension: &str, data: &[u8]) -> Result<String>;

    /// Removes a blob by public path. Missing blobs are not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Blob store backed by a directory on local disk.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a public path to a file under the root, refusing anything that escapes it.
    fn resolve(&self, public_path: &str) -> Result<PathBuf> {
        let relative = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| AppError::Storage(format!("Not an upload path: {}", public_path)))?;

        let relative = Path::new(relative);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(AppError::Storage(format!("Invalid upload path: {}", public_path)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, kind: UploadKind, extension: &str, data: &[u8]) -> Result<String> {
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir).await?;

        let file_name = format!("{}-{}.{}", kind.prefix(), Uuid::new_v4(), extension);
        let mut file = fs::File::create(dir.join(&file_name)).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(format!("{}{}/{}", PUBLIC_PREFIX, kind.dir(), file_name))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match fs::remove_file(self.resolve(path)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Deletes blobs best-effort; failures are logged and swallowed.
pub async fn discard_blobs(store: &dyn BlobStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = store.delete(path).await {
            tracing::warn!("Failed to delete blob {}: {}", path, e);
        }
    }
}

/// Passes `result` through, discarding `paths` first when it is an error.
pub async fn discard_on_error<T>(store: &dyn BlobStore, paths: &[String], result: Result<T>) -> Result<T> {
    if result.is_err() {
        discard_blobs(store, paths).await;
    }
    result
}
