//! Upload storage for catalog images.
//!
//! Files land in `{root}/{Kind}/{uuid}.{ext}` and records keep the public
//! relative path `Uploads/{Kind}/{uuid}.{ext}`, served statically under `/Uploads`.

use std::path::{Component, Path, PathBuf};

use common::data_url::{image_extension, mime_from_file_name};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::domain::ImageUpload;
use crate::errors::{ServiceError, UploadError};

pub const PUBLIC_PREFIX: &str = "Uploads";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Category,
    SubCategory,
    Product,
}

impl ImageKind {
    pub fn dir(self) -> &'static str {
        match self {
            ImageKind::Category => "Category",
            ImageKind::SubCategory => "SubCategory",
            ImageKind::Product => "Product",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub async fn new<P: Into<PathBuf>>(root: P, max_bytes: usize) -> Result<Self, ServiceError> {
        let root = root.into();
        for kind in [ImageKind::Category, ImageKind::SubCategory, ImageKind::Product] {
            fs::create_dir_all(root.join(kind.dir())).await.map_err(ServiceError::storage)?;
        }
        Ok(Self { root, max_bytes })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn max_bytes(&self) -> usize { self.max_bytes }

    /// Check size and type without writing anything.
    pub fn check(&self, upload: &ImageUpload) -> Result<&'static str, UploadError> {
        if upload.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge { size: upload.bytes.len(), limit: self.max_bytes });
        }
        let mime = upload
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .or_else(|| upload.file_name.as_deref().and_then(mime_from_file_name))
            .unwrap_or("application/octet-stream");
        image_extension(mime).ok_or_else(|| UploadError::UnsupportedType(mime.to_string()))
    }

    /// Write the upload and return its public relative path.
    pub async fn save(&self, kind: ImageKind, upload: &ImageUpload) -> Result<String, ServiceError> {
        let ext = self.check(upload)?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());
        let target = self.root.join(kind.dir()).join(&file_name);
        fs::write(&target, &upload.bytes).await.map_err(ServiceError::storage)?;
        debug!(path = %target.display(), bytes = upload.bytes.len(), "image stored");
        Ok(format!("{PUBLIC_PREFIX}/{}/{file_name}", kind.dir()))
    }

    /// Best-effort removal of a previously stored image; failures are logged only.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            debug!(path = public_path, "not a stored upload, skipping removal");
            return;
        };
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove old image");
            }
        }
    }

    /// Map `Uploads/Kind/file.ext` back onto disk; rejects anything escaping the root.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let rel = public_path.trim_start_matches('/').strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
        let rel = Path::new(rel);
        if rel.as_os_str().is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(len: usize) -> ImageUpload {
        ImageUpload { file_name: Some("cake.png".into()), content_type: Some("image/png".into()), bytes: vec![7; len] }
    }

    #[tokio::test]
    async fn saves_under_kind_directory_and_removes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::new(dir.path(), 1024).await?;
        let public = store.save(ImageKind::Category, &png(10)).await?;
        assert!(public.starts_with("Uploads/Category/"));
        assert!(public.ends_with(".png"));

        let on_disk = dir.path().join(public.trim_start_matches("Uploads/"));
        assert_eq!(tokio::fs::read(&on_disk).await?.len(), 10);

        store.remove(&public).await;
        assert!(!on_disk.exists());
        Ok(())
    }

    #[tokio::test]
    async fn rejects_large_empty_and_non_images() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::new(dir.path(), 8).await?;
        assert_eq!(store.check(&png(9)), Err(UploadError::TooLarge { size: 9, limit: 8 }));
        assert_eq!(store.check(&png(0)), Err(UploadError::Empty));

        let text = ImageUpload { file_name: Some("notes.txt".into()), content_type: Some("text/plain".into()), bytes: vec![1] };
        assert_eq!(store.check(&text), Err(UploadError::UnsupportedType("text/plain".into())));

        let guessed = ImageUpload { file_name: Some("photo.JPEG".into()), content_type: None, bytes: vec![1] };
        assert_eq!(store.check(&guessed), Ok("jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn remove_ignores_paths_outside_root() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::new(dir.path().join("Uploads"), 8).await?;
        let outside = dir.path().join("keep.txt");
        tokio::fs::write(&outside, b"x").await?;
        store.remove("Uploads/../keep.txt").await;
        store.remove("http://cdn.example.com/a.png").await;
        assert!(outside.exists());
        Ok(())
    }
}
