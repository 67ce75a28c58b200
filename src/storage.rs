//! Local object storage for uploaded photos and plan PDFs.
//!
//! Objects live at `{root}/{bucket}/{name}` and are served back under
//! `{public_base_url}/storage/{bucket}/{name}`.

use std::io::ErrorKind;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    ProgressPhotos,
    WorkoutPlans,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::ProgressPhotos, Bucket::WorkoutPlans];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::ProgressPhotos => "progress-photos",
            Bucket::WorkoutPlans => "workout-plans",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

/// Bytes decoded from an upload, with the MIME type when a `data:` URI named one.
#[derive(Debug)]
pub struct DecodedUpload {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Accepts `data:<mime>;base64,<payload>` or a bare base64 payload.
pub fn decode_upload(data: &str) -> Result<DecodedUpload> {
    let data = data.trim();
    let (mime_type, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::BadRequest("Malformed data URI".to_string()))?;
            let mime = header.trim_end_matches(";base64");
            (
                (!mime.is_empty()).then(|| mime.to_string()),
                payload,
            )
        }
        None => (None, data),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Upload is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Upload is empty".to_string()));
    }

    Ok(DecodedUpload { bytes, mime_type })
}

pub fn extension_for(mime_type: Option<&str>) -> &'static str {
    match mime_type {
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some("application/pdf") => "pdf",
        _ => "png",
    }
}

pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Object names are single path components generated by the server.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(AppError::BadRequest("Invalid object name".to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
    public_base_url: String,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn ensure_buckets(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            tokio::fs::create_dir_all(self.root.join(bucket.as_str())).await?;
        }
        Ok(())
    }

    /// A fresh, unique object name such as `progress_<user>_<week>_<n>_<uuid>.png`.
    pub fn object_name(prefix: &str, extension: &str) -> String {
        format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension)
    }

    pub fn public_url(&self, bucket: Bucket, name: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url,
            bucket.as_str(),
            name
        )
    }

    /// Inverse of [`Storage::public_url`]; `None` for URLs outside the bucket.
    pub fn object_name_from_url(&self, bucket: Bucket, url: &str) -> Option<String> {
        let marker = format!("/storage/{}/", bucket.as_str());
        let (_, name) = url.rsplit_once(&marker)?;
        validate_name(name).ok()?;
        Some(name.to_string())
    }

    /// Store `bytes` and return the object's public URL.
    pub async fn put(&self, bucket: Bucket, name: &str, bytes: &[u8]) -> Result<String> {
        validate_name(name)?;
        let dir = self.root.join(bucket.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), bytes).await?;
        tracing::debug!("Stored {} bytes in {}/{}", bytes.len(), bucket.as_str(), name);
        Ok(self.public_url(bucket, name))
    }

    pub async fn get(&self, bucket: Bucket, name: &str) -> Result<Option<Vec<u8>>> {
        validate_name(name)?;
        match tokio::fs::read(self.root.join(bucket.as_str()).join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, bucket: Bucket, name: &str) -> Result<bool> {
        validate_name(name)?;
        match tokio::fs::remove_file(self.root.join(bucket.as_str()).join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the object behind a stored public URL, logging rather than
    /// failing when it cannot be removed.
    pub async fn delete_by_url(&self, bucket: Bucket, url: &str) {
        let Some(name) = self.object_name_from_url(bucket, url) else {
            tracing::warn!("Not a {} object URL: {}", bucket.as_str(), url);
            return;
        };
        if let Err(e) = self.delete(bucket, &name).await {
            tracing::warn!("Failed to delete {}/{}: {}", bucket.as_str(), name, e);
        }
    }
}
