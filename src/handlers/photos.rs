use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::extract::{ApiJson, ApiQuery, WeekQuery};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ProgressPhoto, UploadPhotos, WeekRange};
use crate::repositories::PhotoRepository;
use crate::storage::{decode_upload, extension_for, Bucket, Storage};

#[derive(Clone)]
pub struct PhotosState {
    pub photo_repo: PhotoRepository,
    pub storage: Storage,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    photos: Vec<ProgressPhoto>,
    message: String,
}

pub async fn list(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<Response> {
    let week = query.week()?;
    let photos = state
        .photo_repo
        .find_for_week(&auth_user.id, week.start)
        .await?;

    Ok(Json(json!({
        "success": true,
        "week_start_date": week.start,
        "photos": photos,
    }))
    .into_response())
}

/// Store every uploaded image, then record one row per image.
pub async fn upload(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<UploadPhotos>,
) -> Result<Response> {
    if form.photos.is_empty() {
        return Err(AppError::Validation("No photos provided".to_string()));
    }

    let week = WeekRange::containing(form.week_start_date)?.start;
    let notes = form
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    // Decode everything first so a bad file stores nothing.
    let decoded = form
        .photos
        .iter()
        .map(|photo| decode_upload(&photo.data))
        .collect::<Result<Vec<_>>>()?;

    let mut uploads = Vec::with_capacity(decoded.len());
    for (i, file) in decoded.iter().enumerate() {
        let name = Storage::object_name(
            &format!("progress_{}_{}_{}", auth_user.id, week, i + 1),
            extension_for(file.mime_type.as_deref()),
        );
        let url = match state
            .storage
            .put(Bucket::ProgressPhotos, &name, &file.bytes)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                discard(&state.storage, &uploads).await;
                return Err(e);
            }
        };
        let note = notes
            .map(str::to_string)
            .unwrap_or_else(|| format!("Progress photo {}", i + 1));
        uploads.push((url, note));
    }

    let photos = match state
        .photo_repo
        .create_many(&auth_user.id, week, uploads.clone())
        .await
    {
        Ok(photos) => photos,
        Err(e) => {
            discard(&state.storage, &uploads).await;
            return Err(e);
        }
    };

    tracing::info!(
        "User {} uploaded {} progress photos for week {}",
        auth_user.username,
        photos.len(),
        week
    );

    let response = UploadResponse {
        success: true,
        message: format!("Successfully uploaded {} progress photo(s)", photos.len()),
        photos,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

async fn discard(storage: &Storage, uploads: &[(String, String)]) {
    for (url, _) in uploads {
        storage.delete_by_url(Bucket::ProgressPhotos, url).await;
    }
}

pub async fn delete_one(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let photo = state
        .photo_repo
        .delete(&id, &auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    state
        .storage
        .delete_by_url(Bucket::ProgressPhotos, &photo.photo_url)
        .await;

    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn delete_week(
    State(state): State<PhotosState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<Response> {
    let week = query.required_week()?;
    let photos = state
        .photo_repo
        .delete_for_week(&auth_user.id, week.start)
        .await?;

    for photo in &photos {
        state
            .storage
            .delete_by_url(Bucket::ProgressPhotos, &photo.photo_url)
            .await;
    }

    Ok(Json(json!({ "success": true, "deleted": photos.len() })).into_response())
}
