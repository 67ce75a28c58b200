use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Result};
use crate::storage::{content_type_for, Bucket, Storage};

/// Public object download. Object names are unguessable.
pub async fn serve_object(
    State(storage): State<Storage>,
    Path((bucket, name)): Path<(String, String)>,
) -> Result<Response> {
    let not_found = || AppError::NotFound("Object not found".to_string());
    let bucket = Bucket::parse(&bucket).ok_or_else(not_found)?;
    let bytes = storage.get(bucket, &name).await?.ok_or_else(not_found)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&name)),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}
