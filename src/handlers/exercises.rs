use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::extract::ApiJson;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ReplaceExerciseSets, UpdateExercise};
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
}

fn exercise_not_found() -> AppError {
    AppError::NotFound("Exercise not found".to_string())
}

pub async fn update(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<UpdateExercise>,
) -> Result<Response> {
    form.validate().map_err(AppError::Validation)?;

    let exercise = state
        .exercise_repo
        .update(&id, &auth_user.id, form)
        .await?
        .ok_or_else(exercise_not_found)?;

    Ok(Json(json!({ "success": true, "exercise": exercise })).into_response())
}

/// Sets are removed with the exercise by `ON DELETE CASCADE`.
pub async fn delete(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.exercise_repo.delete(&id, &auth_user.id).await? {
        return Err(exercise_not_found());
    }

    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn get_sets(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let sets = state
        .exercise_repo
        .find_sets(&id, &auth_user.id)
        .await?
        .ok_or_else(exercise_not_found)?;

    Ok(Json(json!({ "success": true, "sets": sets })).into_response())
}

pub async fn replace_sets(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<ReplaceExerciseSets>,
) -> Result<Response> {
    let mut seen = HashSet::new();
    for set in &form.sets {
        set.validate().map_err(AppError::Validation)?;
        if !seen.insert(set.set_number) {
            return Err(AppError::Validation(format!(
                "Set {} appears more than once",
                set.set_number
            )));
        }
    }

    let sets = state
        .exercise_repo
        .replace_sets(&id, &auth_user.id, form.sets)
        .await?
        .ok_or_else(exercise_not_found)?;

    Ok(Json(json!({ "success": true, "sets": sets })).into_response())
}
