use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::extract::{today, ApiJson, ApiQuery};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{
    CreateWorkoutSession, NewExercise, UpdateWorkoutSession, WeekRange, WorkoutSession,
    WorkoutWithExercises,
};
use crate::repositories::{ExerciseRepository, PlanRepository, WorkoutRepository};

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
    pub plan_repo: PlanRepository,
}

// Query params
#[derive(Deserialize)]
pub struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CopySchedule {
    pub source_week_start: NaiveDate,
    pub weeks: u32,
}

#[derive(Serialize)]
pub struct WorkoutListResponse {
    success: bool,
    start: NaiveDate,
    end: NaiveDate,
    workouts: Vec<WorkoutWithExercises>,
}

#[derive(Serialize)]
struct CopyScheduleResponse {
    success: bool,
    message: String,
    sessions: Vec<WorkoutSession>,
}

fn workout_not_found() -> AppError {
    AppError::NotFound("Workout not found".to_string())
}

// Handlers
pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<WorkoutListResponse>> {
    let week = WeekRange::containing(today())?;
    let start = query.start.unwrap_or(week.start);
    let end = query.end.unwrap_or(week.end);
    if start > end {
        return Err(AppError::BadRequest(
            "start must not be after end".to_string(),
        ));
    }

    let workouts = state
        .workout_repo
        .find_in_range(&auth_user.id, start, end)
        .await?;

    Ok(Json(WorkoutListResponse {
        success: true,
        start,
        end,
        workouts,
    }))
}

pub async fn today_workouts(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
) -> Result<Json<WorkoutListResponse>> {
    let date = today();
    let workouts = state
        .workout_repo
        .find_in_range(&auth_user.id, date, date)
        .await?;

    Ok(Json(WorkoutListResponse {
        success: true,
        start: date,
        end: date,
        workouts,
    }))
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<CreateWorkoutSession>,
) -> Result<Response> {
    form.validate().map_err(AppError::Validation)?;

    if let Some(plan_id) = &form.workout_plan_id {
        state
            .plan_repo
            .find_for_user(plan_id, &auth_user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Workout plan not found".to_string()))?;
    }

    let session = form.session();
    let workout = state
        .workout_repo
        .create_with_exercises(&auth_user.id, session, form.exercises)
        .await?;

    tracing::info!(
        "User {} created {} workout {} with {} exercises",
        auth_user.username,
        workout.session.category,
        workout.session.id,
        workout.exercises.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "workout": workout })),
    )
        .into_response())
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let workout = state
        .workout_repo
        .find_with_exercises(&id, &auth_user.id)
        .await?
        .ok_or_else(workout_not_found)?;

    Ok(Json(json!({ "success": true, "workout": workout })).into_response())
}

pub async fn update(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<UpdateWorkoutSession>,
) -> Result<Response> {
    if form.duration_minutes.is_some_and(|d| d < 0) {
        return Err(AppError::Validation(
            "Duration cannot be negative".to_string(),
        ));
    }

    if !state
        .workout_repo
        .update_session(&id, &auth_user.id, form)
        .await?
    {
        return Err(workout_not_found());
    }

    let workout = state
        .workout_repo
        .find_with_exercises(&id, &auth_user.id)
        .await?
        .ok_or_else(workout_not_found)?;

    Ok(Json(json!({ "success": true, "workout": workout })).into_response())
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.workout_repo.delete_session(&id, &auth_user.id).await? {
        return Err(workout_not_found());
    }

    tracing::info!("User {} deleted workout {}", auth_user.username, id);
    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn copy_schedule(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<CopySchedule>,
) -> Result<Response> {
    let source = WeekRange::containing(form.source_week_start)?;
    let sessions = state
        .workout_repo
        .duplicate_schedule(&auth_user.id, source.start, form.weeks)
        .await?;

    let response = CopyScheduleResponse {
        success: true,
        message: format!(
            "Copied {} sessions over {} weeks",
            sessions.len(),
            form.weeks
        ),
        sessions,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

pub async fn add_exercise(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(exercise): ApiJson<NewExercise>,
) -> Result<Response> {
    exercise.validate().map_err(AppError::Validation)?;

    let exercise = state
        .exercise_repo
        .add_to_session(&id, &auth_user.id, exercise)
        .await?
        .ok_or_else(workout_not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "exercise": exercise })),
    )
        .into_response())
}
