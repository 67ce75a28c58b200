use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::extract::ApiJson;
use crate::error::{AppError, Result};
use crate::import::import_plan_workouts;
use crate::llm::LlmClient;
use crate::middleware::AuthUser;
use crate::models::UploadPlan;
use crate::repositories::{PlanRepository, WorkoutRepository};
use crate::storage::{decode_upload, Bucket, Storage};

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Clone)]
pub struct PlansState {
    pub plan_repo: PlanRepository,
    pub workout_repo: WorkoutRepository,
    pub storage: Storage,
    pub llm: LlmClient,
}

fn plan_not_found() -> AppError {
    AppError::NotFound("Workout plan not found".to_string())
}

pub async fn list(State(state): State<PlansState>, auth_user: AuthUser) -> Result<Response> {
    let plans = state.plan_repo.find_by_user(&auth_user.id).await?;
    Ok(Json(json!({ "success": true, "plans": plans })).into_response())
}

pub async fn upload(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<UploadPlan>,
) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Plan name is required".to_string()));
    }

    let file = decode_upload(&form.file)?;
    let declared_pdf = file.mime_type.as_deref() == Some("application/pdf");
    if !(declared_pdf || file.bytes.starts_with(PDF_MAGIC)) {
        return Err(AppError::BadRequest(
            "Only PDF files are supported".to_string(),
        ));
    }

    let name = Storage::object_name(&format!("plan_{}", auth_user.id), "pdf");
    let url = state
        .storage
        .put(Bucket::WorkoutPlans, &name, &file.bytes)
        .await?;

    let plan = match state.plan_repo.create(&auth_user.id, &form.name, &url).await {
        Ok(plan) => plan,
        Err(e) => {
            state.storage.delete_by_url(Bucket::WorkoutPlans, &url).await;
            return Err(e);
        }
    };

    tracing::info!("User {} uploaded plan {}", auth_user.username, plan.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "plan": plan })),
    )
        .into_response())
}

/// Workouts created from the plan stay, with their plan link cleared.
pub async fn delete(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let plan = state
        .plan_repo
        .delete(&id, &auth_user.id)
        .await?
        .ok_or_else(plan_not_found)?;

    if let Some(url) = &plan.file_url {
        state.storage.delete_by_url(Bucket::WorkoutPlans, url).await;
    }

    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn parse(
    State(state): State<PlansState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let plan = state
        .plan_repo
        .find_for_user(&id, &auth_user.id)
        .await?
        .ok_or_else(plan_not_found)?;

    let outcome = import_plan_workouts(
        &state.llm,
        &state.workout_repo,
        &state.storage,
        &auth_user.id,
        &plan,
    )
    .await?;

    Ok(Json(outcome).into_response())
}
