//! Public, token-addressed views of a shared weekly report. No login.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::extract::{ApiForm, ApiJson};
use crate::error::{AppError, Result};
use crate::models::{
    CreateComment, ProgressPhoto, ReportComment, SharedReport, WeekRange, WeeklyReport,
    WeeklyStats, WorkoutWithExercises,
};
use crate::repositories::{ReportRepository, UserRepository};

#[derive(Clone)]
pub struct SharedState {
    pub report_repo: ReportRepository,
    pub user_repo: UserRepository,
}

#[derive(Template)]
#[template(path = "shared/report.html")]
struct SharedReportTemplate {
    shared: SharedReport,
    owner_name: String,
    report: WeeklyReport,
    comments: Vec<ReportComment>,
    error: Option<String>,
}

#[derive(Serialize)]
pub struct SharedReportResponse {
    success: bool,
    report: SharedReport,
    workouts: Vec<WorkoutWithExercises>,
    progress_photos: Vec<ProgressPhoto>,
    comments: Vec<ReportComment>,
    stats: WeeklyStats,
    week_range: WeekRange,
}

fn share_not_found() -> AppError {
    AppError::NotFound("Shared report not found".to_string())
}

/// The active share behind `token` with its week's data and comments.
async fn load(
    state: &SharedState,
    token: &str,
) -> Result<(SharedReport, WeeklyReport, Vec<ReportComment>)> {
    let shared = state
        .report_repo
        .find_active_by_token(token)
        .await?
        .ok_or_else(share_not_found)?;
    let report = state
        .report_repo
        .weekly_report(&shared.user_id, shared.week_start_date)
        .await?;
    let comments = state.report_repo.find_comments(&shared.id).await?;
    Ok((shared, report, comments))
}

async fn render_page(
    state: &SharedState,
    token: &str,
    error: Option<String>,
) -> Result<Response> {
    let (shared, report, comments) = load(state, token).await?;
    let owner_name = state
        .user_repo
        .find_by_id(&shared.user_id)
        .await?
        .map(|u| u.name().to_string())
        .unwrap_or_default();

    let template = SharedReportTemplate {
        shared,
        owner_name,
        report,
        comments,
        error,
    };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn page(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Response> {
    render_page(&state, &token, None).await
}

pub async fn comment_form(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    ApiForm(form): ApiForm<CreateComment>,
) -> Result<Response> {
    let (name, text) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => {
            let page = render_page(&state, &token, Some(message)).await?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    state
        .report_repo
        .add_comment(&token, &name, &text)
        .await?
        .ok_or_else(share_not_found)?;

    Ok(Redirect::to(&format!("/share/{}#comments", token)).into_response())
}

pub async fn api_get(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<SharedReportResponse>> {
    let (shared, report, comments) = load(&state, &token).await?;

    Ok(Json(SharedReportResponse {
        success: true,
        report: shared,
        workouts: report.workouts,
        progress_photos: report.progress_photos,
        comments,
        stats: report.stats,
        week_range: report.week_range,
    }))
}

pub async fn api_comment(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    ApiJson(form): ApiJson<CreateComment>,
) -> Result<Response> {
    let (name, text) = form.validate().map_err(AppError::Validation)?;

    let comment = state
        .report_repo
        .add_comment(&token, &name, &text)
        .await?
        .ok_or_else(share_not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "comment": comment })),
    )
        .into_response())
}
