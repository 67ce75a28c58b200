use askama::Template;
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::extract::{today, ApiJson, ApiQuery, WeekQuery};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{CreateShare, WeekRange, WeeklyReport};
use crate::repositories::ReportRepository;

#[derive(Clone)]
pub struct ReportsState {
    pub report_repo: ReportRepository,
    pub public_base_url: String,
}

#[derive(Template)]
#[template(path = "reports/weekly.html")]
struct WeeklyReportTemplate {
    user: AuthUser,
    report: WeeklyReport,
    generated_on: NaiveDate,
}

#[derive(Deserialize)]
pub struct WeeklyQuery {
    week_start: Option<NaiveDate>,
    #[serde(default)]
    download: bool,
}

#[derive(Serialize)]
pub struct ShareResponse {
    success: bool,
    share_token: String,
    share_url: String,
    title: Option<String>,
}

/// Attachment file name for a downloaded report.
pub fn report_filename(week: &WeekRange) -> String {
    format!("fitness-report-{}.html", week.start)
}

pub async fn weekly(
    State(state): State<ReportsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WeeklyQuery>,
) -> Result<Response> {
    let week = WeekRange::containing(query.week_start.unwrap_or_else(today))?;
    let report = state
        .report_repo
        .weekly_report(&auth_user.id, week.start)
        .await?;

    let template = WeeklyReportTemplate {
        user: auth_user,
        report,
        generated_on: today(),
    };
    let html = Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    );

    if query.download {
        let disposition = format!("attachment; filename=\"{}\"", report_filename(&week));
        return Ok(([(header::CONTENT_DISPOSITION, disposition)], html).into_response());
    }
    Ok(html.into_response())
}

pub async fn create_share(
    State(state): State<ReportsState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<CreateShare>,
) -> Result<Json<ShareResponse>> {
    let week = WeekRange::containing(form.week_start_date)?;
    let shared = state
        .report_repo
        .create_share(&auth_user.id, week.start, form.title)
        .await?;

    tracing::info!(
        "User {} shared report for week {}",
        auth_user.username,
        week.start
    );

    Ok(Json(ShareResponse {
        success: true,
        share_url: format!("{}/share/{}", state.public_base_url, shared.share_token),
        share_token: shared.share_token,
        title: shared.title,
    }))
}

pub async fn revoke_share(
    State(state): State<ReportsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.report_repo.deactivate(&id, &auth_user.id).await? {
        return Err(AppError::NotFound("Shared report not found".to_string()));
    }

    Ok(Json(json!({ "success": true })).into_response())
}

pub async fn comments(
    State(state): State<ReportsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<Response> {
    let week = query.required_week()?;
    let comments = state
        .report_repo
        .find_comments_for_week(&auth_user.id, week.start)
        .await?;

    Ok(Json(json!({ "success": true, "comments": comments })).into_response())
}
