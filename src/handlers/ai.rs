use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::extract::ApiJson;
use crate::error::{AppError, Result};
use crate::import::{import_text_workout, TextImportOutcome};
use crate::llm::{ConnectionReport, LlmClient, ProviderKind};
use crate::middleware::AuthUser;
use crate::models::WorkoutCategory;
use crate::repositories::WorkoutRepository;

#[derive(Clone)]
pub struct AiState {
    pub llm: LlmClient,
    pub workout_repo: WorkoutRepository,
}

#[derive(Deserialize)]
pub struct ProcessWorkoutText {
    pub workout_text: String,
    pub workout_date: NaiveDate,
    /// A category name, or "auto"/empty to let the model decide.
    #[serde(default)]
    pub category: Option<String>,
}

impl ProcessWorkoutText {
    fn category_hint(&self) -> Result<Option<WorkoutCategory>> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(c) if c.eq_ignore_ascii_case("auto") => Ok(None),
            Some(c) => WorkoutCategory::parse(c)
                .map(Some)
                .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", c))),
        }
    }
}

pub async fn process_workout_text(
    State(state): State<AiState>,
    auth_user: AuthUser,
    ApiJson(form): ApiJson<ProcessWorkoutText>,
) -> Result<Json<TextImportOutcome>> {
    if form.workout_text.trim().is_empty() {
        return Err(AppError::Validation("Workout text is required".to_string()));
    }
    let hint = form.category_hint()?;

    let outcome = import_text_workout(
        &state.llm,
        &state.workout_repo,
        &auth_user.id,
        &form.workout_text,
        form.workout_date,
        hint,
    )
    .await?;

    Ok(Json(outcome))
}

/// Always 200 for a known provider; failures are described in the body.
pub async fn test_provider(
    State(state): State<AiState>,
    _auth_user: AuthUser,
    Path(provider): Path<String>,
) -> Result<Json<ConnectionReport>> {
    let kind = ProviderKind::parse(&provider)
        .ok_or_else(|| AppError::NotFound(format!("Unknown provider: {}", provider)))?;

    Ok(Json(state.llm.test_connection(kind).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(category: Option<&str>) -> ProcessWorkoutText {
        ProcessWorkoutText {
            workout_text: "bench 3x10 80kg".to_string(),
            workout_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_category_hint() {
        assert_eq!(form(None).category_hint().unwrap(), None);
        assert_eq!(form(Some("auto")).category_hint().unwrap(), None);
        assert_eq!(form(Some(" ")).category_hint().unwrap(), None);
        assert_eq!(
            form(Some("Legs")).category_hint().unwrap(),
            Some(WorkoutCategory::Legs)
        );
        assert!(form(Some("yoga")).category_hint().is_err());
    }
}
