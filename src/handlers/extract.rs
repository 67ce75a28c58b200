use axum::extract::{FromRequest, FromRequestParts};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::WeekRange;

/// `axum::Json` whose rejections come back as `AppError::BadRequest`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::Form` whose rejections come back as `AppError::BadRequest`.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

/// `axum::extract::Query` whose rejections come back as `AppError::BadRequest`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `?week_start=YYYY-MM-DD`, optional.
#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    pub week_start: Option<NaiveDate>,
}

impl WeekQuery {
    /// The Monday-to-Sunday week holding `week_start`, or the current week.
    pub fn week(&self) -> Result<WeekRange, AppError> {
        WeekRange::containing(self.week_start.unwrap_or_else(today))
    }

    pub fn required_week(&self) -> Result<WeekRange, AppError> {
        let week_start = self
            .week_start
            .ok_or_else(|| AppError::BadRequest("week_start is required".to_string()))?;
        WeekRange::containing(week_start)
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
