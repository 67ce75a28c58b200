use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use chrono::NaiveDate;

use super::extract::{today, ApiQuery, WeekQuery};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ProgressPhoto, WeekRange, WeeklyStats, WorkoutWithExercises};
use crate::repositories::{PhotoRepository, WorkoutRepository};

#[derive(Clone)]
pub struct DashboardState {
    pub workout_repo: WorkoutRepository,
    pub photo_repo: PhotoRepository,
}

/// One column of the week grid.
pub struct DayView {
    pub date: NaiveDate,
    pub is_today: bool,
    pub workouts: Vec<WorkoutWithExercises>,
}

impl DayView {
    pub fn weekday(&self) -> String {
        self.date.format("%a").to_string()
    }

    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    user: AuthUser,
    week: WeekRange,
    previous_week: NaiveDate,
    next_week: NaiveDate,
    is_current_week: bool,
    days: Vec<DayView>,
    today_workouts: Vec<WorkoutWithExercises>,
    photos: Vec<ProgressPhoto>,
    stats: WeeklyStats,
}

/// Spread a week's workouts over its seven days.
pub fn group_by_day(
    week: &WeekRange,
    today: NaiveDate,
    workouts: &[WorkoutWithExercises],
) -> Vec<DayView> {
    week.days()
        .map(|date| DayView {
            date,
            is_today: date == today,
            workouts: workouts
                .iter()
                .filter(|w| w.session.date == date)
                .cloned()
                .collect(),
        })
        .collect()
}

pub async fn index(
    State(state): State<DashboardState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<WeekQuery>,
) -> Result<Response> {
    let today = today();
    let week = query.week()?;

    let workouts = state
        .workout_repo
        .find_in_range(&auth_user.id, week.start, week.end)
        .await?;
    let today_workouts = if week.contains(today) {
        workouts
            .iter()
            .filter(|w| w.session.date == today)
            .cloned()
            .collect()
    } else {
        state
            .workout_repo
            .find_in_range(&auth_user.id, today, today)
            .await?
    };
    let photos = state
        .photo_repo
        .find_for_week(&auth_user.id, week.start)
        .await?;

    let template = DashboardTemplate {
        user: auth_user,
        previous_week: week.previous()?.start,
        next_week: week.next()?.start,
        is_current_week: week.contains(today),
        days: group_by_day(&week, today, &workouts),
        stats: WeeklyStats::from_workouts(&workouts),
        week,
        today_workouts,
        photos,
    };

    Ok(Html(template.render().map_err(|e| AppError::Internal(e.to_string()))?).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_day_marks_today() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let week = WeekRange::starting(monday).unwrap();
        let days = group_by_day(&week, monday + chrono::Duration::days(2), &[]);

        assert_eq!(days.len(), 7);
        assert!(days[2].is_today);
        assert_eq!(days.iter().filter(|d| d.is_today).count(), 1);
        assert_eq!(days[0].weekday(), "Mon");
        assert_eq!(days[0].label(), "Mar 4");
    }
}
