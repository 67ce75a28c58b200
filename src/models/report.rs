use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::{ProgressPhoto, WorkoutCategory, WorkoutWithExercises};
use crate::error::{AppError, Result};

fn date_out_of_range() -> AppError {
    AppError::BadRequest("Date out of range".to_string())
}

/// A Monday-to-Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn containing(date: NaiveDate) -> Result<Self> {
        let offset = date.weekday().num_days_from_monday() as i64;
        let start = date
            .checked_sub_signed(Duration::days(offset))
            .ok_or_else(date_out_of_range)?;
        Self::starting(start)
    }

    /// Seven days beginning at `start`, whatever weekday it falls on.
    pub fn starting(start: NaiveDate) -> Result<Self> {
        let end = start
            .checked_add_signed(Duration::days(6))
            .ok_or_else(date_out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(7)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn previous(&self) -> Result<Self> {
        self.start
            .checked_sub_signed(Duration::days(7))
            .ok_or_else(date_out_of_range)
            .and_then(Self::starting)
    }

    pub fn next(&self) -> Result<Self> {
        self.start
            .checked_add_signed(Duration::days(7))
            .ok_or_else(date_out_of_range)
            .and_then(Self::starting)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyStats {
    pub total_workouts: i64,
    pub total_exercises: i64,
    pub total_sets: i64,
    pub categories_worked: Vec<WorkoutCategory>,
}

impl WeeklyStats {
    pub fn from_workouts(workouts: &[WorkoutWithExercises]) -> Self {
        let mut categories_worked = Vec::new();
        for workout in workouts {
            if !categories_worked.contains(&workout.session.category) {
                categories_worked.push(workout.session.category);
            }
        }

        Self {
            total_workouts: workouts.len() as i64,
            total_exercises: workouts.iter().map(|w| w.exercises.len() as i64).sum(),
            total_sets: workouts.iter().map(|w| w.set_count()).sum(),
            categories_worked,
        }
    }

    pub fn categories_label(&self) -> String {
        self.categories_worked
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub week_range: WeekRange,
    pub workouts: Vec<WorkoutWithExercises>,
    pub progress_photos: Vec<ProgressPhoto>,
    pub stats: WeeklyStats,
}

impl WeeklyReport {
    pub fn new(
        week_range: WeekRange,
        workouts: Vec<WorkoutWithExercises>,
        progress_photos: Vec<ProgressPhoto>,
    ) -> Self {
        let stats = WeeklyStats::from_workouts(&workouts);
        Self {
            week_range,
            workouts,
            progress_photos,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Exercise, ExerciseSet, ExerciseType, ExerciseWithSets, WorkoutSession,
    };
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_containing_starts_monday() {
        // 2024-03-07 is a Thursday
        let week = WeekRange::containing(date(2024, 3, 7)).unwrap();
        assert_eq!(week.start, date(2024, 3, 4));
        assert_eq!(week.end, date(2024, 3, 10));

        let sunday = WeekRange::containing(date(2024, 3, 10)).unwrap();
        assert_eq!(sunday.start, date(2024, 3, 4));

        let monday = WeekRange::containing(date(2024, 3, 4)).unwrap();
        assert_eq!(monday.start, date(2024, 3, 4));
    }

    #[test]
    fn test_week_days_and_navigation() {
        let week = WeekRange::starting(date(2024, 12, 30)).unwrap();
        let days: Vec<_> = week.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[6], date(2025, 1, 5));
        assert!(week.contains(date(2025, 1, 1)));
        assert!(!week.contains(date(2025, 1, 6)));
        assert_eq!(week.next().unwrap().start, date(2025, 1, 6));
        assert_eq!(week.previous().unwrap().start, date(2024, 12, 23));
    }

    #[test]
    fn test_week_at_calendar_edges_is_an_error() {
        assert!(WeekRange::containing(NaiveDate::MAX).is_err());

        let last = WeekRange::containing(NaiveDate::MAX - Duration::days(7)).unwrap();
        assert!(last.next().is_err());
    }

    fn workout(category: WorkoutCategory, exercises: Vec<(Option<i32>, usize)>) -> WorkoutWithExercises {
        let now = Utc::now();
        let session = WorkoutSession {
            id: "s".to_string(),
            user_id: "u".to_string(),
            date: date(2024, 3, 4),
            category,
            duration_minutes: Some(60),
            notes: None,
            workout_plan_id: None,
            created_at: now,
            updated_at: now,
        };
        let exercises = exercises
            .into_iter()
            .enumerate()
            .map(|(i, (sets, rows))| ExerciseWithSets {
                exercise: Exercise {
                    id: format!("e{}", i),
                    workout_session_id: "s".to_string(),
                    exercise_name: format!("Exercise {}", i),
                    exercise_type: ExerciseType::Strength,
                    sets,
                    reps: None,
                    weight_kg: None,
                    distance_km: None,
                    time_minutes: None,
                    laps: None,
                    notes: None,
                    is_progressive: false,
                    previous_weight_kg: None,
                    weight_improvement_kg: None,
                    created_at: now,
                },
                exercise_sets: (1..=rows as i32)
                    .map(|n| ExerciseSet {
                        id: format!("set{}", n),
                        exercise_id: format!("e{}", i),
                        set_number: n,
                        reps: 10,
                        weight_kg: None,
                        created_at: now,
                    })
                    .collect(),
            })
            .collect();
        WorkoutWithExercises { session, exercises }
    }

    #[test]
    fn test_weekly_stats() {
        let workouts = vec![
            workout(WorkoutCategory::Push, vec![(Some(3), 0), (None, 4)]),
            workout(WorkoutCategory::Legs, vec![(Some(5), 0)]),
            workout(WorkoutCategory::Push, vec![]),
        ];
        let stats = WeeklyStats::from_workouts(&workouts);

        assert_eq!(stats.total_workouts, 3);
        assert_eq!(stats.total_exercises, 3);
        assert_eq!(stats.total_sets, 12);
        assert_eq!(
            stats.categories_worked,
            vec![WorkoutCategory::Push, WorkoutCategory::Legs]
        );
        assert_eq!(stats.categories_label(), "push, legs");
    }

    #[test]
    fn test_weekly_stats_empty() {
        assert_eq!(WeeklyStats::from_workouts(&[]), WeeklyStats::default());
    }
}
