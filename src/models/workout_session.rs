use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::exercise::{ExerciseWithSets, NewExercise};
use super::lenient;
use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutCategory {
    Push,
    Pull,
    Legs,
    Abs,
    Cardio,
    Treadmill,
}

impl WorkoutCategory {
    pub const ALL: [WorkoutCategory; 6] = [
        WorkoutCategory::Push,
        WorkoutCategory::Pull,
        WorkoutCategory::Legs,
        WorkoutCategory::Abs,
        WorkoutCategory::Cardio,
        WorkoutCategory::Treadmill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutCategory::Push => "push",
            WorkoutCategory::Pull => "pull",
            WorkoutCategory::Legs => "legs",
            WorkoutCategory::Abs => "abs",
            WorkoutCategory::Cardio => "cardio",
            WorkoutCategory::Treadmill => "treadmill",
        }
    }

    /// Case-insensitive; `None` for anything outside the six categories.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl std::fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for WorkoutCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WorkoutCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        WorkoutCategory::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown workout category: {}", s).into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub category: WorkoutCategory,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub workout_plan_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for WorkoutSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            category: row.get("category")?,
            duration_minutes: row.get("duration_minutes")?,
            notes: row.get("notes")?,
            workout_plan_id: row.get("workout_plan_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Fields shared by every way a session gets created.
#[derive(Debug, Clone)]
pub struct NewWorkoutSession {
    pub date: NaiveDate,
    pub category: WorkoutCategory,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub workout_plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutSession {
    pub date: NaiveDate,
    pub category: WorkoutCategory,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub notes: Option<String>,
    #[serde(default)]
    pub workout_plan_id: Option<String>,
    #[serde(default)]
    pub exercises: Vec<NewExercise>,
}

impl CreateWorkoutSession {
    pub fn session(&self) -> NewWorkoutSession {
        NewWorkoutSession {
            date: self.date,
            category: self.category,
            duration_minutes: self.duration_minutes,
            notes: self.notes.clone(),
            workout_plan_id: self.workout_plan_id.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(d) = self.duration_minutes {
            if d < 0 {
                return Err("Duration cannot be negative".to_string());
            }
        }
        for exercise in &self.exercises {
            exercise.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutSession {
    pub date: Option<NaiveDate>,
    pub category: Option<WorkoutCategory>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutWithExercises {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub exercises: Vec<ExerciseWithSets>,
}

impl WorkoutWithExercises {
    pub fn set_count(&self) -> i64 {
        self.exercises.iter().map(|e| e.set_count()).sum()
    }
}
