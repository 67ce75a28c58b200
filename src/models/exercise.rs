use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::exercise_set::{ExerciseSet, NewExerciseSet};
use super::lenient;
use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    #[default]
    Strength,
    Cardio,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Strength => "strength",
            ExerciseType::Cardio => "cardio",
        }
    }

    /// Anything that is not "cardio" is treated as strength work.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cardio" => ExerciseType::Cardio,
            _ => ExerciseType::Strength,
        }
    }
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ExerciseType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExerciseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "strength" => Ok(ExerciseType::Strength),
            "cardio" => Ok(ExerciseType::Cardio),
            other => Err(FromSqlError::Other(
                format!("unknown exercise type: {}", other).into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub workout_session_id: String,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub distance_km: Option<f64>,
    pub time_minutes: Option<i32>,
    pub laps: Option<i32>,
    pub notes: Option<String>,
    pub is_progressive: bool,
    pub previous_weight_kg: Option<f64>,
    pub weight_improvement_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_session_id: row.get("workout_session_id")?,
            exercise_name: row.get("exercise_name")?,
            exercise_type: row.get("exercise_type")?,
            sets: row.get("sets")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            distance_km: row.get("distance_km")?,
            time_minutes: row.get("time_minutes")?,
            laps: row.get("laps")?,
            notes: row.get("notes")?,
            is_progressive: row.get("is_progressive")?,
            previous_weight_kg: row.get("previous_weight_kg")?,
            weight_improvement_kg: row.get("weight_improvement_kg")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// An exercise as submitted by the add-workout dialog or recovered from an
/// AI reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExercise {
    pub exercise_name: String,
    #[serde(default)]
    pub exercise_type: ExerciseType,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub sets: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub reps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub time_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub laps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercise_sets: Vec<NewExerciseSet>,
}

impl NewExercise {
    pub fn validate(&self) -> Result<(), String> {
        if self.exercise_name.trim().is_empty() {
            return Err("Exercise name is required".to_string());
        }
        let negative_int = [self.sets, self.reps, self.time_minutes, self.laps]
            .iter()
            .flatten()
            .any(|n| *n < 0);
        let negative_float = [self.weight_kg, self.distance_km]
            .iter()
            .flatten()
            .any(|n| *n < 0.0);
        if negative_int || negative_float {
            return Err(format!(
                "{}: values cannot be negative",
                self.exercise_name.trim()
            ));
        }
        for set in &self.exercise_sets {
            set.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateExercise {
    pub exercise_name: String,
    #[serde(default)]
    pub exercise_type: ExerciseType,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub sets: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub reps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub time_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    pub laps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub notes: Option<String>,
}

impl UpdateExercise {
    pub fn validate(&self) -> Result<(), String> {
        NewExercise {
            exercise_name: self.exercise_name.clone(),
            exercise_type: self.exercise_type,
            sets: self.sets,
            reps: self.reps,
            weight_kg: self.weight_kg,
            distance_km: self.distance_km,
            time_minutes: self.time_minutes,
            laps: self.laps,
            notes: None,
            exercise_sets: Vec::new(),
        }
        .validate()
    }
}

/// Result of comparing an exercise's weight to the most recent earlier
/// occurrence of the same exercise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressiveOverload {
    pub is_progressive: bool,
    pub previous_weight_kg: Option<f64>,
    pub weight_improvement_kg: Option<f64>,
}

impl ProgressiveOverload {
    pub fn evaluate(current: Option<f64>, previous: Option<f64>) -> Self {
        match (current, previous) {
            (Some(current), Some(previous)) if current > previous => Self {
                is_progressive: true,
                previous_weight_kg: Some(previous),
                weight_improvement_kg: Some(round_kg(current - previous)),
            },
            (_, previous) => Self {
                is_progressive: false,
                previous_weight_kg: previous,
                weight_improvement_kg: None,
            },
        }
    }
}

fn round_kg(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseWithSets {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub exercise_sets: Vec<ExerciseSet>,
}

impl ExerciseWithSets {
    /// The same exercise as a fresh insert, used when copying a schedule forward.
    pub fn to_new_exercise(&self) -> NewExercise {
        let e = &self.exercise;
        NewExercise {
            exercise_name: e.exercise_name.clone(),
            exercise_type: e.exercise_type,
            sets: e.sets,
            reps: e.reps,
            weight_kg: e.weight_kg,
            distance_km: e.distance_km,
            time_minutes: e.time_minutes,
            laps: e.laps,
            notes: e.notes.clone(),
            exercise_sets: self
                .exercise_sets
                .iter()
                .map(|set| NewExerciseSet {
                    set_number: set.set_number,
                    reps: set.reps,
                    weight_kg: set.weight_kg,
                })
                .collect(),
        }
    }

    /// Logged sets when present, otherwise the summary `sets` count.
    pub fn set_count(&self) -> i64 {
        if self.exercise_sets.is_empty() {
            self.exercise.sets.unwrap_or(0) as i64
        } else {
            self.exercise_sets.len() as i64
        }
    }

    /// One-line summary used when no per-set rows exist, e.g. "3 sets • 10 reps • 80kg".
    pub fn summary(&self) -> String {
        let e = &self.exercise;
        let mut parts = Vec::new();
        if let Some(sets) = e.sets {
            parts.push(format!("{} sets", sets));
        }
        if let Some(reps) = e.reps {
            parts.push(format!("{} reps", reps));
        }
        if let Some(weight) = e.weight_kg {
            parts.push(format!("{}kg", weight));
        }
        if let Some(distance) = e.distance_km {
            parts.push(format!("{}km", distance));
        }
        if let Some(time) = e.time_minutes {
            parts.push(format!("{} min", time));
        }
        if let Some(laps) = e.laps {
            parts.push(format!("{} laps", laps));
        }
        parts.join(" • ")
    }
}
