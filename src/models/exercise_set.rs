use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::lenient;
use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: String,
    pub exercise_id: String,
    pub set_number: i32,
    pub reps: i32,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ExerciseSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            exercise_id: row.get("exercise_id")?,
            set_number: row.get("set_number")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExerciseSet {
    pub set_number: i32,
    pub reps: i32,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub weight_kg: Option<f64>,
}

impl NewExerciseSet {
    pub fn validate(&self) -> Result<(), String> {
        if self.set_number < 1 {
            return Err("Set numbers start at 1".to_string());
        }
        if self.reps < 0 {
            return Err(format!("Set {}: reps cannot be negative", self.set_number));
        }
        if self.weight_kg.is_some_and(|w| w < 0.0) {
            return Err(format!("Set {}: weight cannot be negative", self.set_number));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceExerciseSets {
    pub sets: Vec<NewExerciseSet>,
}
