//! Turning LLM replies into workout rows.
//!
//! Replies are recovered with [`extract_json`], checked for the expected
//! shape, then read leniently: numbers may arrive as strings, fields may be
//! missing, and one malformed exercise or plan day never sinks the rest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::llm::{extract_json, prompts, LlmClient, LlmError, PDF_MAX_TOKENS, TEXT_MAX_TOKENS};
use crate::models::lenient;
use crate::models::{
    ExerciseType, NewExercise, NewExerciseSet, NewWorkoutSession, WorkoutCategory, WorkoutPlan,
};
use crate::repositories::WorkoutRepository;
use crate::storage::{Bucket, Storage};

pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Default, Deserialize)]
struct ParsedSession {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParsedExercise {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    exercise_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    exercise_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    sets: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    reps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    distance_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    time_minutes: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    laps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    notes: Option<String>,
    #[serde(default)]
    exercise_sets: Option<Vec<ParsedSet>>,
}

#[derive(Debug, Deserialize)]
struct ParsedSet {
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    set_number: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_i32")]
    reps: Option<i32>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    weight_kg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ParsedPlanWorkout {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    date: Option<String>,
    #[serde(flatten)]
    session: ParsedSession,
    #[serde(default)]
    exercises: Option<Vec<Value>>,
}

impl ParsedExercise {
    /// `None` when the exercise has no name or carries impossible values.
    fn into_new_exercise(self) -> Option<NewExercise> {
        let exercise_name = self.exercise_name?.trim().to_string();
        let exercise_sets = self
            .exercise_sets
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, set)| NewExerciseSet {
                set_number: set.set_number.filter(|n| *n >= 1).unwrap_or(i as i32 + 1),
                reps: set.reps.unwrap_or(0),
                weight_kg: set.weight_kg,
            })
            .collect();

        let exercise = NewExercise {
            exercise_name,
            exercise_type: self
                .exercise_type
                .as_deref()
                .map(ExerciseType::parse)
                .unwrap_or_default(),
            sets: self.sets,
            reps: self.reps,
            weight_kg: self.weight_kg,
            distance_km: self.distance_km,
            time_minutes: self.time_minutes,
            laps: self.laps,
            notes: self.notes,
            exercise_sets,
        };

        match exercise.validate() {
            Ok(()) => Some(exercise),
            Err(reason) => {
                tracing::warn!("Skipping exercise from AI reply: {}", reason);
                None
            }
        }
    }
}

fn parse_exercises(values: Vec<Value>) -> Vec<NewExercise> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ParsedExercise>(value) {
            Ok(parsed) => parsed.into_new_exercise(),
            Err(e) => {
                tracing::warn!("Skipping unreadable exercise from AI reply: {}", e);
                None
            }
        })
        .collect()
}

fn resolve_duration(duration: Option<i32>) -> Option<i32> {
    Some(
        duration
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES),
    )
}

/// A session plus exercises read from a text-parsing reply. The reply must be
/// an object with a `workout_session` object and an `exercises` array.
pub fn workout_from_reply(
    value: Value,
    date: NaiveDate,
    category_hint: Option<WorkoutCategory>,
) -> std::result::Result<(NewWorkoutSession, Vec<NewExercise>), LlmError> {
    let Value::Object(mut object) = value else {
        return Err(LlmError::InvalidStructure("expected a JSON object".to_string()));
    };
    let session = match object.remove("workout_session") {
        Some(session @ Value::Object(_)) => serde_json::from_value::<ParsedSession>(session)
            .map_err(|e| LlmError::InvalidStructure(e.to_string()))?,
        _ => {
            return Err(LlmError::InvalidStructure(
                "missing workout_session".to_string(),
            ))
        }
    };
    let exercises = match object.remove("exercises") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(LlmError::InvalidStructure(
                "exercises is not an array".to_string(),
            ))
        }
    };

    let category = session
        .category
        .as_deref()
        .and_then(WorkoutCategory::parse)
        .or(category_hint)
        .ok_or_else(|| {
            LlmError::InvalidStructure(format!(
                "unrecognised category {:?}",
                session.category.as_deref().unwrap_or("")
            ))
        })?;

    Ok((
        NewWorkoutSession {
            date,
            category,
            duration_minutes: resolve_duration(session.duration_minutes),
            notes: session.notes,
            workout_plan_id: None,
        },
        parse_exercises(exercises),
    ))
}

/// Workouts read from a plan-parsing reply: a JSON array, or an object
/// wrapping one under `workouts`. Days without a usable date or category
/// are skipped.
pub fn plan_workouts_from_reply(
    value: Value,
    plan_id: &str,
) -> std::result::Result<Vec<(NewWorkoutSession, Vec<NewExercise>)>, LlmError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("workouts") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LlmError::InvalidStructure(
                    "expected an array of workouts".to_string(),
                ))
            }
        },
        _ => {
            return Err(LlmError::InvalidStructure(
                "expected an array of workouts".to_string(),
            ))
        }
    };

    let mut workouts = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let parsed = match serde_json::from_value::<ParsedPlanWorkout>(item) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping plan workout {}: {}", index + 1, e);
                continue;
            }
        };

        let date = parsed
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        let category = parsed
            .session
            .category
            .as_deref()
            .and_then(WorkoutCategory::parse);
        let (Some(date), Some(category)) = (date, category) else {
            tracing::warn!(
                "Skipping plan workout {}: unusable date {:?} or category {:?}",
                index + 1,
                parsed.date,
                parsed.session.category
            );
            continue;
        };

        workouts.push((
            NewWorkoutSession {
                date,
                category,
                duration_minutes: resolve_duration(parsed.session.duration_minutes),
                notes: parsed.session.notes,
                workout_plan_id: Some(plan_id.to_string()),
            },
            parse_exercises(parsed.exercises.unwrap_or_default()),
        ));
    }

    Ok(workouts)
}

#[derive(Debug, Serialize)]
pub struct TextImportOutcome {
    pub success: bool,
    pub message: String,
    pub exercises_created: usize,
    pub workout_session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PlanImportOutcome {
    pub success: bool,
    pub message: String,
    pub workouts_created: usize,
    pub exercises_created: usize,
}

/// Parse a free-text workout description with the text provider and store it.
pub async fn import_text_workout(
    llm: &LlmClient,
    workouts: &WorkoutRepository,
    user_id: &str,
    workout_text: &str,
    date: NaiveDate,
    category_hint: Option<WorkoutCategory>,
) -> Result<TextImportOutcome> {
    let preview: String = workout_text.chars().take(100).collect();
    tracing::info!("Processing workout text for {}: {}...", date, preview);

    let prompt = prompts::workout_text_prompt(workout_text, category_hint);
    let reply = llm
        .complete_text(llm.text_provider(), &prompt, TEXT_MAX_TOKENS)
        .await?;

    let (value, method) = extract_json(&reply).inspect_err(|_| {
        tracing::error!("Could not recover JSON from AI reply: {}", reply);
    })?;
    tracing::info!("Recovered workout JSON using {} method", method.as_str());

    let (session, exercises) = workout_from_reply(value, date, category_hint)?;
    let created = workouts
        .create_with_exercises(user_id, session, exercises)
        .await?;

    let count = created.exercises.len();
    tracing::info!(
        "Created workout session {} with {} exercises",
        created.session.id,
        count
    );

    Ok(TextImportOutcome {
        success: true,
        message: format!("Successfully created workout with {} exercises", count),
        exercises_created: count,
        workout_session_id: created.session.id,
    })
}

/// Send a stored plan PDF to the PDF provider and store every usable workout
/// it describes, each in its own transaction.
pub async fn import_plan_workouts(
    llm: &LlmClient,
    workouts: &WorkoutRepository,
    storage: &Storage,
    user_id: &str,
    plan: &WorkoutPlan,
) -> Result<PlanImportOutcome> {
    let name = plan
        .file_url
        .as_deref()
        .and_then(|url| storage.object_name_from_url(Bucket::WorkoutPlans, url))
        .ok_or_else(|| AppError::BadRequest("Plan has no stored PDF".to_string()))?;
    let pdf = storage
        .get(Bucket::WorkoutPlans, &name)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan PDF not found".to_string()))?;

    let reply = llm
        .complete_with_pdf(
            llm.pdf_provider(),
            prompts::WORKOUT_PLAN_SYSTEM_PROMPT,
            prompts::WORKOUT_PLAN_USER_PROMPT,
            &pdf,
            PDF_MAX_TOKENS,
        )
        .await?;

    let (value, method) = extract_json(&reply).inspect_err(|_| {
        tracing::error!("Could not recover JSON from AI reply: {}", reply);
    })?;
    tracing::info!("Recovered plan JSON using {} method", method.as_str());

    let parsed = plan_workouts_from_reply(value, &plan.id)?;
    tracing::info!("Plan {} describes {} usable workouts", plan.id, parsed.len());

    let mut workouts_created = 0;
    let mut exercises_created = 0;
    for (session, exercises) in parsed {
        let date = session.date;
        match workouts
            .create_with_exercises(user_id, session, exercises)
            .await
        {
            Ok(created) => {
                workouts_created += 1;
                exercises_created += created.exercises.len();
            }
            Err(e) => tracing::error!("Failed to store plan workout for {}: {}", date, e),
        }
    }

    Ok(PlanImportOutcome {
        success: true,
        message: format!(
            "Successfully created {} workout sessions with {} exercises",
            workouts_created, exercises_created
        ),
        workouts_created,
        exercises_created,
    })
}
