use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    Exercise, ExerciseSet, ExerciseType, ExerciseWithSets, FromSqliteRow, NewExercise,
    NewExerciseSet, ProgressiveOverload, UpdateExercise,
};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The exercise, only if its session belongs to `user_id`.
    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<Exercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_owned(&conn, &id, &user_id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Add an exercise to an existing session. `None` when the session is
    /// missing or owned by someone else.
    pub async fn add_to_session(
        &self,
        session_id: &str,
        user_id: &str,
        exercise: NewExercise,
    ) -> Result<Option<ExerciseWithSets>> {
        let pool = self.pool.clone();
        let session_id = session_id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let date: Option<NaiveDate> = tx
                .query_row(
                    "SELECT date FROM workout_sessions WHERE id = ? AND user_id = ?",
                    [&session_id, &user_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(date) = date else {
                return Ok(None);
            };

            let created = insert_exercise(&tx, &user_id, &session_id, date, &exercise)?;
            tx.commit()?;
            Ok(Some(created))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Overwrite the exercise's fields and re-evaluate progressive overload
    /// against the exercise's own position in history.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        update: UpdateExercise,
    ) -> Result<Option<Exercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let Some(existing) = find_owned(&conn, &id, &user_id)? else {
                return Ok(None);
            };
            let date: NaiveDate = conn.query_row(
                "SELECT date FROM workout_sessions WHERE id = ?",
                [&existing.workout_session_id],
                |row| row.get(0),
            )?;

            let name = update.exercise_name.trim().to_string();
            let overload = overload_for(
                &conn,
                &user_id,
                &name,
                update.exercise_type,
                update.weight_kg,
                date,
                existing.created_at,
                Some(&id),
            )?;

            conn.execute(
                "UPDATE exercises
                 SET exercise_name = ?, exercise_type = ?, sets = ?, reps = ?, weight_kg = ?,
                     distance_km = ?, time_minutes = ?, laps = ?, notes = ?,
                     is_progressive = ?, previous_weight_kg = ?, weight_improvement_kg = ?
                 WHERE id = ?",
                rusqlite::params![
                    name,
                    update.exercise_type,
                    update.sets,
                    update.reps,
                    update.weight_kg,
                    update.distance_km,
                    update.time_minutes,
                    update.laps,
                    update.notes,
                    overload.is_progressive,
                    overload.previous_weight_kg,
                    overload.weight_improvement_kg,
                    id
                ],
            )?;

            Ok(find_owned(&conn, &id, &user_id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM exercises
                 WHERE id = ?
                   AND workout_session_id IN (SELECT id FROM workout_sessions WHERE user_id = ?)",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_sets(&self, id: &str, user_id: &str) -> Result<Option<Vec<ExerciseSet>>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            if find_owned(&conn, &id, &user_id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(load_sets(&conn, &id)?))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Replace every set row of the exercise with `sets`.
    pub async fn replace_sets(
        &self,
        id: &str,
        user_id: &str,
        sets: Vec<NewExerciseSet>,
    ) -> Result<Option<Vec<ExerciseSet>>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let Some(exercise) = find_owned(&tx, &id, &user_id)? else {
                return Ok(None);
            };

            tx.execute("DELETE FROM exercise_sets WHERE exercise_id = ?", [&id])?;
            insert_sets(&tx, &id, exercise.exercise_type, &sets)?;
            let stored = load_sets(&tx, &id)?;
            tx.commit()?;
            Ok(Some(stored))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn find_owned(conn: &Connection, id: &str, user_id: &str) -> rusqlite::Result<Option<Exercise>> {
    let mut stmt = conn.prepare(
        "SELECT e.* FROM exercises e
         JOIN workout_sessions s ON s.id = e.workout_session_id
         WHERE e.id = ? AND s.user_id = ?",
    )?;
    stmt.query_row([id, user_id], Exercise::from_row).optional()
}

fn load_sets(conn: &Connection, exercise_id: &str) -> rusqlite::Result<Vec<ExerciseSet>> {
    let mut stmt =
        conn.prepare("SELECT * FROM exercise_sets WHERE exercise_id = ? ORDER BY set_number")?;
    let sets = stmt
        .query_map([exercise_id], ExerciseSet::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sets)
}

/// Insert one exercise row (with its set rows) into `session_id`, recording
/// whether it beats the last logged weight for the same exercise name.
pub(crate) fn insert_exercise(
    conn: &Connection,
    user_id: &str,
    session_id: &str,
    session_date: NaiveDate,
    exercise: &NewExercise,
) -> rusqlite::Result<ExerciseWithSets> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let name = exercise.exercise_name.trim().to_string();

    let overload = overload_for(
        conn,
        user_id,
        &name,
        exercise.exercise_type,
        exercise.weight_kg,
        session_date,
        now,
        None,
    )?;

    let stored = Exercise {
        id,
        workout_session_id: session_id.to_string(),
        exercise_name: name,
        exercise_type: exercise.exercise_type,
        sets: exercise.sets,
        reps: exercise.reps,
        weight_kg: exercise.weight_kg,
        distance_km: exercise.distance_km,
        time_minutes: exercise.time_minutes,
        laps: exercise.laps,
        notes: exercise.notes.clone(),
        is_progressive: overload.is_progressive,
        previous_weight_kg: overload.previous_weight_kg,
        weight_improvement_kg: overload.weight_improvement_kg,
        created_at: now,
    };

    conn.execute(
        "INSERT INTO exercises
            (id, workout_session_id, exercise_name, exercise_type, sets, reps, weight_kg,
             distance_km, time_minutes, laps, notes, is_progressive, previous_weight_kg,
             weight_improvement_kg, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            stored.id,
            stored.workout_session_id,
            stored.exercise_name,
            stored.exercise_type,
            stored.sets,
            stored.reps,
            stored.weight_kg,
            stored.distance_km,
            stored.time_minutes,
            stored.laps,
            stored.notes,
            stored.is_progressive,
            stored.previous_weight_kg,
            stored.weight_improvement_kg,
            stored.created_at
        ],
    )?;

    let exercise_sets = insert_sets(conn, &stored.id, stored.exercise_type, &exercise.exercise_sets)?;

    Ok(ExerciseWithSets {
        exercise: stored,
        exercise_sets,
    })
}

/// Cardio sets carry no load, so their weight is dropped.
fn insert_sets(
    conn: &Connection,
    exercise_id: &str,
    exercise_type: ExerciseType,
    sets: &[NewExerciseSet],
) -> rusqlite::Result<Vec<ExerciseSet>> {
    let mut stmt = conn.prepare(
        "INSERT INTO exercise_sets (id, exercise_id, set_number, reps, weight_kg, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )?;

    let mut created = Vec::with_capacity(sets.len());
    for set in sets {
        let row = ExerciseSet {
            id: Uuid::new_v4().to_string(),
            exercise_id: exercise_id.to_string(),
            set_number: set.set_number,
            reps: set.reps,
            weight_kg: match exercise_type {
                ExerciseType::Cardio => None,
                ExerciseType::Strength => set.weight_kg,
            },
            created_at: Utc::now(),
        };
        stmt.execute(rusqlite::params![
            row.id,
            row.exercise_id,
            row.set_number,
            row.reps,
            row.weight_kg,
            row.created_at
        ])?;
        created.push(row);
    }
    Ok(created)
}

#[allow(clippy::too_many_arguments)]
fn overload_for(
    conn: &Connection,
    user_id: &str,
    name: &str,
    exercise_type: ExerciseType,
    weight_kg: Option<f64>,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> rusqlite::Result<ProgressiveOverload> {
    if exercise_type == ExerciseType::Cardio {
        return Ok(ProgressiveOverload::default());
    }
    let previous = find_previous_weight(conn, user_id, name, date, created_at, exclude_id)?;
    Ok(ProgressiveOverload::evaluate(weight_kg, previous))
}

/// Weight of the most recent earlier occurrence of `name` for this user.
/// "Earlier" means an earlier session date, or the same date but logged first.
pub(crate) fn find_previous_weight(
    conn: &Connection,
    user_id: &str,
    name: &str,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT e.weight_kg FROM exercises e
         JOIN workout_sessions s ON s.id = e.workout_session_id
         WHERE s.user_id = ?1
           AND e.exercise_name = ?2
           AND e.weight_kg IS NOT NULL
           AND e.id != COALESCE(?3, '')
           AND (s.date < ?4 OR (s.date = ?4 AND e.created_at < ?5))
         ORDER BY s.date DESC, e.created_at DESC
         LIMIT 1",
        rusqlite::params![user_id, name, exclude_id, date, created_at],
        |row| row.get(0),
    )
    .optional()
}
