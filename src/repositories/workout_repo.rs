use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    Exercise, ExerciseSet, ExerciseWithSets, FromSqliteRow, NewExercise, NewWorkoutSession,
    UpdateWorkoutSession, WeekRange, WorkoutSession, WorkoutWithExercises,
};
use crate::repositories::exercise_repo::insert_exercise;

pub const MAX_COPY_WEEKS: u32 = 52;

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a session together with its exercises and their sets in one transaction.
    pub async fn create_with_exercises(
        &self,
        user_id: &str,
        session: NewWorkoutSession,
        exercises: Vec<NewExercise>,
    ) -> Result<WorkoutWithExercises> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let session = insert_session(&tx, &user_id, &session)?;
            let mut created = Vec::with_capacity(exercises.len());
            for exercise in &exercises {
                created.push(insert_exercise(
                    &tx,
                    &user_id,
                    &session.id,
                    session.date,
                    exercise,
                )?);
            }

            tx.commit()?;
            Ok(WorkoutWithExercises {
                session,
                exercises: created,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// The session with its exercises, only if it belongs to `user_id`.
    pub async fn find_with_exercises(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<WorkoutWithExercises>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM workout_sessions WHERE id = ? AND user_id = ?")?;
            let session = stmt
                .query_row([&id, &user_id], WorkoutSession::from_row)
                .optional()?;
            match session {
                Some(session) => Ok(load_workouts(&conn, vec![session])?.pop()),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutWithExercises>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let workouts = load_workouts_in_range(&conn, &user_id, start, end)?;
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_session(
        &self,
        id: &str,
        user_id: &str,
        update: UpdateWorkoutSession,
    ) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workout_sessions
                 SET date = COALESCE(?, date),
                     category = COALESCE(?, category),
                     duration_minutes = COALESCE(?, duration_minutes),
                     notes = COALESCE(?, notes),
                     updated_at = ?
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    update.date,
                    update.category,
                    update.duration_minutes,
                    update.notes,
                    Utc::now(),
                    id,
                    user_id
                ],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Exercises and sets go with the session through `ON DELETE CASCADE`.
    pub async fn delete_session(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workout_sessions WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Copy every session of the week starting at `source_week_start`, with
    /// exercises and sets, into each of the following `weeks` weeks.
    pub async fn duplicate_schedule(
        &self,
        user_id: &str,
        source_week_start: NaiveDate,
        weeks: u32,
    ) -> Result<Vec<WorkoutSession>> {
        if weeks == 0 || weeks > MAX_COPY_WEEKS {
            return Err(AppError::Validation(format!(
                "Weeks must be between 1 and {}",
                MAX_COPY_WEEKS
            )));
        }

        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let source = WeekRange::starting(source_week_start)?;
            let workouts = load_workouts_in_range(&tx, &user_id, source.start, source.end)?;

            let mut created = Vec::with_capacity(workouts.len() * weeks as usize);
            for week in 1..=weeks as i64 {
                for workout in &workouts {
                    let template = &workout.session;
                    let date = template
                        .date
                        .checked_add_signed(Duration::weeks(week))
                        .ok_or_else(|| {
                            AppError::BadRequest("Date out of range".to_string())
                        })?;
                    let session = insert_session(
                        &tx,
                        &user_id,
                        &NewWorkoutSession {
                            date,
                            category: template.category,
                            duration_minutes: template.duration_minutes,
                            notes: template.notes.clone(),
                            workout_plan_id: template.workout_plan_id.clone(),
                        },
                    )?;
                    for exercise in &workout.exercises {
                        insert_exercise(
                            &tx,
                            &user_id,
                            &session.id,
                            session.date,
                            &exercise.to_new_exercise(),
                        )?;
                    }
                    created.push(session);
                }
            }

            tx.commit()?;
            tracing::info!(
                "Copied {} sessions from week {} over {} weeks",
                workouts.len(),
                source_week_start,
                weeks
            );
            Ok(created)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

pub(crate) fn insert_session(
    conn: &Connection,
    user_id: &str,
    session: &NewWorkoutSession,
) -> rusqlite::Result<WorkoutSession> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO workout_sessions
            (id, user_id, date, category, duration_minutes, notes, workout_plan_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            id,
            user_id,
            session.date,
            session.category,
            session.duration_minutes,
            session.notes,
            session.workout_plan_id,
            now,
            now
        ],
    )?;

    Ok(WorkoutSession {
        id,
        user_id: user_id.to_string(),
        date: session.date,
        category: session.category,
        duration_minutes: session.duration_minutes,
        notes: session.notes.clone(),
        workout_plan_id: session.workout_plan_id.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub(crate) fn load_workouts_in_range(
    conn: &Connection,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> rusqlite::Result<Vec<WorkoutWithExercises>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM workout_sessions
         WHERE user_id = ? AND date >= ? AND date <= ?
         ORDER BY date, created_at",
    )?;
    let sessions = stmt
        .query_map(rusqlite::params![user_id, start, end], WorkoutSession::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    load_workouts(conn, sessions)
}

/// Attach exercises (in insertion order) and their sets (by set number) to each session.
pub(crate) fn load_workouts(
    conn: &Connection,
    sessions: Vec<WorkoutSession>,
) -> rusqlite::Result<Vec<WorkoutWithExercises>> {
    let mut exercise_stmt = conn.prepare(
        "SELECT * FROM exercises WHERE workout_session_id = ? ORDER BY created_at, rowid",
    )?;
    let mut set_stmt =
        conn.prepare("SELECT * FROM exercise_sets WHERE exercise_id = ? ORDER BY set_number")?;

    let mut workouts = Vec::with_capacity(sessions.len());
    for session in sessions {
        let exercises = exercise_stmt
            .query_map([&session.id], Exercise::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut with_sets = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let exercise_sets = set_stmt
                .query_map([&exercise.id], ExerciseSet::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            with_sets.push(ExerciseWithSets {
                exercise,
                exercise_sets,
            });
        }

        workouts.push(WorkoutWithExercises {
            session,
            exercises: with_sets,
        });
    }
    Ok(workouts)
}
