use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, WorkoutPlan};

#[derive(Clone)]
pub struct PlanRepository {
    pool: DbPool,
}

impl PlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, name: &str, file_url: &str) -> Result<WorkoutPlan> {
        let now = Utc::now();
        let plan = WorkoutPlan {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            file_url: Some(file_url.to_string()),
            created_at: now,
            updated_at: now,
        };
        let plan_clone = plan.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workout_plans (id, user_id, name, file_url, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    plan_clone.id,
                    plan_clone.user_id,
                    plan_clone.name,
                    plan_clone.file_url,
                    plan_clone.created_at,
                    plan_clone.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(plan)
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<WorkoutPlan>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workout_plans WHERE user_id = ? ORDER BY created_at DESC",
            )?;
            let plans = stmt
                .query_map([&user_id], WorkoutPlan::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(plans)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<WorkoutPlan>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM workout_plans WHERE id = ? AND user_id = ?")?;
            let plan = stmt
                .query_row([&id, &user_id], WorkoutPlan::from_row)
                .optional()?;
            Ok(plan)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Sessions imported from the plan keep their rows; their link is set to NULL.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<Option<WorkoutPlan>> {
        let Some(plan) = self.find_for_user(id, user_id).await? else {
            return Ok(None);
        };

        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute("DELETE FROM workout_plans WHERE id = ?", [&id])?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    #[tokio::test]
    async fn test_plan_lifecycle() {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO users (id, username, password_hash, created_at) VALUES ('u1', 'alice', 'x', datetime('now'))",
                [],
            )
            .unwrap();
        }
        let repo = PlanRepository::new(pool.clone());

        let plan = repo
            .create("u1", " 12 week strength ", "http://x/storage/workout-plans/p.pdf")
            .await
            .unwrap();
        assert_eq!(plan.name, "12 week strength");
        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
        assert!(repo.find_for_user(&plan.id, "u2").await.unwrap().is_none());

        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO workout_sessions (id, user_id, date, category, workout_plan_id, created_at, updated_at)
                 VALUES ('s1', 'u1', '2024-03-04', 'push', ?, datetime('now'), datetime('now'))",
                [&plan.id],
            )
            .unwrap();
        }

        assert!(repo.delete(&plan.id, "u2").await.unwrap().is_none());
        assert!(repo.delete(&plan.id, "u1").await.unwrap().is_some());
        assert!(repo.find_by_user("u1").await.unwrap().is_empty());

        let conn = pool.get().unwrap();
        let link: Option<String> = conn
            .query_row(
                "SELECT workout_plan_id FROM workout_sessions WHERE id = 's1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(link, None);
    }
}
