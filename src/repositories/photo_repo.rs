use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, ProgressPhoto};

#[derive(Clone)]
pub struct PhotoRepository {
    pool: DbPool,
}

impl PhotoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// One row per uploaded object, given as `(photo_url, notes)` pairs.
    pub async fn create_many(
        &self,
        user_id: &str,
        week_start_date: NaiveDate,
        uploads: Vec<(String, String)>,
    ) -> Result<Vec<ProgressPhoto>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let mut photos = Vec::with_capacity(uploads.len());
            for (photo_url, notes) in uploads {
                let photo = ProgressPhoto {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.clone(),
                    photo_url,
                    week_start_date,
                    notes: Some(notes),
                    created_at: Utc::now(),
                };
                tx.execute(
                    "INSERT INTO progress_photos (id, user_id, photo_url, week_start_date, notes, created_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        photo.id,
                        photo.user_id,
                        photo.photo_url,
                        photo.week_start_date,
                        photo.notes,
                        photo.created_at
                    ],
                )?;
                photos.push(photo);
            }

            tx.commit()?;
            Ok(photos)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_for_week(
        &self,
        user_id: &str,
        week_start_date: NaiveDate,
    ) -> Result<Vec<ProgressPhoto>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM progress_photos
                 WHERE user_id = ? AND week_start_date = ?
                 ORDER BY created_at",
            )?;
            let photos = stmt
                .query_map(rusqlite::params![user_id, week_start_date], ProgressPhoto::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(photos)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Deletes the row and returns it, so the caller can remove the stored object.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<Option<ProgressPhoto>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM progress_photos WHERE id = ? AND user_id = ?")?;
            let photo = stmt
                .query_row([&id, &user_id], ProgressPhoto::from_row)
                .optional()?;
            if photo.is_some() {
                conn.execute("DELETE FROM progress_photos WHERE id = ?", [&id])?;
            }
            Ok(photo)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete_for_week(
        &self,
        user_id: &str,
        week_start_date: NaiveDate,
    ) -> Result<Vec<ProgressPhoto>> {
        let photos = self.find_for_week(user_id, week_start_date).await?;

        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "DELETE FROM progress_photos WHERE user_id = ? AND week_start_date = ?",
                rusqlite::params![user_id, week_start_date],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(photos)
    }
}
