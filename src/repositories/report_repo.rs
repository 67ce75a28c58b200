use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    FromSqliteRow, ProgressPhoto, ReportComment, SharedReport, WeekRange, WeeklyReport,
};
use crate::repositories::workout_repo::load_workouts_in_range;

/// Weekly reports and their public share links.
#[derive(Clone)]
pub struct ReportRepository {
    pool: DbPool,
}

impl ReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Workouts of the week starting at `week_start`, plus the photos filed
    /// under that week.
    pub async fn weekly_report(&self, user_id: &str, week_start: NaiveDate) -> Result<WeeklyReport> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let week = WeekRange::starting(week_start)?;
            let workouts = load_workouts_in_range(&conn, &user_id, week.start, week.end)?;

            let mut stmt = conn.prepare(
                "SELECT * FROM progress_photos
                 WHERE user_id = ? AND week_start_date = ?
                 ORDER BY created_at",
            )?;
            let photos = stmt
                .query_map(rusqlite::params![user_id, week.start], ProgressPhoto::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(WeeklyReport::new(week, workouts, photos))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create_share(
        &self,
        user_id: &str,
        week_start_date: NaiveDate,
        title: Option<String>,
    ) -> Result<SharedReport> {
        let now = Utc::now();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| SharedReport::default_title(week_start_date));
        let report = SharedReport {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            week_start_date,
            share_token: Uuid::new_v4().simple().to_string(),
            title: Some(title),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let report_clone = report.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO shared_reports
                    (id, user_id, week_start_date, share_token, title, is_active, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    report_clone.id,
                    report_clone.user_id,
                    report_clone.week_start_date,
                    report_clone.share_token,
                    report_clone.title,
                    report_clone.is_active,
                    report_clone.created_at,
                    report_clone.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::info!("Created share link for week {}", week_start_date);
        Ok(report)
    }

    pub async fn find_active_by_token(&self, token: &str) -> Result<Option<SharedReport>> {
        let pool = self.pool.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn
                .prepare("SELECT * FROM shared_reports WHERE share_token = ? AND is_active = 1")?;
            let report = stmt.query_row([&token], SharedReport::from_row).optional()?;
            Ok(report)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Revoke a share link. Returns false when it is not the user's.
    pub async fn deactivate(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE shared_reports SET is_active = 0, updated_at = ? WHERE id = ? AND user_id = ?",
                rusqlite::params![Utc::now(), id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// `None` when the token is unknown or revoked.
    /// Adds a comment only while the share behind `token` is active. The
    /// token lookup and the insert are one statement.
    pub async fn add_comment(
        &self,
        token: &str,
        commenter_name: &str,
        comment_text: &str,
    ) -> Result<Option<ReportComment>> {
        let pool = self.pool.clone();
        let token = token.to_string();
        let id = Uuid::new_v4().to_string();
        let commenter_name = commenter_name.to_string();
        let comment_text = comment_text.to_string();
        let created_at = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let shared_report_id: Option<String> = conn
                .query_row(
                    "INSERT INTO report_comments (id, shared_report_id, commenter_name, comment_text, created_at)
                     SELECT ?, id, ?, ?, ? FROM shared_reports
                     WHERE share_token = ? AND is_active = 1
                     RETURNING shared_report_id",
                    rusqlite::params![id, commenter_name, comment_text, created_at, token],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(shared_report_id.map(|shared_report_id| ReportComment {
                id,
                shared_report_id,
                commenter_name,
                comment_text,
                created_at,
            }))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_comments(&self, shared_report_id: &str) -> Result<Vec<ReportComment>> {
        let pool = self.pool.clone();
        let shared_report_id = shared_report_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM report_comments WHERE shared_report_id = ? ORDER BY created_at, rowid",
            )?;
            let comments = stmt
                .query_map([&shared_report_id], ReportComment::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Comments left on any of the user's active shares of that week, newest first.
    pub async fn find_comments_for_week(
        &self,
        user_id: &str,
        week_start_date: NaiveDate,
    ) -> Result<Vec<ReportComment>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT c.* FROM report_comments c
                 JOIN shared_reports r ON r.id = c.shared_report_id
                 WHERE r.user_id = ? AND r.week_start_date = ? AND r.is_active = 1
                 ORDER BY c.created_at DESC, c.rowid DESC",
            )?;
            let comments = stmt
                .query_map(rusqlite::params![user_id, week_start_date], ReportComment::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
