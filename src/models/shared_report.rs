use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

pub const MAX_COMMENTER_NAME_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedReport {
    pub id: String,
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub share_token: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedReport {
    pub fn default_title(week_start: NaiveDate) -> String {
        format!("Weekly Progress - {}", week_start)
    }

    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| Self::default_title(self.week_start_date))
    }
}

impl FromSqliteRow for SharedReport {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            week_start_date: row.get("week_start_date")?,
            share_token: row.get("share_token")?,
            title: row.get("title")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportComment {
    pub id: String,
    pub shared_report_id: String,
    pub commenter_name: String,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ReportComment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            shared_report_id: row.get("shared_report_id")?,
            commenter_name: row.get("commenter_name")?,
            comment_text: row.get("comment_text")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateShare {
    pub week_start_date: NaiveDate,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub commenter_name: String,
    pub comment_text: String,
}

impl CreateComment {
    /// Trimmed name and text, or a message describing what is wrong.
    pub fn validate(&self) -> Result<(String, String), String> {
        let name = self.commenter_name.trim();
        let text = self.comment_text.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        if text.is_empty() {
            return Err("Comment is required".to_string());
        }
        if name.chars().count() > MAX_COMMENTER_NAME_LEN {
            return Err(format!(
                "Name must be at most {} characters",
                MAX_COMMENTER_NAME_LEN
            ));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            ));
        }
        Ok((name.to_string(), text.to_string()))
    }
}
