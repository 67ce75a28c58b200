use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressPhoto {
    pub id: String,
    pub user_id: String,
    pub photo_url: String,
    pub week_start_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for ProgressPhoto {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            photo_url: row.get("photo_url")?,
            week_start_date: row.get("week_start_date")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// One image in an upload request, as a `data:` URI or bare base64.
#[derive(Debug, Deserialize)]
pub struct PhotoFile {
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadPhotos {
    pub week_start_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    pub photos: Vec<PhotoFile>,
}
