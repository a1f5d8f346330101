//! Database row types. These map directly to SQLite rows.
//! Distinct from pasteboard-types models so password hashes and raw
//! timestamps stay inside the DB layer.

use chrono::{DateTime, NaiveDateTime, Utc};
use pasteboard_types::models::{Comment, Paste, User};
use tracing::warn;

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct PasteRow {
    pub id: i64,
    pub external_id: String,
    pub title: Option<String>,
    pub code: String,
    pub listed: bool,
    pub created_at: String,
    pub user_id: Option<i64>,
    pub author_name: Option<String>,
    pub reply_to: Option<i64>,
}

pub struct CommentRow {
    pub id: i64,
    pub message: String,
    pub created_at: String,
    pub user_id: i64,
    pub author_name: String,
    pub paste_id: i64,
    pub paste_external_id: String,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC; RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<PasteRow> for Paste {
    fn from(row: PasteRow) -> Self {
        Paste {
            id: row.id,
            external_id: row.external_id,
            title: row.title,
            code: row.code,
            listed: row.listed,
            created_at: parse_timestamp(&row.created_at),
            user_id: row.user_id,
            author_name: row.author_name,
            reply_to: row.reply_to,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            message: row.message,
            created_at: parse_timestamp(&row.created_at),
            user_id: row.user_id,
            author_name: row.author_name,
            paste_id: row.paste_id,
            paste_external_id: row.paste_external_id,
        }
    }
}
