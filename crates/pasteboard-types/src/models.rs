use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of characters in a paste's public identifier.
pub const EXTERNAL_ID_LEN: usize = 12;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Whether a paste shows up in the public archive and sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Listed,
    Secret,
}

impl Visibility {
    /// Only the literal selector value `secret` hides a paste.
    pub fn from_selector(value: &str) -> Self {
        if value == "secret" {
            Visibility::Secret
        } else {
            Visibility::Listed
        }
    }

    pub fn is_listed(self) -> bool {
        self == Visibility::Listed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paste {
    pub id: i64,
    pub external_id: String,
    pub title: Option<String>,
    pub code: String,
    pub listed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<i64>,
    /// Display name of the owner, joined in by the query layer.
    pub author_name: Option<String>,
    pub reply_to: Option<i64>,
}

impl Paste {
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => format!("Paste #{}", self.id),
        }
    }

    pub fn is_owned_by(&self, user: Option<&User>) -> bool {
        match (self.user_id, user) {
            (Some(owner), Some(user)) => owner == user.id,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub author_name: String,
    pub paste_id: i64,
    pub paste_external_id: String,
}
