use serde::Deserialize;

use crate::models::Visibility;

// -- Pastes --

#[derive(Debug, Default, Deserialize)]
pub struct PasteForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub reply_to: String,
}

/// `reply_to` was present but is not a paste number.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidReplyTo;

impl PasteForm {
    pub fn has_code(&self) -> bool {
        !self.code.trim().is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_selector(&self.visibility)
    }

    pub fn reply_to(&self) -> Result<Option<i64>, InvalidReplyTo> {
        let raw = self.reply_to.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(|_| InvalidReplyTo)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplyQuery {
    pub reply_to: Option<String>,
}

// -- Comments --

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

// -- Delete --

/// Confirmation is signalled by the presence of `yes`, whatever its value.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub yes: Option<String>,
}

impl DeleteForm {
    pub fn confirmed(&self) -> bool {
        self.yes.is_some()
    }
}

// -- Diff --

#[derive(Debug, Default, Deserialize)]
pub struct DiffQuery {
    pub paste1: Option<String>,
    pub paste2: Option<String>,
}
