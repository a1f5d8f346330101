//! Unified line diff between two pastes.

use std::ops::Range;

use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use pasteboard_types::api::DiffQuery;
use pasteboard_types::models::Paste;
use serde::Serialize;
use similar::{ChangeTag, DiffOp, DiffTag, TextDiff};
use tera::Context;

use crate::error::AppError;
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};
use crate::templates::PasteView;

/// Lines of unchanged text kept around each hunk.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Header,
    Hunk,
    Context,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

impl DiffLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        DiffLine {
            kind,
            text: text.into(),
        }
    }
}

/// Hunk range as `start,len`, collapsing to `start` for single lines.
/// An empty range names the line before it.
fn format_range(range: &Range<usize>) -> String {
    let len = range.end - range.start;
    match len {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        _ => format!("{},{}", range.start + 1, len),
    }
}

/// Terminator-free lines, each re-terminated so a missing final newline
/// never shows up as a change. `\r\n` and a lone `\r` both end a line.
fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Diff `old` against `new` with the given file labels.
/// Identical inputs produce no lines at all.
pub fn unified_diff(old: &str, new: &str, from_label: &str, to_label: &str) -> Vec<DiffLine> {
    let old = normalize(old);
    let new = normalize(new);
    let diff = TextDiff::from_lines(&old, &new);

    let groups: Vec<Vec<DiffOp>> = diff
        .grouped_ops(CONTEXT_LINES)
        .into_iter()
        .filter(|group| group.iter().any(|op| op.tag() != DiffTag::Equal))
        .collect();

    let mut lines = Vec::new();
    if groups.is_empty() {
        return lines;
    }

    lines.push(DiffLine::new(LineKind::Header, format!("--- {from_label}")));
    lines.push(DiffLine::new(LineKind::Header, format!("+++ {to_label}")));

    for group in &groups {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        lines.push(DiffLine::new(
            LineKind::Hunk,
            format!("@@ -{} +{} @@", format_range(&old_range), format_range(&new_range)),
        ));

        for op in group {
            for change in diff.iter_changes(op) {
                let (kind, prefix) = match change.tag() {
                    ChangeTag::Equal => (LineKind::Context, ' '),
                    ChangeTag::Delete => (LineKind::Removed, '-'),
                    ChangeTag::Insert => (LineKind::Added, '+'),
                };
                let value = change.value();
                let text = value.strip_suffix('\n').unwrap_or(value);
                lines.push(DiffLine::new(kind, format!("{prefix}{text}")));
            }
        }
    }

    lines
}

pub fn diff_label(paste: &Paste) -> String {
    format!("paste #{}", paste.external_id)
}

/// External id first, then the internal numeric id.
async fn resolve(state: &AppState, identifier: Option<String>) -> Result<Paste, AppError> {
    let identifier = identifier
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .ok_or(AppError::NotFound)?;

    run_blocking(state, move |db| {
        if let Some(row) = db.get_paste_by_external_id(&identifier)? {
            return Ok(Some(row));
        }
        match identifier.parse::<i64>() {
            Ok(id) => db.get_paste(id),
            Err(_) => Ok(None),
        }
    })
    .await?
    .map(Paste::from)
    .ok_or(AppError::NotFound)
}

/// GET /diff?paste1=&paste2=
pub async fn show_diff(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    Query(query): Query<DiffQuery>,
) -> Result<Response, AppError> {
    let from = resolve(&state, query.paste1).await?;
    let to = resolve(&state, query.paste2).await?;

    let lines = unified_diff(&from.code, &to.code, &diff_label(&from), &diff_label(&to));

    let mut context = Context::new();
    context.insert("diff", &lines);
    context.insert("frompaste", &PasteView::from(from));
    context.insert("to", &PasteView::from(to));
    ctx.render(jar, "diff.html", context)
}
