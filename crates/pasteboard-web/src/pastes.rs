use axum::{
    Form,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use pasteboard_db::NewPaste;
use pasteboard_types::api::{CommentForm, DeleteForm, PasteForm, ReplyQuery};
use pasteboard_types::models::{Comment, Paste};
use tera::Context;
use tracing::{info, warn};

use crate::error::AppError;
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};
use crate::templates::{CommentView, PasteView};

pub const ARCHIVE_PAGE_SIZE: u32 = 25;

const EMPTY_CODE: &str = "You need to fill in the code field";
const MISSING_PARENT: &str = "The paste you are replying to does not exist";

async fn find_by_external_id(state: &AppState, external_id: String) -> Result<Paste, AppError> {
    run_blocking(state, move |db| db.get_paste_by_external_id(&external_id))
        .await?
        .map(Paste::from)
        .ok_or(AppError::NotFound)
}

/// Internal ids arrive as path text; anything that is not a number is simply unknown.
async fn find_by_id(state: &AppState, raw_id: &str) -> Result<Paste, AppError> {
    let id: i64 = raw_id.parse().map_err(|_| AppError::NotFound)?;
    run_blocking(state, move |db| db.get_paste(id))
        .await?
        .map(Paste::from)
        .ok_or(AppError::NotFound)
}

// -- Compose --

/// Form state shown on the compose page.
#[derive(Default)]
struct Compose {
    title: String,
    code: String,
    visibility: String,
    reply_to: Option<Paste>,
}

async fn render_home(
    state: &AppState,
    ctx: RequestContext,
    jar: CookieJar,
    compose: Compose,
) -> Result<Response, AppError> {
    let recent_paste = match ctx.user() {
        Some(user) => {
            let user_id = user.id;
            run_blocking(state, move |db| db.latest_paste_for_user(user_id))
                .await?
                .map(|row| PasteView::from(Paste::from(row)))
        }
        None => None,
    };

    let reply_to_title = compose
        .reply_to
        .as_ref()
        .map(|parent| format!("Reply to #{}", parent.id))
        .unwrap_or_default();

    let mut context = Context::new();
    context.insert("recent_paste", &recent_paste);
    context.insert("reply_to", &compose.reply_to.map(PasteView::from));
    context.insert("reply_to_title", &reply_to_title);
    context.insert("title", &compose.title);
    context.insert("code", &compose.code);
    context.insert("visibility", &compose.visibility);
    ctx.render(jar, "home.html", context)
}

/// GET /: compose page, optionally pre-filled as a reply.
pub async fn home(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    Query(query): Query<ReplyQuery>,
) -> Result<Response, AppError> {
    let parent_id = query
        .reply_to
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    let reply_to = match parent_id {
        Some(id) => run_blocking(&state, move |db| db.get_paste(id))
            .await?
            .map(Paste::from),
        None => None,
    };

    let compose = Compose {
        reply_to,
        ..Default::default()
    };
    render_home(&state, ctx, jar, compose).await
}

/// POST /: store a new paste and go to it.
pub async fn create_paste(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<PasteForm>,
) -> Result<Response, AppError> {
    let compose = Compose {
        title: form.title.clone(),
        code: form.code.clone(),
        visibility: form.visibility.clone(),
        reply_to: None,
    };

    if !form.has_code() {
        ctx.flash_error(EMPTY_CODE);
        return render_home(&state, ctx, jar, compose).await;
    }

    let Ok(reply_to) = form.reply_to() else {
        ctx.flash_error(MISSING_PARENT);
        return render_home(&state, ctx, jar, compose).await;
    };

    let title = form.title().map(String::from);
    let listed = form.visibility().is_listed();
    let user_id = ctx.user().map(|u| u.id);
    let code = form.code;

    let created = run_blocking(&state, move |db| {
        if let Some(parent) = reply_to {
            if db.get_paste(parent)?.is_none() {
                return Ok(None);
            }
        }
        let row = db.insert_paste(&NewPaste {
            title: title.as_deref(),
            code: &code,
            listed,
            user_id,
            reply_to,
        })?;
        Ok(Some(row))
    })
    .await?;

    match created {
        Some(row) => {
            info!(
                "Paste {} (#{}) created by {}",
                row.external_id,
                row.id,
                row.author_name.as_deref().unwrap_or("anonymous")
            );
            Ok(ctx.redirect(jar, &format!("/{}", row.external_id)))
        }
        None => {
            ctx.flash_error(MISSING_PARENT);
            render_home(&state, ctx, jar, compose).await
        }
    }
}

// -- View --

async fn render_paste(
    state: &AppState,
    ctx: RequestContext,
    jar: CookieJar,
    paste: Paste,
) -> Result<Response, AppError> {
    let paste_id = paste.id;
    let parent_id = paste.reply_to;
    let (parent, replies, comments) = run_blocking(state, move |db| {
        let parent = match parent_id {
            Some(id) => db.get_paste(id)?,
            None => None,
        };
        let replies = db.replies_to(paste_id)?;
        let comments = db.comments_for_paste(paste_id)?;
        Ok((parent, replies, comments))
    })
    .await?;

    let can_delete = paste.user_id.is_none() || paste.is_owned_by(ctx.user());

    let mut context = Context::new();
    context.insert("parent", &parent.map(|row| PasteView::from(Paste::from(row))));
    context.insert(
        "replies",
        &replies
            .into_iter()
            .map(|row| PasteView::from(Paste::from(row)))
            .collect::<Vec<_>>(),
    );
    context.insert(
        "comments",
        &comments
            .into_iter()
            .map(|row| CommentView::from(Comment::from(row)))
            .collect::<Vec<_>>(),
    );
    context.insert("can_delete", &can_delete);
    context.insert("paste", &PasteView::from(paste));
    ctx.render(jar, "show_paste.html", context)
}

/// GET /{paste_id}
pub async fn show_paste(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let paste = find_by_external_id(&state, external_id).await?;
    render_paste(&state, ctx, jar, paste).await
}

/// POST /{paste_id}: comment, if the requester is a known user.
pub async fn comment_on_paste(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    mut ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let paste = find_by_external_id(&state, external_id).await?;

    if !form.comment.trim().is_empty() {
        match ctx.user() {
            Some(user) => {
                let (user_id, paste_id) = (user.id, paste.id);
                let message = form.comment;
                run_blocking(&state, move |db| db.insert_comment(&message, user_id, paste_id)).await?;
                info!("Comment on paste {} by {}", paste.external_id, user.name);
                ctx.flash("comment was successful");
            }
            None => {
                warn!("Anonymous comment on paste {} rejected", paste.external_id);
                ctx.flash_error("In order to comment you need to be logged in!");
            }
        }
    }

    render_paste(&state, ctx, jar, paste).await
}

/// GET /{paste_id}/raw
pub async fn raw_paste(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Response, AppError> {
    let paste = find_by_external_id(&state, external_id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], paste.code).into_response())
}

// -- Delete --

/// Ownerless pastes may be removed by anyone; owned ones only by their owner.
async fn find_deletable(state: &AppState, ctx: &RequestContext, raw_id: &str) -> Result<Paste, AppError> {
    let paste = find_by_id(state, raw_id).await?;
    if paste.user_id.is_some() && !paste.is_owned_by(ctx.user()) {
        warn!(
            "Delete of paste #{} refused for {}",
            paste.id,
            ctx.user().map(|u| u.name.as_str()).unwrap_or("anonymous")
        );
        return Err(AppError::Unauthorized);
    }
    Ok(paste)
}

/// GET /{id}/delete: confirmation prompt.
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let paste = find_deletable(&state, &ctx, &raw_id).await?;
    let mut context = Context::new();
    context.insert("paste", &PasteView::from(paste));
    ctx.render(jar, "delete_paste.html", context)
}

/// POST /{id}/delete: delete on `yes`, otherwise back to the paste.
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    mut ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let paste = find_deletable(&state, &ctx, &raw_id).await?;

    if !form.confirmed() {
        return Ok(ctx.redirect(jar, &format!("/{}", paste.external_id)));
    }

    let paste_id = paste.id;
    run_blocking(&state, move |db| db.delete_paste(paste_id)).await?;
    info!("Paste {} (#{}) deleted", paste.external_id, paste.id);
    ctx.flash("Paste was successfully deleted");
    Ok(ctx.redirect(jar, "/"))
}

// -- Listings --

/// GET /my_pastes
pub async fn my_pastes(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(user_id) = ctx.user().map(|u| u.id) else {
        ctx.flash_error("In order to view your pastes you need to be logged in!");
        return Ok(ctx.redirect(jar, "/"));
    };

    let (pastes, comments) = run_blocking(&state, move |db| {
        Ok((db.pastes_for_user(user_id)?, db.comments_for_user(user_id)?))
    })
    .await?;

    let mut context = Context::new();
    context.insert(
        "pastes",
        &pastes
            .into_iter()
            .map(|row| PasteView::from(Paste::from(row)))
            .collect::<Vec<_>>(),
    );
    context.insert(
        "comments",
        &comments
            .into_iter()
            .map(|row| CommentView::from(Comment::from(row)))
            .collect::<Vec<_>>(),
    );
    ctx.render(jar, "my_pastes.html", context)
}

async fn render_archive(
    state: &AppState,
    ctx: RequestContext,
    jar: CookieJar,
    page: u32,
) -> Result<Response, AppError> {
    let page = page.max(1);
    let (rows, total) =
        run_blocking(state, move |db| db.listed_pastes(page, ARCHIVE_PAGE_SIZE)).await?;

    let total_pages = total.div_ceil(u64::from(ARCHIVE_PAGE_SIZE)).max(1);

    let mut context = Context::new();
    context.insert(
        "pastes",
        &rows
            .into_iter()
            .map(|row| PasteView::from(Paste::from(row)))
            .collect::<Vec<_>>(),
    );
    context.insert("page", &page);
    context.insert("total_pages", &total_pages);
    context.insert("has_prev", &(page > 1));
    context.insert("has_next", &(u64::from(page) < total_pages));
    ctx.render(jar, "archive.html", context)
}

/// GET /archive
pub async fn archive(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_archive(&state, ctx, jar, 1).await
}

/// GET /archive/{page}
pub async fn archive_page(
    State(state): State<AppState>,
    Path(raw_page): Path<String>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let page: u32 = raw_page.parse().map_err(|_| AppError::NotFound)?;
    render_archive(&state, ctx, jar, page).await
}
