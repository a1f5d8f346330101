use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use pasteboard_types::models::Paste;
use serde::Serialize;
use tera::Context;

use crate::error::AppError;
use crate::session::RequestContext;
use crate::state::{AppState, run_blocking};
use crate::templates::{self, DISPLAY_TIME_FORMAT};
use crate::ARGUMENT_FREE_ROUTES;

#[derive(Debug, Serialize)]
struct SitemapEntry {
    loc: String,
    lastmod: String,
}

/// Absolute URL root without a trailing slash.
fn url_root(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.public_url {
        return url.clone();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("localhost");
    format!("http://{host}")
}

pub async fn about(ctx: RequestContext, jar: CookieJar) -> Result<Response, AppError> {
    ctx.render(jar, "about.html", Context::new())
}

pub async fn feedback(ctx: RequestContext, jar: CookieJar) -> Result<Response, AppError> {
    ctx.render(jar, "feedback.html", Context::new())
}

pub async fn robots(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("url_root", &url_root(&state, &headers));
    let body = templates::render("robots.txt", &context)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// Every argument-free route stamped with the current time, then every
/// listed paste stamped with its creation time.
pub async fn sitemap(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let root = url_root(&state, &headers);
    let now = Utc::now().format(DISPLAY_TIME_FORMAT).to_string();

    let mut pages: Vec<SitemapEntry> = ARGUMENT_FREE_ROUTES
        .iter()
        .map(|route| SitemapEntry {
            loc: format!("{root}{route}"),
            lastmod: now.clone(),
        })
        .collect();

    let pastes = run_blocking(&state, |db| db.all_listed_pastes()).await?;
    pages.extend(pastes.into_iter().map(Paste::from).map(|paste| SitemapEntry {
        loc: format!("{root}/{}", paste.external_id),
        lastmod: templates::format_time(&paste.created_at),
    }));

    let mut context = Context::new();
    context.insert("pages", &pages);
    let body = templates::render("sitemap.xml", &context)?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitemap_template_escapes_urls() {
        let mut context = Context::new();
        context.insert(
            "pages",
            &vec![SitemapEntry {
                loc: "http://example.com/a&b".into(),
                lastmod: "2024-01-02 03:04".into(),
            }],
        );
        let xml = templates::render("sitemap.xml", &context).unwrap();
        assert!(xml.contains("<loc>http://example.com/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-01-02 03:04</lastmod>"));
    }
}
