//! Cookie-backed sessions, flash messages and the per-request context.
//!
//! The session cookie holds a signed token naming the user's email and
//! display name. [`resolve_identity`] runs before every handler, resolves
//! that email to a [`User`] and stores a [`RequestContext`] in the request
//! extensions, where handlers pick it up as an extractor.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pasteboard_types::models::User;
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::{debug, error, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::templates;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";
const SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub name: String,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Message,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

pub fn encode_session(secret: &[u8], email: &str, name: &str) -> anyhow::Result<String> {
    let claims = SessionClaims {
        email: email.to_string(),
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))?;
    Ok(token)
}

pub fn decode_session(secret: &[u8], token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| debug!("Ignoring session cookie: {}", e))
        .ok()
}

/// Add a session cookie for `user` to the jar.
pub fn start_session(jar: CookieJar, secret: &[u8], user: &User) -> Result<CookieJar, AppError> {
    let token = encode_session(secret, &user.email, &user.name)
        .map_err(|e| AppError::Internal(format!("session token: {e}")))?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn encode_flashes(flashes: &[Flash]) -> String {
    let json = serde_json::to_vec(flashes).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_flashes(value: &str) -> Vec<Flash> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

/// Who is asking, plus the flash messages bound for the next rendered page.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Present whenever a validly signed session cookie came in.
    pub session: Option<SessionClaims>,
    /// The account behind the session, if it still exists.
    pub user: Option<User>,
    flashes: Vec<Flash>,
}

impl RequestContext {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(Flash {
            category: FlashCategory::Message,
            message: message.into(),
        });
    }

    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flashes.push(Flash {
            category: FlashCategory::Error,
            message: message.into(),
        });
    }

    /// Render a page, showing and consuming every pending flash.
    pub fn render(self, jar: CookieJar, template: &str, mut context: Context) -> Result<Response, AppError> {
        context.insert("flashes", &self.flashes);
        context.insert("current_user", &self.session.as_ref().map(|s| s.name.as_str()));
        let html = templates::render(template, &context)?;

        let jar = if jar.get(FLASH_COOKIE).is_some() {
            jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
        } else {
            jar
        };
        Ok((jar, Html(html)).into_response())
    }

    /// Redirect, carrying pending flashes forward in a cookie.
    pub fn redirect(self, jar: CookieJar, to: &str) -> Response {
        let jar = if self.flashes.is_empty() {
            jar
        } else {
            let cookie = Cookie::build((FLASH_COOKIE, encode_flashes(&self.flashes)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            jar.add(cookie)
        };
        (jar, Redirect::to(to)).into_response()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<RequestContext>().cloned().unwrap_or_default())
    }
}

/// Resolve the session cookie into a [`RequestContext`] before the handler runs.
/// Any failure leaves the request anonymous.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let mut ctx = RequestContext {
        flashes: jar
            .get(FLASH_COOKIE)
            .map(|c| decode_flashes(c.value()))
            .unwrap_or_default(),
        ..Default::default()
    };

    if let Some(claims) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| decode_session(&state.config.secret_key, c.value()))
    {
        let db = state.clone();
        let email = claims.email.clone();
        match tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email)).await {
            Ok(Ok(Some(row))) => ctx.user = Some(row.into()),
            Ok(Ok(None)) => debug!("Session for {} has no matching user", claims.email),
            Ok(Err(e)) => warn!("Session user lookup failed: {}", e),
            Err(e) => error!("spawn_blocking join error: {}", e),
        }
        ctx.session = Some(claims);
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
