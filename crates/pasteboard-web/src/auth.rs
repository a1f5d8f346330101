use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use pasteboard_crypto::password::{hash_password, verify_password};
use pasteboard_types::forms::{FormErrors, LoginForm, SignupForm, Validate};
use pasteboard_types::models::User;
use tera::Context;
use tracing::{info, warn};

use crate::error::AppError;
use crate::session::{RequestContext, end_session, start_session};
use crate::state::{AppState, run_blocking};

enum SignupOutcome {
    NameTaken,
    EmailTaken,
    Created(User),
}

fn signup_context(form: &SignupForm, errors: &FormErrors) -> Context {
    let mut context = Context::new();
    context.insert("name", &form.name);
    context.insert("email", &form.email);
    context.insert("errors", errors);
    context
}

fn login_context(form: &LoginForm, errors: &FormErrors) -> Context {
    let mut context = Context::new();
    context.insert("email", &form.email);
    context.insert("errors", errors);
    context
}

pub async fn signup_page(mut ctx: RequestContext, jar: CookieJar) -> Result<Response, AppError> {
    if ctx.has_session() {
        ctx.flash("you are already signed up");
        return Ok(ctx.redirect(jar, "/"));
    }
    ctx.render(jar, "signup.html", signup_context(&SignupForm::default(), &FormErrors::default()))
}

pub async fn signup(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if ctx.has_session() {
        ctx.flash("you are already signed up");
        return Ok(ctx.redirect(jar, "/"));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return ctx.render(jar, "signup.html", signup_context(&form, &errors));
    }

    let name = form.name.clone();
    let email = form.email.clone();
    let password = form.password.clone();
    let outcome = run_blocking(&state, move |db| {
        if db.get_user_by_name(&name)?.is_some() {
            return Ok(SignupOutcome::NameTaken);
        }
        if db.get_user_by_email(&email)?.is_some() {
            return Ok(SignupOutcome::EmailTaken);
        }

        let password_hash = hash_password(&password)?;
        db.create_user(&name, &email, &password_hash)?;
        let row = db
            .get_user_by_email(&email)?
            .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", email))?;
        Ok(SignupOutcome::Created(row.into()))
    })
    .await?;

    match outcome {
        SignupOutcome::Created(user) => {
            info!("User {} registered", user.name);
            let jar = start_session(jar, &state.config.secret_key, &user)?;
            ctx.flash("Thanks for registering. You are now logged in!");
            Ok(ctx.redirect(jar, "/"))
        }
        SignupOutcome::EmailTaken => {
            warn!("Signup rejected: email {} already registered", form.email);
            ctx.flash_error("email already exists. Choose another one!");
            ctx.render(jar, "signup.html", signup_context(&form, &FormErrors::default()))
        }
        SignupOutcome::NameTaken => {
            warn!("Signup rejected: name {} already registered", form.name);
            ctx.flash_error("username already exists. Choose another one!");
            ctx.render(jar, "signup.html", signup_context(&form, &FormErrors::default()))
        }
    }
}

pub async fn login_page(mut ctx: RequestContext, jar: CookieJar) -> Result<Response, AppError> {
    if ctx.has_session() {
        ctx.flash("you are already logged in");
        return Ok(ctx.redirect(jar, "/"));
    }
    ctx.render(jar, "login.html", login_context(&LoginForm::default(), &FormErrors::default()))
}

pub async fn login(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if ctx.has_session() {
        ctx.flash("you are already logged in");
        return Ok(ctx.redirect(jar, "/"));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return ctx.render(jar, "login.html", login_context(&form, &errors));
    }

    let email = form.email.clone();
    let password = form.password.clone();
    let user = run_blocking(&state, move |db| {
        let user = db
            .get_user_by_email(&email)?
            .filter(|row| verify_password(&password, &row.password))
            .map(User::from);
        Ok(user)
    })
    .await?;

    match user {
        Some(user) => {
            info!("User {} logged in", user.name);
            let jar = start_session(jar, &state.config.secret_key, &user)?;
            ctx.flash("Thanks for logging in");
            Ok(ctx.redirect(jar, "/"))
        }
        None => {
            warn!("Failed login for {}", form.email);
            ctx.flash_error("Sorry! no user exists with this email and password");
            ctx.render(jar, "login.html", login_context(&form, &FormErrors::default()))
        }
    }
}

/// Clears the session and returns to the referring page.
pub async fn logout(mut ctx: RequestContext, jar: CookieJar, headers: HeaderMap) -> Response {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/")
        .to_string();

    let jar = end_session(jar);
    ctx.flash("You were successfully logged out");
    ctx.redirect(jar, &target)
}
