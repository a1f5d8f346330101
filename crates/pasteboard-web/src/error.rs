use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::Context;
use thiserror::Error;

use crate::templates;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "The page you were looking for does not exist."),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "You are not allowed to do that."),
            _ => {
                tracing::error!("Internal error: {:?}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side.")
            }
        };

        let mut context = Context::new();
        context.insert("status", &status.as_u16());
        context.insert("message", message);
        match templates::render("error.html", &context) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, message.to_string()).into_response(),
        }
    }
}
