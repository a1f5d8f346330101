pub mod auth;
pub mod config;
pub mod diff;
pub mod error;
pub mod pastes;
pub mod session;
pub mod site;
pub mod state;
pub mod templates;

use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::AppError;
pub use pasteboard_db::Database;
pub use state::{AppState, AppStateInner};

/// GET routes that take no path arguments; listed in the sitemap.
pub const ARGUMENT_FREE_ROUTES: &[&str] = &[
    "/",
    "/diff",
    "/my_pastes",
    "/archive",
    "/about",
    "/feedback",
    "/robots.txt",
    "/sitemap.xml",
    "/login",
    "/signup",
    "/logout",
];

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pastes::home).post(pastes::create_paste))
        .route("/diff", get(diff::show_diff))
        .route("/my_pastes", get(pastes::my_pastes))
        .route("/archive", get(pastes::archive))
        .route("/archive/{page}", get(pastes::archive_page))
        .route("/about", get(site::about))
        .route("/feedback", get(site::feedback))
        .route("/robots.txt", get(site::robots))
        .route("/sitemap.xml", get(site::sitemap))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/{paste_id}", get(pastes::show_paste).post(pastes::comment_on_paste))
        .route("/{paste_id}/raw", get(pastes::raw_paste))
        .route(
            "/{paste_id}/delete",
            get(pastes::confirm_delete).post(pastes::delete_paste),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    session::resolve_identity,
                )),
        )
        .with_state(state)
}
