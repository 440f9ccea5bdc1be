//! HTTP surface of the forum: handlers, request identity and the router.

pub mod auth;
pub mod channels;
pub mod error;
pub mod middleware;
pub mod present;
pub mod profiles;
pub mod replies;
pub mod sanitize;
pub mod search;
pub mod subscriptions;
pub mod threads;
pub mod visits;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiResult;

/// Every route, with viewer identification, CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/channels", get(channels::list_channels).post(channels::create_channel))
        .route("/threads", get(threads::list_threads).post(threads::create_thread))
        .route("/threads/search", get(search::search_threads))
        .route("/threads/{channel}", get(threads::channel_threads))
        .route(
            "/threads/{channel}/{thread}",
            get(threads::show_thread).delete(threads::delete_thread),
        )
        .route(
            "/threads/{channel}/{thread}/lock",
            post(threads::lock_thread).delete(threads::unlock_thread),
        )
        .route("/threads/{channel}/{thread}/replies", post(replies::add_reply))
        .route(
            "/threads/{channel}/{thread}/subscriptions",
            post(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
        .route(
            "/threads/{channel}/{thread}/best-reply/{reply_id}",
            post(threads::mark_best_reply),
        )
        .route("/replies/{reply_id}", delete(replies::delete_reply))
        .route("/profiles/{name}", get(profiles::show_profile))
        .route("/profiles/{name}/notifications", get(profiles::notifications))
        .route(
            "/profiles/{name}/notifications/{notification_id}",
            delete(profiles::mark_notification_read),
        )
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::identify))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run synchronous database work off the async executor.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state)).await?
}
