use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use tribune_db::is_unique_violation;
use tribune_db::models::ThreadRow;
use tribune_types::api::{CreateThreadRequest, ThreadDetailResponse, ThreadResponse};

use crate::auth::{AppState, AppStateInner};
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Viewer;
use crate::present::{self, ViewerFlags};
use crate::search::reindex;

const LIST_LIMIT: u32 = 100;
const MAX_TITLE_LEN: usize = 200;

pub async fn list_threads(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<Vec<ThreadResponse>>> {
    Ok(Json(thread_listing(&state, &viewer, None).await?))
}

pub async fn channel_threads(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<Vec<ThreadResponse>>> {
    Ok(Json(thread_listing(&state, &viewer, Some(channel)).await?))
}

pub async fn show_thread(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ThreadDetailResponse>> {
    let viewer_id = viewer.id();

    let (row, replies, is_subscribed_to) = blocking(&state, move |state| {
        let row = find_thread(state, &channel, &slug)?;
        let replies = state.db.get_replies(&row.id)?;
        let subscribed = is_subscribed(state, &row, viewer_id)?;
        Ok((row, replies, subscribed))
    })
    .await?;

    // Updates are judged against the previous visit, then this visit is recorded
    let thread = with_updates(&state, &viewer, present::thread(&row, ViewerFlags { is_subscribed_to, has_updates: None })).await;
    if let Some(user_id) = viewer_id {
        state.visits.record(user_id, thread.id).await;
    }

    let replies = replies
        .iter()
        .map(|r| present::reply(r, row.best_reply_id.as_deref()))
        .collect();

    Ok(Json(ThreadDetailResponse { thread, replies }))
}

pub async fn create_thread(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = viewer.require()?;

    let title = req.title.trim().to_string();
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!("title must be 1 to {} characters", MAX_TITLE_LEN)));
    }
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("body is required".into()));
    }

    let thread_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();

    let row = blocking(&state, move |state| {
        ensure_user(state, &user_id)?;

        let channel_id = req.channel_id.to_string();
        if state.db.get_channel_by_id(&channel_id)?.is_none() {
            return Err(ApiError::Unprocessable("channel does not exist".into()));
        }

        state
            .db
            .create_thread(&thread_id, &channel_id, &user_id, &title, &req.body)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("a thread with this slug was just created, try again".into())
                } else {
                    ApiError::Internal(e)
                }
            })?;

        let row = load(state, &thread_id)?;
        reindex(&state.db, &row)?;
        Ok(row)
    })
    .await?;

    let thread = with_updates(&state, &viewer, present::thread(&row, ViewerFlags::default())).await;
    Ok((StatusCode::CREATED, Json(thread)))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<StatusCode> {
    let user_id = viewer.require()?.sub.to_string();

    blocking(&state, move |state| {
        let row = find_thread(state, &channel, &slug)?;
        if row.creator.id != user_id {
            return Err(ApiError::Forbidden);
        }
        state.db.delete_thread(&row.id)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn lock_thread(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ThreadResponse>> {
    set_locked(state, viewer, channel, slug, true).await
}

pub async fn unlock_thread(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ThreadResponse>> {
    set_locked(state, viewer, channel, slug, false).await
}

async fn set_locked(
    state: AppState,
    viewer: Viewer,
    channel: String,
    slug: String,
    locked: bool,
) -> ApiResult<Json<ThreadResponse>> {
    let user_id = viewer.require()?.sub;

    let (row, is_subscribed_to) = blocking(&state, move |state| {
        let row = find_thread(state, &channel, &slug)?;
        if row.creator.id != user_id.to_string() {
            return Err(ApiError::Forbidden);
        }
        state.db.set_thread_locked(&row.id, locked)?;
        refresh(state, &row.id, Some(user_id))
    })
    .await?;

    let thread = present::thread(&row, ViewerFlags { is_subscribed_to, has_updates: None });
    Ok(Json(with_updates(&state, &viewer, thread).await))
}

/// Only the thread's creator may pick the best reply, and only among its own replies.
pub async fn mark_best_reply(
    State(state): State<AppState>,
    Path((channel, slug, reply_id)): Path<(String, String, Uuid)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ThreadResponse>> {
    let user_id = viewer.require()?.sub;

    let (row, is_subscribed_to) = blocking(&state, move |state| {
        let row = find_thread(state, &channel, &slug)?;
        if row.creator.id != user_id.to_string() {
            return Err(ApiError::Forbidden);
        }

        let reply = state
            .db
            .get_reply(&reply_id.to_string())?
            .filter(|reply| reply.thread_id == row.id)
            .ok_or(ApiError::NotFound("reply"))?;

        state.db.mark_best_reply(&row.id, &reply.id)?;
        refresh(state, &row.id, Some(user_id))
    })
    .await?;

    let thread = present::thread(&row, ViewerFlags { is_subscribed_to, has_updates: None });
    Ok(Json(with_updates(&state, &viewer, thread).await))
}

/// Resolves `/threads/{channel}/{thread}`. A slug filed under another channel is a 404.
pub(crate) fn find_thread(state: &AppStateInner, channel_slug: &str, thread_slug: &str) -> ApiResult<ThreadRow> {
    let row = state
        .db
        .get_thread_by_slug(thread_slug)?
        .ok_or(ApiError::NotFound("thread"))?;

    if row.channel.slug != channel_slug {
        return Err(ApiError::NotFound("thread"));
    }
    Ok(row)
}

/// A validly signed token can outlive its user row.
pub(crate) fn ensure_user(state: &AppStateInner, user_id: &str) -> ApiResult<()> {
    match state.db.get_user_by_id(user_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::Unauthorized),
    }
}

pub(crate) fn load(state: &AppStateInner, thread_id: &str) -> ApiResult<ThreadRow> {
    state
        .db
        .get_thread(thread_id)?
        .ok_or(ApiError::NotFound("thread"))
}

/// Reloads a changed thread and brings its search record up to date.
fn refresh(state: &AppStateInner, thread_id: &str, viewer_id: Option<Uuid>) -> ApiResult<(ThreadRow, bool)> {
    let row = load(state, thread_id)?;
    reindex(&state.db, &row)?;
    let subscribed = is_subscribed(state, &row, viewer_id)?;
    Ok((row, subscribed))
}

fn is_subscribed(state: &AppStateInner, row: &ThreadRow, viewer_id: Option<Uuid>) -> ApiResult<bool> {
    match viewer_id {
        Some(id) => Ok(state.db.is_subscribed(&row.id, &id.to_string())?),
        None => Ok(false),
    }
}

pub(crate) async fn with_updates(state: &AppState, viewer: &Viewer, mut thread: ThreadResponse) -> ThreadResponse {
    if let Some(user_id) = viewer.id() {
        thread.has_updates = Some(state.visits.has_updates_for(user_id, thread.id, thread.updated_at).await);
    }
    thread
}

async fn thread_listing(
    state: &AppState,
    viewer: &Viewer,
    channel: Option<String>,
) -> ApiResult<Vec<ThreadResponse>> {
    let viewer_id = viewer.id().map(|id| id.to_string());

    let (rows, subscribed) = blocking(state, move |state| {
        if let Some(slug) = &channel {
            if state.db.get_channel_by_slug(slug)?.is_none() {
                return Err(ApiError::NotFound("channel"));
            }
        }

        let rows = state.db.list_threads(channel.as_deref(), LIST_LIMIT)?;
        let subscribed = match viewer_id {
            Some(id) => state.db.subscribed_thread_ids(&id)?,
            None => HashSet::new(),
        };
        Ok((rows, subscribed))
    })
    .await?;

    let mut threads = Vec::with_capacity(rows.len());
    for row in &rows {
        let flags = ViewerFlags {
            is_subscribed_to: subscribed.contains(&row.id),
            has_updates: None,
        };
        threads.push(with_updates(state, viewer, present::thread(row, flags)).await);
    }
    Ok(threads)
}
