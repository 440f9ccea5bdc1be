use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use tribune_types::api::AddReplyRequest;
use tribune_types::events::{ForumEvent, ReplyRef};

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Viewer;
use crate::present;
use crate::search::reindex;
use crate::threads::{ensure_user, find_thread, load};

const MAX_BODY_LEN: usize = 20_000;

/// Add a reply and tell the thread's subscribers about it.
pub async fn add_reply(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<AddReplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = viewer.require()?.clone();

    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("body is required".into()));
    }
    if req.body.len() > MAX_BODY_LEN {
        return Err(ApiError::BadRequest(format!("body must be at most {} bytes", MAX_BODY_LEN)));
    }

    let reply_id = Uuid::new_v4();
    let user_id = claims.sub.to_string();

    let (thread, reply) = blocking(&state, move |state| {
        ensure_user(state, &user_id)?;
        let thread = find_thread(state, &channel, &slug)?;
        if thread.locked {
            return Err(ApiError::Unprocessable("thread is locked".into()));
        }

        state
            .db
            .insert_reply(&reply_id.to_string(), &thread.id, &user_id, &req.body)?;

        let reply = state
            .db
            .get_reply(&reply_id.to_string())?
            .ok_or(ApiError::NotFound("reply"))?;

        // Reply count and updated_at both moved
        let thread = load(state, &thread.id)?;
        reindex(&state.db, &thread)?;
        Ok((thread, reply))
    })
    .await?;

    state.dispatcher.broadcast(ForumEvent::ThreadHasNewReply {
        thread: present::thread_ref(&thread),
        reply: ReplyRef {
            id: reply_id,
            user_id: claims.sub,
            owner_name: claims.name,
        },
    });

    Ok((
        StatusCode::CREATED,
        Json(present::reply(&reply, thread.best_reply_id.as_deref())),
    ))
}

/// Owners may delete their own replies.
pub async fn delete_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<StatusCode> {
    let user_id = viewer.require()?.sub.to_string();

    blocking(&state, move |state| {
        let reply = state
            .db
            .get_reply(&reply_id.to_string())?
            .ok_or(ApiError::NotFound("reply"))?;

        if reply.owner.id != user_id {
            return Err(ApiError::Forbidden);
        }

        state.db.delete_reply(&reply.id)?;

        let thread = load(state, &reply.thread_id)?;
        reindex(&state.db, &thread)?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
