use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use tribune_db::models::{AuthorRow, UserRow};
use tribune_types::api::ProfileResponse;
use tribune_types::models::{Notification, profile_path};

use crate::auth::{AppState, AppStateInner};
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Viewer;
use crate::present::{self, ViewerFlags};
use crate::threads::with_updates;

const PROFILE_THREADS: u32 = 50;
const PROFILE_ACTIVITIES: u32 = 50;

pub async fn show_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ProfileResponse>> {
    let viewer_id = viewer.id().map(|id| id.to_string());

    let (user, rows, activities, subscribed) = blocking(&state, move |state| {
        let user = find_user(state, &name)?;
        let threads = state.db.threads_by_user(&user.id, PROFILE_THREADS)?;
        let activities = state.db.get_activities(&user.id, PROFILE_ACTIVITIES)?;
        let subscribed = match viewer_id {
            Some(id) => state.db.subscribed_thread_ids(&id)?,
            None => HashSet::new(),
        };
        Ok((user, threads, activities, subscribed))
    })
    .await?;

    let mut threads = Vec::with_capacity(rows.len());
    for row in &rows {
        let flags = ViewerFlags {
            is_subscribed_to: subscribed.contains(&row.id),
            has_updates: None,
        };
        threads.push(with_updates(&state, &viewer, present::thread(row, flags)).await);
    }

    let user = present::user(&AuthorRow::from(user));

    Ok(Json(ProfileResponse {
        path: profile_path(&user.name),
        user,
        threads,
        activities: activities.iter().filter_map(present::activity).collect(),
    }))
}

/// Unread notifications, visible only to their owner.
pub async fn notifications(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<Vec<Notification>>> {
    let viewer_id = viewer.require()?.sub.to_string();

    let rows = blocking(&state, move |state| {
        let user = find_user(state, &name)?;
        if user.id != viewer_id {
            return Err(ApiError::Forbidden);
        }
        Ok(state.db.unread_notifications(&user.id)?)
    })
    .await?;

    Ok(Json(rows.iter().map(present::notification).collect()))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((name, notification_id)): Path<(String, Uuid)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<StatusCode> {
    let viewer_id = viewer.require()?.sub.to_string();

    blocking(&state, move |state| {
        let user = find_user(state, &name)?;
        if user.id != viewer_id {
            return Err(ApiError::Forbidden);
        }
        if !state
            .db
            .mark_notification_read(&notification_id.to_string(), &user.id)?
        {
            return Err(ApiError::NotFound("notification"));
        }
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn find_user(state: &AppStateInner, name: &str) -> ApiResult<UserRow> {
    state
        .db
        .get_user_by_name(name)?
        .ok_or(ApiError::NotFound("user"))
}
