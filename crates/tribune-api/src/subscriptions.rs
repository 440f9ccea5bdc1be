use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use tribune_types::api::SubscriptionResponse;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::middleware::Viewer;
use crate::threads::{ensure_user, find_thread};

/// Subscribing twice is a no-op.
pub async fn subscribe(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let user_id = viewer.require()?.sub.to_string();

    blocking(&state, move |state| {
        ensure_user(state, &user_id)?;
        let thread = find_thread(state, &channel, &slug)?;
        state
            .db
            .subscribe(&Uuid::new_v4().to_string(), &thread.id, &user_id)?;
        Ok(())
    })
    .await?;

    Ok(Json(SubscriptionResponse { subscribed: true }))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Path((channel, slug)): Path<(String, String)>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let user_id = viewer.require()?.sub.to_string();

    blocking(&state, move |state| {
        let thread = find_thread(state, &channel, &slug)?;
        state.db.unsubscribe(&thread.id, &user_id)?;
        Ok(())
    })
    .await?;

    Ok(Json(SubscriptionResponse { subscribed: false }))
}
