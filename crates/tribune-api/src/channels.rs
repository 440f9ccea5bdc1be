use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use tribune_db::{is_unique_violation, slug::slugify};
use tribune_types::api::CreateChannelRequest;
use tribune_types::models::Channel;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Viewer;
use crate::present;

const MAX_NAME_LEN: usize = 50;

/// Channel slugs that would shadow a fixed route under `/threads`.
const RESERVED_SLUGS: &[&str] = &["search"];

pub async fn list_channels(State(state): State<AppState>) -> ApiResult<Json<Vec<Channel>>> {
    let rows = blocking(&state, |state| Ok(state.db.list_channels()?)).await?;
    Ok(Json(rows.iter().map(present::channel).collect()))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateChannelRequest>,
) -> ApiResult<impl IntoResponse> {
    viewer.require()?;

    let name = req.name.trim().to_string();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!("name must be 1 to {} characters", MAX_NAME_LEN)));
    }

    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(ApiError::BadRequest("name must contain letters or digits".into()));
    }
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(ApiError::Conflict(format!("'{}' is reserved", slug)));
    }

    let channel_id = Uuid::new_v4().to_string();

    let row = blocking(&state, move |state| {
        state
            .db
            .create_channel(&channel_id, &name, &slug)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("channel already exists".into())
                } else {
                    ApiError::Internal(e)
                }
            })?;

        state
            .db
            .get_channel_by_id(&channel_id)?
            .ok_or(ApiError::NotFound("channel"))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(present::channel(&row))))
}
