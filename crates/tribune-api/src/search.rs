use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::warn;

use tribune_db::Database;
use tribune_db::models::ThreadRow;
use tribune_types::api::SearchRecord;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::present;
use crate::sanitize::plain_text;

const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Every whitespace-separated term must appear in the title or body.
pub async fn search_threads(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchRecord>>> {
    let terms: Vec<String> = query.q.split_whitespace().map(str::to_string).collect();
    if terms.is_empty() {
        return Err(ApiError::BadRequest("query is required".into()));
    }

    let records = blocking(&state, move |state| {
        let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
        Ok(state.db.search_threads(&terms, SEARCH_LIMIT)?)
    })
    .await?;

    let results = records
        .iter()
        .filter_map(|raw| match serde_json::from_str::<SearchRecord>(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable search record: {}", e);
                None
            }
        })
        .collect();

    Ok(Json(results))
}

/// Write the thread's current search record. Called after every change to a thread.
pub(crate) fn reindex(db: &Database, row: &ThreadRow) -> anyhow::Result<()> {
    let record = present::search_record(row);
    let content = format!("{} {}", record.title, plain_text(&record.body));
    db.index_thread(&row.id, &serde_json::to_string(&record)?, &content)
}
