//! Route handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::error::SubmissionError;
use crate::export::{build_submission_csv, build_submission_json};
use crate::scoring::score_answers;
use crate::store::{
    SubmissionRecord, create_submission_id, filter_by_test_version, parse_limit,
};
use crate::util::{file_stamp, now_rfc3339};
use crate::validation::validate_submission;
use crate::web::auth::ClientAddress;
use crate::web::server::AppState;
use crate::web::types::{
    ApiError, HealthResponse, ListQuery, ListResponse, SERVICE_NAME, SubmitResponse,
};

const DEFAULT_LIST_LIMIT: usize = 50;
const DEFAULT_DOWNLOAD_LIMIT: usize = 500;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    require_json(&headers)?;
    state.enforce_rate_limit("submit", &client, state.rate_limits.max_submissions)?;
    state.access.check_submission(&headers)?;

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| SubmissionError::invalid("Invalid JSON body"))?;
    let submission = validate_submission(&payload, &state.scoring)?;
    let profile = score_answers(
        &submission.answers,
        submission.duration_minutes,
        state.scoring.min_duration_minutes,
        &submission.known_assessments,
    );

    let record = SubmissionRecord::new(create_submission_id(), now_rfc3339(), submission, profile);
    state.store.append(&record).await?;

    let emailed = match &state.notifier {
        Some(notifier) => notifier.notify(&record).await,
        None => false,
    };

    tracing::info!(
        submission_id = %record.submission_id,
        test_version = %record.test_version,
        client = %client,
        emailed,
        "Submission accepted"
    );

    Ok(Json(SubmitResponse {
        ok: true,
        submission_id: record.submission_id,
        emailed,
        profile: record.profile,
    }))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    state.enforce_rate_limit("admin-list", &client, state.rate_limits.max_admin)?;
    state.access.check_admin(&headers)?;

    let rows = load_filtered(&state, &query, DEFAULT_LIST_LIMIT).await?;
    Ok(Json(ListResponse {
        ok: true,
        count: rows.len(),
        rows,
    }))
}

pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    state.enforce_rate_limit("admin-download", &client, state.rate_limits.max_admin)?;
    state.access.check_admin(&headers)?;

    let rows = load_filtered(&state, &query, DEFAULT_DOWNLOAD_LIMIT).await?;
    let stamp = file_stamp(Utc::now());
    let format = query
        .format
        .as_deref()
        .map(|f| f.trim().to_lowercase())
        .unwrap_or_default();

    let (content_type, extension, body) = if format == "json" {
        let json = build_submission_json(&rows).map_err(crate::error::StorageError::from)?;
        ("application/json; charset=utf-8", "json", json)
    } else {
        ("text/csv; charset=utf-8", "csv", build_submission_csv(&rows))
    };

    let disposition = format!("attachment; filename=\"personality-submissions-{stamp}.{extension}\"");
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn load_filtered(
    state: &AppState,
    query: &ListQuery,
    default_limit: usize,
) -> Result<Vec<SubmissionRecord>, ApiError> {
    let limit = parse_limit(query.limit.as_deref(), default_limit);
    let rows = state.store.recent(limit).await?;
    Ok(filter_by_test_version(
        rows,
        query.test_version.as_deref().unwrap_or_default(),
    ))
}

fn require_json(headers: &HeaderMap) -> Result<(), SubmissionError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    if content_type.contains("application/json") {
        Ok(())
    } else {
        Err(SubmissionError::UnsupportedMediaType)
    }
}
