use axum::{
    extract::{Query, State},
    Json,
};
use proctor::{mutex, MutexRequest, ReadMode, ServedBy};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult},
    extract::Payload,
    identity::Teacher,
    AppState,
};

pub async fn ricart_agarwala(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
    input: Payload,
) -> ApiResult<Json<Value>> {
    let requests = match input.get("requests") {
        None => Vec::new(),
        Some(Value::Array(items)) => {
            MutexRequest::parse_all(items).map_err(|_| ApiError::BadRequest("bad_requests"))?
        }
        Some(_) => return Err(ApiError::BadRequest("bad_requests")),
    };

    let schedule = mutex::simulate(&requests);

    state
        .audit
        .record(
            teacher
                .audit("ricart_agarwala")
                .meta(json!({ "order": schedule.order }))?,
        )
        .await?;

    Ok(Json(json!({
        "ok": true,
        "order": schedule.order,
        "log": schedule.log,
    })))
}

pub async fn lb_process(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
    input: Payload,
) -> ApiResult<Json<Value>> {
    let payload = input.get("payload").cloned().unwrap_or_else(|| json!({}));

    let dispatched = match state.dispatcher.dispatch(payload.clone()).await {
        Ok(dispatched) => dispatched,
        Err(e) => {
            if let proctor::Error::BothPathsFailed { primary, backup } = &e {
                state
                    .audit
                    .record(teacher.audit("lb_error").meta(json!({
                        "payload": payload,
                        "primary_error": primary,
                        "backup_error": backup,
                    }))?)
                    .await?;
            }

            return Err(e.into());
        }
    };

    let entry = match dispatched.path {
        ServedBy::Primary => teacher.audit("lb_primary").meta(json!({ "payload": payload }))?,
        ServedBy::Backup => teacher.audit("lb_backup").meta(json!({
            "payload": payload,
            "primary_error": dispatched.primary_error,
        }))?,
    };

    state.audit.record(entry).await?;

    let mut body = serde_json::to_value(&dispatched).map_err(proctor::Error::from)?;
    body["ok"] = Value::Bool(true);

    Ok(Json(body))
}

pub async fn consistency_write(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
    input: Payload,
) -> ApiResult<Json<Value>> {
    let key = input.text("key").ok_or(ApiError::BadRequest("missing_key"))?;
    let value = input.get("value").cloned().unwrap_or(Value::Null);

    state.store.write(key, value.clone())?;

    state
        .audit
        .record(
            teacher
                .audit("consistency_write")
                .meta(json!({ "key": key, "value": value }))?,
        )
        .await?;

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadInput {
    key: Option<String>,
    mode: Option<String>,
}

pub async fn consistency_read(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
    input: Option<Query<ReadInput>>,
) -> ApiResult<Json<Value>> {
    let Query(input) = input.unwrap_or_default();

    let key = input
        .key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(ApiError::BadRequest("missing_key"))?;

    let mode = match input.mode.as_deref() {
        None => ReadMode::Eventual,
        Some(mode) => mode
            .trim()
            .parse::<ReadMode>()
            .map_err(|_| ApiError::BadRequest("bad_mode"))?,
    };

    let value = state.store.read(key, mode)?;

    state
        .audit
        .record(
            teacher
                .audit("consistency_read")
                .meta(json!({ "key": key, "mode": mode, "value": value }))?,
        )
        .await?;

    Ok(Json(json!({
        "ok": true,
        "mode": mode,
        "key": key,
        "value": value,
    })))
}

const DEFAULT_LOG_LIMIT: usize = 300;

#[derive(Debug, Default, Deserialize)]
pub struct LogsInput {
    limit: Option<usize>,
}

/// Recent `cheating_detected` journal entries, newest first.
///
/// Entries without an exam id are skipped. Restricting the list to exams the
/// teacher owns is left to the journal backing the exam catalogue.
pub async fn cheating_logs(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
    input: Option<Query<LogsInput>>,
) -> ApiResult<Json<Value>> {
    let limit = input
        .and_then(|Query(input)| input.limit)
        .unwrap_or(DEFAULT_LOG_LIMIT);

    let logs = state
        .audit
        .recent_of("cheating_detected", limit)
        .await?
        .into_iter()
        .filter_map(|entry| {
            let exam_id = entry.meta.get("exam_id").and_then(Value::as_i64)?;

            Some(json!({
                "id": entry.id,
                "student_id": entry.who_user_id,
                "student_username": entry.username,
                "exam_id": exam_id,
                "cheating_count": entry.meta.get("cheating_count").cloned().unwrap_or(json!(0)),
                "created_at": entry.created_at.to_rfc3339(),
            }))
        })
        .collect::<Vec<_>>();

    state
        .audit
        .record(
            teacher
                .audit("view_cheating_logs")
                .meta(json!({ "count": logs.len() }))?,
        )
        .await?;

    Ok(Json(json!({ "ok": true, "logs": logs })))
}
