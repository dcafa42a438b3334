use axum::{extract::State, Json};
use proctor::{grading, Submission};
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult},
    extract::Payload,
    identity::Student,
    AppState,
};

/// Proctoring signal reported by the exam page, e.g. `exam_start` or `cheating_detected`.
pub async fn event(
    Student(student): Student,
    State(state): State<AppState>,
    input: Payload,
) -> ApiResult<Json<Value>> {
    let mut input = input.into_inner();

    let kind = match input.remove("type") {
        Some(Value::String(kind)) if !kind.trim().is_empty() => kind.trim().to_owned(),
        _ => return Err(ApiError::BadRequest("missing_type")),
    };

    let event = grading::signal_event(
        &kind,
        student.user_id,
        student.username.as_deref(),
        input.clone(),
    )?;

    state.broadcaster.publish(event);

    state
        .audit
        .record(student.audit(format!("event_{kind}")).meta(input)?)
        .await?;

    Ok(Json(json!({ "ok": true })))
}

/// Applies the cheating penalty to an already scored attempt and notifies live monitors.
pub async fn submit_exam(
    Student(student): Student,
    State(state): State<AppState>,
    input: Payload,
) -> ApiResult<Json<Value>> {
    let (Some(exam_id), Some(original_marks)) = (input.int("exam_id"), input.number("original_marks"))
    else {
        return Err(ApiError::BadRequest("missing_data"));
    };

    // anything but a non-negative count reads as no flags
    let cheating_count = input
        .int("cheating_count")
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0);

    let submission = Submission {
        student_id: student.user_id,
        student_username: student.username.to_owned(),
        exam_id,
        original_marks,
        cheating_count,
    };

    let graded = submission.grade();

    state
        .audit
        .record(student.audit("submit_exam").meta(json!({
            "exam_id": exam_id,
            "original_marks": original_marks,
            "final_marks": graded.final_marks,
            "cheating_count": graded.cheating_count,
        }))?)
        .await?;

    if graded.cheating_count > 0 {
        state
            .audit
            .record(student.audit("cheating_detected").meta(json!({
                "exam_id": exam_id,
                "cheating_count": graded.cheating_count,
            }))?)
            .await?;
    }

    state.broadcaster.publish(submission.to_event(&graded)?);

    Ok(Json(json!({
        "ok": true,
        "total_marks": graded.final_marks,
        "original_marks": original_marks,
        "cheating_penalty": graded.penalty,
    })))
}
