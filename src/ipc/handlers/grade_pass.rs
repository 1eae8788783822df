use crate::grade_pass::{self, GradePassError, GradePassUpdate};
use crate::host;
use crate::ipc::error::{db_err, err, ok};
use crate::ipc::helpers::{get_lang, get_number_as_i64, get_required_i64};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn parse_params(params: &Value) -> Result<(i64, i64, GradePassUpdate), String> {
    Ok((
        get_required_i64(params, "courseId")?,
        get_required_i64(params, "viewerId")?,
        GradePassUpdate {
            grade_item_id: get_required_i64(params, "gradeItemId")?,
            grade_pass: get_number_as_i64(params, "gradePass")?,
        },
    ))
}

fn handle_grade_pass_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (course_id, viewer_id, update) = match parse_params(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let lang = get_lang(&req.params);

    match host::course_exists(conn, course_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    }
    let caps = match host::user_capabilities(conn, course_id, viewer_id) {
        Ok(v) => v,
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    };

    let outcome = grade_pass::apply(conn, course_id, &caps, update);
    if matches!(outcome, Err(GradePassError::Forbidden)) {
        tracing::warn!(course_id, viewer_id, "grade to pass update refused");
        return err(&req.id, "forbidden", GradePassError::Forbidden.to_string(), None);
    }
    let label = outcome.as_ref().ok().map(|saved| saved.label.clone());
    let Some(message) = grade_pass::flash_message(lang, &outcome) else {
        return err(&req.id, "forbidden", "grade to pass update refused", None);
    };
    ok(
        &req.id,
        json!({
            "success": message.success,
            "message": message.message,
            "gradePass": label,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gradePass.update" => Some(handle_grade_pass_update(state, req)),
        _ => None,
    }
}
