use crate::grade_pass::{self, GradePassUpdate};
use crate::host;
use crate::ipc::error::{db_err, err, ok};
use crate::ipc::helpers::{get_bool, get_lang, get_number_as_i64, get_optional_i64, get_required_i64};
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::table::{self, TableRequest};
use serde_json::{json, Value};

fn parse_table_request(params: &Value) -> Result<TableRequest, String> {
    Ok(TableRequest {
        course_id: get_required_i64(params, "courseId")?,
        viewer_id: get_required_i64(params, "viewerId")?,
        group: get_optional_i64(params, "group")?,
        page: get_optional_i64(params, "page")?.unwrap_or(0),
        editing: get_bool(params, "editing"),
        lang: get_lang(params),
        sesskey: params
            .get("sesskey")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        section_return: get_optional_i64(params, "sectionReturn")?.unwrap_or(0),
    })
}

/// A pending threshold edit. An unreadable one is kept as `Err` with whatever
/// item id could be read, so the table still renders with a failure message.
fn parse_update(params: &Value) -> Option<Result<GradePassUpdate, Option<i64>>> {
    let u = params.get("update").filter(|v| !v.is_null())?;
    let grade_item_id = get_required_i64(u, "gradeItemId").ok();
    let parsed = grade_item_id.and_then(|id| {
        get_number_as_i64(u, "gradePass")
            .ok()
            .map(|grade_pass| GradePassUpdate {
                grade_item_id: id,
                grade_pass,
            })
    });
    Some(parsed.ok_or(grade_item_id))
}

fn handle_table_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let table_req = match parse_table_request(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    match host::course_exists(conn, table_req.course_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    }

    // A pending threshold edit is applied before the table is read back.
    let message = match parse_update(&req.params) {
        Some(update) => {
            let caps = match host::user_capabilities(conn, table_req.course_id, table_req.viewer_id) {
                Ok(v) => v,
                Err(e) => return db_err(&req.id, "db_query_failed", &e),
            };
            let outcome = match update {
                Ok(update) => grade_pass::apply(conn, table_req.course_id, &caps, update),
                Err(item_id) => {
                    tracing::debug!(item_id = ?item_id, "unreadable grade to pass update");
                    Err(grade_pass::reject_invalid(conn, table_req.course_id, &caps, item_id))
                }
            };
            grade_pass::flash_message(table_req.lang, &outcome)
        }
        None => None,
    };

    let table = match table::build_grade_table(conn, &table_req, message) {
        Ok(v) => v,
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    };
    let html = render::render_grade_table(&table).into_string();
    ok(&req.id, json!({ "html": html, "table": table }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "table.get" => Some(handle_table_get(state, req)),
        _ => None,
    }
}
