use crate::access;
use crate::config;
use crate::host;
use crate::ipc::error::{db_err, err, ok};
use crate::ipc::helpers::{get_optional_i64, get_required_i64};
use crate::ipc::types::{AppState, Request};
use crate::table;
use serde_json::json;

fn handle_students_visible(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (course_id, viewer_id, group) = match (
        get_required_i64(&req.params, "courseId"),
        get_required_i64(&req.params, "viewerId"),
        get_optional_i64(&req.params, "group"),
    ) {
        (Ok(c), Ok(v), Ok(g)) => (c, v, g),
        (Err(msg), _, _) | (_, Err(msg), _) | (_, _, Err(msg)) => {
            return err(&req.id, "bad_params", msg, None)
        }
    };

    match host::course_exists(conn, course_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    }
    let cfg = match config::resolve(conn, course_id) {
        Ok(v) => v,
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    };
    let audience = match table::audience(conn, course_id, viewer_id, group) {
        Ok(v) => v,
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    };

    let private_view = access::is_private_view(cfg.private_view, &audience.viewer);
    let allowed = audience.students.len();
    let rows = access::visible_rows(audience.students, viewer_id, private_view);
    ok(
        &req.id,
        json!({
            "selectedGroup": audience.selected_group,
            "groups": audience
                .course_groups
                .iter()
                .map(|(id, name)| json!({ "id": id, "name": name }))
                .collect::<Vec<_>>(),
            "privateView": private_view,
            "capabilities": audience.viewer.caps,
            "allowedCount": allowed,
            "students": rows,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.visible" => Some(handle_students_visible(state, req)),
        _ => None,
    }
}
