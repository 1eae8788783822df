use crate::config::{self, ConfigScope};
use crate::ipc::error::{db_err, err, ok};
use crate::ipc::helpers::{get_optional_i64, get_required_i64};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let course_id = match get_required_i64(&req.params, "courseId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match config::describe(conn, course_id) {
        Ok(v) => ok(&req.id, v),
        Err(e) => db_err(&req.id, "db_query_failed", &e),
    }
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(scope_raw) = req.params.get("scope").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing scope", None);
    };
    let Some(scope) = ConfigScope::parse(scope_raw) else {
        return err(&req.id, "bad_params", "scope must be one of: course, plugin", None);
    };
    let course_id = match get_optional_i64(&req.params, "courseId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    if scope == ConfigScope::Course && course_id.is_none() {
        return err(&req.id, "bad_params", "course scope requires courseId", None);
    }
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let loaded = match (scope, course_id) {
        (ConfigScope::Course, Some(id)) => config::load_course(conn, id),
        _ => config::load_plugin(conn),
    };
    let mut current = match loaded {
        Ok(v) => v,
        Err(e) => return db_err(&req.id, "db_query_failed", &e),
    };
    if let Err(msg) = config::merge_patch(scope, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = config::save(conn, scope, course_id, &current) {
        return db_err(&req.id, "db_update_failed", &e);
    }
    tracing::info!(scope = scope_raw, course_id = ?course_id, "config updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        _ => None,
    }
}
