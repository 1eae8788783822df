use crate::ipc::error::{db_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::snapshot::{self, Snapshot};
use serde_json::json;

fn handle_snapshot_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let snap: Snapshot = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid snapshot: {}", e), None),
    };

    match snapshot::import(conn, &snap) {
        Ok(counts) => ok(
            &req.id,
            json!({ "courseId": snap.course.id, "counts": counts }),
        ),
        Err(e) => db_err(&req.id, "db_insert_failed", &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "snapshot.import" => Some(handle_snapshot_import(state, req)),
        _ => None,
    }
}
