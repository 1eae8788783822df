mod test_support;

use serde_json::json;
use test_support::{sample_snapshot, spawn_sidecar, COURSE_ID, ESSAY, TEACHER};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let mut sidecar = spawn_sidecar();

    let health = sidecar.request_ok("health", json!({}));
    assert!(health["workspacePath"].is_null());

    // Everything but health needs a workspace.
    assert_eq!(
        sidecar.request_err("table.get", json!({ "courseId": COURSE_ID, "viewerId": TEACHER })),
        "no_workspace"
    );

    let workspace = sidecar.select_workspace("etask-router-smoke");
    assert!(workspace.join("etask.sqlite3").is_file());
    let health = sidecar.request_ok("health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(workspace.to_string_lossy().as_ref())
    );

    let imported = sidecar.import(sample_snapshot());
    assert_eq!(imported["courseId"].as_i64(), Some(COURSE_ID));
    assert_eq!(imported.pointer("/counts/users").and_then(|v| v.as_i64()), Some(6));
    assert_eq!(imported.pointer("/counts/gradeItems").and_then(|v| v.as_i64()), Some(4));

    sidecar.request_ok("config.get", json!({ "courseId": COURSE_ID }));
    sidecar.request_ok(
        "config.update",
        json!({ "scope": "plugin", "patch": { "progressBars": true } }),
    );
    sidecar.request_ok(
        "students.visible",
        json!({ "courseId": COURSE_ID, "viewerId": TEACHER }),
    );
    sidecar.table(TEACHER, json!({}));
    sidecar.request_ok(
        "gradePass.update",
        json!({ "courseId": COURSE_ID, "viewerId": TEACHER, "gradeItemId": ESSAY, "gradePass": 6 }),
    );

    assert_eq!(sidecar.request_err("no.such.method", json!({})), "not_implemented");
    assert_eq!(
        sidecar.request_err("table.get", json!({ "courseId": COURSE_ID })),
        "bad_params"
    );
    assert_eq!(
        sidecar.request_err("table.get", json!({ "courseId": 999, "viewerId": TEACHER })),
        "not_found"
    );
    assert_eq!(sidecar.request_err("workspace.select", json!({})), "bad_params");
}

#[test]
fn malformed_lines_get_bad_json_and_the_loop_continues() {
    let mut sidecar = spawn_sidecar();
    let resp = sidecar.send_raw("{ not json");
    assert_eq!(resp["ok"].as_bool(), Some(false));
    assert_eq!(resp.pointer("/error/code").and_then(|v| v.as_str()), Some("bad_json"));

    sidecar.request_ok("health", json!({}));
}

#[test]
fn invalid_snapshots_are_rejected() {
    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace("etask-snapshot-invalid");

    assert_eq!(
        sidecar.request_err("snapshot.import", json!({ "users": [] })),
        "bad_params"
    );

    let mut negative = sample_snapshot();
    negative["grades"] = json!([{ "itemId": ESSAY, "userId": 20, "finalGrade": -1.0 }]);
    assert_eq!(sidecar.request_err("snapshot.import", negative), "db_insert_failed");
}
