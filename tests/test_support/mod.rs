#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub const COURSE_ID: i64 = 2;
pub const TEACHER: i64 = 10;
pub const NON_EDITING_TEACHER: i64 = 11;
pub const ESSAY: i64 = 5;
pub const QUIZ: i64 = 6;
pub const DISCUSSION: i64 = 7;

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_etaskd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn etaskd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

impl Sidecar {
    pub fn send_raw(&mut self, line: &str) -> Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    pub fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({ "id": id, "method": method, "params": params });
        let value = self.send_raw(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: Value) -> Value {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or(Value::Null)
    }

    /// Returns the error code of a failed request.
    pub fn request_err(&mut self, method: &str, params: Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .pointer("/error/code")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }

    pub fn select_workspace(&mut self, prefix: &str) -> PathBuf {
        let workspace = temp_dir(prefix);
        self.request_ok(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        workspace
    }

    pub fn import(&mut self, snapshot: Value) -> Value {
        self.request_ok("snapshot.import", snapshot)
    }

    pub fn table(&mut self, viewer_id: i64, extra: Value) -> Value {
        let mut params = json!({ "courseId": COURSE_ID, "viewerId": viewer_id });
        if let (Some(p), Some(e)) = (params.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                p.insert(k.clone(), v.clone());
            }
        }
        self.request_ok("table.get", params)
    }
}

/// Physics course: one teacher, one non-editing teacher, four students and three
/// graded activities (numeric essay, scaled quiz, forum without a threshold).
pub fn sample_snapshot() -> Value {
    json!({
        "course": { "id": COURSE_ID, "fullName": "Physics" },
        "users": [
            { "id": TEACHER, "firstName": "Tereza", "lastName": "Teacher", "roles": ["editingteacher"] },
            { "id": NON_EDITING_TEACHER, "firstName": "Nora", "lastName": "Assistant", "roles": ["noneditingteacher"] },
            { "id": 20, "firstName": "Alice", "lastName": "Adams", "roles": ["student"] },
            { "id": 21, "firstName": "Bob", "lastName": "Brown", "roles": ["student"] },
            { "id": 22, "firstName": "Cara", "lastName": "Cole", "roles": ["student"] },
            { "id": 23, "firstName": "Dan", "lastName": "Dole", "roles": ["student"] }
        ],
        "scales": [ { "id": 1, "scale": "Weak,Fair,Strong" } ],
        "modules": [
            { "id": 100, "module": "assign", "instance": 1, "dates": { "duedate": 1709301900 } },
            { "id": 101, "module": "quiz", "instance": 1 },
            { "id": 102, "module": "forum", "instance": 1 }
        ],
        "sections": [
            { "section": 1, "sequence": [102, 100] },
            { "section": 2, "sequence": [101] }
        ],
        "gradeItems": [
            { "id": ESSAY, "itemName": "Essay", "itemModule": "assign", "itemInstance": 1, "gradeMax": 10, "gradePass": 5 },
            { "id": QUIZ, "itemName": "Quiz", "itemModule": "quiz", "itemInstance": 1, "gradeMax": 3, "scaleId": 1, "gradePass": 2 },
            { "id": DISCUSSION, "itemName": "Discussion", "itemModule": "forum", "itemInstance": 1, "gradeMax": 100 },
            { "id": 8, "itemName": "Course total", "itemType": "course", "itemModule": "", "itemInstance": 0 }
        ],
        "grades": [
            { "id": 500, "itemId": ESSAY, "userId": 20, "finalGrade": 7.0 },
            { "id": 501, "itemId": ESSAY, "userId": 21, "finalGrade": 3.0 },
            { "id": 600, "itemId": QUIZ, "userId": 20, "finalGrade": 3.0, "rawScaleId": 1 },
            { "id": 601, "itemId": QUIZ, "userId": 21, "finalGrade": 1.0, "rawScaleId": 1 },
            { "id": 700, "itemId": DISCUSSION, "userId": 20, "finalGrade": 80.0 }
        ],
        "completions": [
            { "cmId": 100, "userId": 22, "state": 1 }
        ]
    })
}

/// Adds two groups: Lab A (assistant, Alice, Bob) and Lab B (Cara). Dan has no group.
pub fn with_groups(mut snapshot: Value) -> Value {
    snapshot["groups"] = json!([
        { "id": 1, "name": "Lab A", "members": [NON_EDITING_TEACHER, 20, 21] },
        { "id": 2, "name": "Lab B", "members": [22] }
    ]);
    snapshot
}

pub fn head_ids(table: &Value) -> Vec<i64> {
    table["head"]
        .as_array()
        .expect("head array")
        .iter()
        .filter_map(|h| h["gradeItemId"].as_i64())
        .collect()
}

pub fn row_ids(table: &Value) -> Vec<i64> {
    table["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .filter_map(|r| r.pointer("/user/id").and_then(|v| v.as_i64()))
        .collect()
}

pub fn head<'a>(table: &'a Value, item_id: i64) -> &'a Value {
    table["head"]
        .as_array()
        .expect("head array")
        .iter()
        .find(|h| h["gradeItemId"].as_i64() == Some(item_id))
        .expect("activity head")
}

pub fn cell<'a>(table: &'a Value, user_id: i64, item_id: i64) -> &'a Value {
    table["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .find(|r| r.pointer("/user/id").and_then(|v| v.as_i64()) == Some(user_id))
        .and_then(|r| r["cells"].as_array())
        .and_then(|cells| {
            cells
                .iter()
                .find(|c| c["gradeItemId"].as_i64() == Some(item_id))
        })
        .expect("grade cell")
}
