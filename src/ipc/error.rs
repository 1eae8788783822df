use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Error envelope for a failed db call; the full chain goes to the log.
pub fn db_err(id: &str, code: &str, e: &anyhow::Error) -> serde_json::Value {
    tracing::error!(request = id, code, error = ?e, "database call failed");
    err(id, code, format!("{:#}", e), None)
}
