use crate::strings::Lang;
use serde_json::Value;

pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, String> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| format!("missing params.{}", key))
}

/// Absent and `null` mean "not given"; anything else must be an integer.
pub fn get_optional_i64(params: &Value, key: &str) -> Result<Option<i64>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("params.{} must be an integer", key)),
    }
}

/// Thresholds arrive from form posts as numbers or numeric strings; the
/// fractional part is dropped.
pub fn get_number_as_i64(params: &Value, key: &str) -> Result<i64, String> {
    let v = params
        .get(key)
        .ok_or_else(|| format!("missing params.{}", key))?;
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(format!("params.{} must be a number", key)),
    }
}

pub fn get_bool(params: &Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn get_lang(params: &Value) -> Lang {
    params
        .get("lang")
        .and_then(|v| v.as_str())
        .map(Lang::parse)
        .unwrap_or_default()
}
