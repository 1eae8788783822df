//! Display configuration: course options override plugin options, which override defaults.

use crate::db;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const STUDENTS_PER_PAGE_DEFAULT: i64 = 10;
const STUDENTS_PER_PAGE_MAX: i64 = 1000;
const DUE_DATE_MODULES_MAX_LEN: usize = 2000;

pub const DUE_DATE_MODULES_DEFAULT: &str =
    "assign:duedate, quiz:timeclose, lesson:deadline, workshop:submissionend, scorm:timeclose, forum:duedate, data:timeavailableto";

const PLUGIN_KEY: &str = "plugin.format_etask";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitiesSorting {
    Latest,
    Oldest,
    Inherit,
}

impl ActivitiesSorting {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            "inherit" => Some(Self::Inherit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

impl Placement {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "above" => Some(Self::Above),
            "below" => Some(Self::Below),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub private_view: bool,
    pub progress_bars: bool,
    pub students_per_page: i64,
    pub activities_sorting: ActivitiesSorting,
    pub placement: Placement,
    pub registered_due_date_modules: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            private_view: true,
            progress_bars: true,
            students_per_page: STUDENTS_PER_PAGE_DEFAULT,
            activities_sorting: ActivitiesSorting::Latest,
            placement: Placement::Above,
            registered_due_date_modules: DUE_DATE_MODULES_DEFAULT.to_string(),
        }
    }
}

impl DisplayConfig {
    /// Module name -> date field holding the due date.
    pub fn due_date_fields(&self) -> BTreeMap<String, String> {
        parse_due_date_modules(&self.registered_due_date_modules)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Course,
    Plugin,
}

impl ConfigScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(Self::Course),
            "plugin" => Some(Self::Plugin),
            _ => None,
        }
    }
}

fn course_key(course_id: i64) -> String {
    format!("course.{}.format_etask", course_id)
}

/// `"assign:duedate, quiz:timeclose"` -> `{assign: duedate, quiz: timeclose}`.
/// Malformed entries are skipped.
pub fn parse_due_date_modules(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((module, field)) = entry.split_once(':') else {
            tracing::debug!(entry, "skipping due date entry without ':'");
            continue;
        };
        let (module, field) = (module.trim(), field.trim());
        if module.is_empty() || field.is_empty() {
            continue;
        }
        out.insert(module.to_string(), field.to_string());
    }
    out
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

/// Validates `patch` against `scope` and merges the canonical values into `current`.
pub fn merge_patch(
    scope: ConfigScope,
    current: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    for (k, v) in patch {
        match k.as_str() {
            "privateView" | "progressBars" => {
                current.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
            }
            "studentsPerPage" => {
                current.insert(
                    k.clone(),
                    Value::from(parse_i64_range(v, k, 1, STUDENTS_PER_PAGE_MAX)?),
                );
            }
            "activitiesSorting" if scope == ConfigScope::Course => {
                let s = parse_string_max(v, k, 16)?.to_ascii_lowercase();
                if ActivitiesSorting::parse(&s).is_none() {
                    return Err("activitiesSorting must be one of: latest, oldest, inherit".into());
                }
                current.insert(k.clone(), Value::String(s));
            }
            "placement" if scope == ConfigScope::Course => {
                let s = parse_string_max(v, k, 16)?.to_ascii_lowercase();
                if Placement::parse(&s).is_none() {
                    return Err("placement must be one of: above, below".into());
                }
                current.insert(k.clone(), Value::String(s));
            }
            "registeredDueDateModules" if scope == ConfigScope::Plugin => {
                let s = parse_string_max(v, k, DUE_DATE_MODULES_MAX_LEN)?;
                current.insert(k.clone(), Value::String(s));
            }
            _ => {
                let scope_name = match scope {
                    ConfigScope::Course => "course",
                    ConfigScope::Plugin => "plugin",
                };
                return Err(format!("unknown {} config field: {}", scope_name, k));
            }
        }
    }
    Ok(())
}

fn load_stored(conn: &Connection, key: &str, scope: ConfigScope) -> anyhow::Result<Map<String, Value>> {
    let mut current = Map::new();
    if let Some(saved) = db::settings_get_json(conn, key)? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed historical values fall back to the next layer.
            if let Err(msg) = merge_patch(scope, &mut current, saved_obj) {
                tracing::warn!(key, error = %msg, "ignoring invalid stored config");
                current.clear();
            }
        }
    }
    Ok(current)
}

pub fn load_course(conn: &Connection, course_id: i64) -> anyhow::Result<Map<String, Value>> {
    load_stored(conn, &course_key(course_id), ConfigScope::Course)
}

pub fn load_plugin(conn: &Connection) -> anyhow::Result<Map<String, Value>> {
    load_stored(conn, PLUGIN_KEY, ConfigScope::Plugin)
}

pub fn save(
    conn: &Connection,
    scope: ConfigScope,
    course_id: Option<i64>,
    values: &Map<String, Value>,
) -> anyhow::Result<()> {
    let key = match (scope, course_id) {
        (ConfigScope::Course, Some(id)) => course_key(id),
        (ConfigScope::Course, None) => anyhow::bail!("course scope requires a course id"),
        (ConfigScope::Plugin, _) => PLUGIN_KEY.to_string(),
    };
    db::settings_set_json(conn, &key, &Value::Object(values.clone()))
}

/// Layers stored values over the defaults: course first, then plugin.
pub fn resolve_layers(course: &Map<String, Value>, plugin: &Map<String, Value>) -> DisplayConfig {
    let mut cfg = DisplayConfig::default();
    let pick = |k: &str| course.get(k).or_else(|| plugin.get(k));

    if let Some(b) = pick("privateView").and_then(|v| v.as_bool()) {
        cfg.private_view = b;
    }
    if let Some(b) = pick("progressBars").and_then(|v| v.as_bool()) {
        cfg.progress_bars = b;
    }
    if let Some(n) = pick("studentsPerPage").and_then(|v| v.as_i64()) {
        cfg.students_per_page = n.max(1);
    }
    if let Some(s) = course
        .get("activitiesSorting")
        .and_then(|v| v.as_str())
        .and_then(ActivitiesSorting::parse)
    {
        cfg.activities_sorting = s;
    }
    if let Some(p) = course
        .get("placement")
        .and_then(|v| v.as_str())
        .and_then(Placement::parse)
    {
        cfg.placement = p;
    }
    if let Some(s) = plugin.get("registeredDueDateModules").and_then(|v| v.as_str()) {
        cfg.registered_due_date_modules = s.to_string();
    }
    cfg
}

pub fn resolve(conn: &Connection, course_id: i64) -> anyhow::Result<DisplayConfig> {
    let course = load_course(conn, course_id)?;
    let plugin = load_plugin(conn)?;
    Ok(resolve_layers(&course, &plugin))
}

pub fn describe(conn: &Connection, course_id: i64) -> anyhow::Result<Value> {
    let course = load_course(conn, course_id)?;
    let plugin = load_plugin(conn)?;
    let resolved = resolve_layers(&course, &plugin);
    Ok(json!({
        "course": course,
        "plugin": plugin,
        "resolved": resolved,
    }))
}
