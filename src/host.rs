//! Read access to the host snapshot stored in the workspace database.
//!
//! Everything here is owned by the host platform; the only write is
//! [`update_grade_pass`].

use crate::scale::ScaleMenu;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Teacher,
    NonEditingTeacher,
    Student,
}

impl Role {
    /// Accepts the plugin's own role names and the host archetypes that imply them.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" | "editingteacher" | "manager" => Some(Self::Teacher),
            "noneditingteacher" => Some(Self::NonEditingTeacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::NonEditingTeacher => "noneditingteacher",
            Self::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub teacher: bool,
    pub non_editing_teacher: bool,
    pub student: bool,
}

impl Capabilities {
    pub fn grant(&mut self, role: Role) {
        match role {
            Role::Teacher => self.teacher = true,
            Role::NonEditingTeacher => self.non_editing_teacher = true,
            Role::Student => self.student = true,
        }
    }

    /// Teachers and non-editing teachers see every allowed student.
    pub fn is_privileged(&self) -> bool {
        self.teacher || self.non_editing_teacher
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseModule {
    pub id: i64,
    pub module: String,
    pub instance: i64,
    pub section: Option<i64>,
    pub position: Option<i64>,
    pub completion_expected: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeItem {
    pub id: i64,
    pub item_name: String,
    pub item_module: String,
    pub item_instance: i64,
    pub grade_max: f64,
    pub scale_id: Option<i64>,
    pub grade_pass: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grade {
    pub id: Option<i64>,
    pub final_grade: Option<f64>,
    pub raw_scale_id: Option<i64>,
}

pub fn course_exists(conn: &Connection, course_id: i64) -> anyhow::Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM courses WHERE id = ?", [course_id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub fn enrolled_users(conn: &Connection, course_id: i64) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT u.id, u.first_name, u.last_name
         FROM users u
         JOIN enrolments e ON e.user_id = u.id
         WHERE e.course_id = ?
         ORDER BY u.id",
    )?;
    let rows = stmt
        .query_map([course_id], |r| {
            Ok(User {
                id: r.get(0)?,
                first_name: r.get(1)?,
                last_name: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn capabilities_by_user(
    conn: &Connection,
    course_id: i64,
) -> anyhow::Result<HashMap<i64, Capabilities>> {
    let mut stmt = conn.prepare("SELECT user_id, role FROM enrolments WHERE course_id = ?")?;
    let rows = stmt
        .query_map([course_id], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: HashMap<i64, Capabilities> = HashMap::new();
    for (user_id, role) in rows {
        let caps = out.entry(user_id).or_default();
        match Role::parse(&role) {
            Some(r) => caps.grant(r),
            None => tracing::debug!(user_id, role = %role, "ignoring unknown enrolment role"),
        }
    }
    Ok(out)
}

pub fn user_capabilities(
    conn: &Connection,
    course_id: i64,
    user_id: i64,
) -> anyhow::Result<Capabilities> {
    Ok(capabilities_by_user(conn, course_id)?
        .remove(&user_id)
        .unwrap_or_default())
}

/// Course groups ordered by id.
pub fn course_groups(conn: &Connection, course_id: i64) -> anyhow::Result<Vec<(i64, String)>> {
    let mut stmt =
        conn.prepare("SELECT id, name FROM course_groups WHERE course_id = ? ORDER BY id")?;
    let rows = stmt
        .query_map([course_id], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Group ids (ascending) per user, limited to the course's groups.
pub fn group_memberships(
    conn: &Connection,
    course_id: i64,
) -> anyhow::Result<HashMap<i64, Vec<i64>>> {
    let mut stmt = conn.prepare(
        "SELECT gm.user_id, gm.group_id
         FROM group_members gm
         JOIN course_groups g ON g.id = gm.group_id
         WHERE g.course_id = ?
         ORDER BY gm.user_id, gm.group_id",
    )?;
    let rows = stmt
        .query_map([course_id], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
    for (user_id, group_id) in rows {
        out.entry(user_id).or_default().push(group_id);
    }
    Ok(out)
}

pub fn scale_menu(conn: &Connection, scale_id: i64) -> anyhow::Result<Option<ScaleMenu>> {
    let raw: Option<String> = conn
        .query_row("SELECT scale FROM scales WHERE id = ?", [scale_id], |r| r.get(0))
        .optional()?;
    Ok(raw.map(|s| ScaleMenu::from_list(&s)))
}

pub fn course_modules(conn: &Connection, course_id: i64) -> anyhow::Result<Vec<CourseModule>> {
    let mut stmt = conn.prepare(
        "SELECT id, module, instance, section, position, completion_expected
         FROM course_modules
         WHERE course_id = ?
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([course_id], |r| {
            Ok(CourseModule {
                id: r.get(0)?,
                module: r.get(1)?,
                instance: r.get(2)?,
                section: r.get(3)?,
                position: r.get(4)?,
                completion_expected: r.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Maps `(module, instance)` to the course module id.
pub fn module_index(modules: &[CourseModule]) -> HashMap<(String, i64), i64> {
    modules
        .iter()
        .map(|cm| ((cm.module.clone(), cm.instance), cm.id))
        .collect()
}

/// Course module ids in section order: by section number, then position.
pub fn section_sequences(modules: &[CourseModule]) -> Vec<Vec<i64>> {
    let mut by_section: BTreeMap<i64, Vec<(i64, i64)>> = BTreeMap::new();
    for cm in modules {
        if let Some(section) = cm.section {
            by_section
                .entry(section)
                .or_default()
                .push((cm.position.unwrap_or(i64::MAX), cm.id));
        }
    }
    by_section
        .into_values()
        .map(|mut seq| {
            seq.sort();
            seq.into_iter().map(|(_, id)| id).collect()
        })
        .collect()
}

pub fn module_date(conn: &Connection, cm_id: i64, field: &str) -> anyhow::Result<Option<i64>> {
    let v: Option<i64> = conn
        .query_row(
            "SELECT value FROM module_dates WHERE cm_id = ? AND field = ?",
            (cm_id, field),
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.filter(|ts| *ts > 0))
}

const GRADE_ITEM_COLUMNS: &str =
    "id, item_name, item_module, item_instance, grade_max, scale_id, grade_pass";

fn grade_item_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<GradeItem> {
    Ok(GradeItem {
        id: r.get(0)?,
        item_name: r.get(1)?,
        item_module: r.get(2)?,
        item_instance: r.get(3)?,
        grade_max: r.get(4)?,
        scale_id: r.get(5)?,
        grade_pass: r.get(6)?,
    })
}

/// Visible module grade items of a course, ascending by id.
pub fn grade_items(conn: &Connection, course_id: i64) -> anyhow::Result<Vec<GradeItem>> {
    let sql = format!(
        "SELECT {} FROM grade_items
         WHERE course_id = ? AND item_type = 'mod' AND hidden = 0
         ORDER BY id",
        GRADE_ITEM_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([course_id], grade_item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn grade_item(
    conn: &Connection,
    course_id: i64,
    item_id: i64,
) -> anyhow::Result<Option<GradeItem>> {
    let sql = format!(
        "SELECT {} FROM grade_items WHERE course_id = ? AND id = ? AND item_type = 'mod'",
        GRADE_ITEM_COLUMNS
    );
    Ok(conn
        .query_row(&sql, (course_id, item_id), grade_item_from_row)
        .optional()?)
}

/// Grades of one item keyed by user id. Users without a record are absent.
pub fn item_grades(conn: &Connection, item_id: i64) -> anyhow::Result<HashMap<i64, Grade>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, id, final_grade, raw_scale_id FROM grade_grades WHERE item_id = ?",
    )?;
    let rows = stmt
        .query_map([item_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                Grade {
                    id: r.get(1)?,
                    final_grade: r.get(2)?,
                    raw_scale_id: r.get(3)?,
                },
            ))
        })?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

/// Completed `(cm_id, user_id)` pairs of a course.
pub fn completed_modules(
    conn: &Connection,
    course_id: i64,
) -> anyhow::Result<HashSet<(i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT cs.cm_id, cs.user_id
         FROM completion_states cs
         JOIN course_modules cm ON cm.id = cs.cm_id
         WHERE cm.course_id = ? AND cs.state <> 0",
    )?;
    let rows = stmt
        .query_map([course_id], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(rows)
}

pub fn update_grade_pass(conn: &Connection, item_id: i64, grade_pass: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE grade_items SET grade_pass = ? WHERE id = ?",
        (grade_pass as f64, item_id),
    )
}
