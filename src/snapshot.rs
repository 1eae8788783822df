//! Host snapshot import. The host hands over the course data the table reads;
//! an import replaces everything previously stored for that course.
//! Users and scales are site-wide: imports upsert them and never delete them.

use crate::host::Role;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseIn {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIn {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIn {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub members: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleIn {
    pub id: i64,
    pub scale: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleIn {
    pub id: i64,
    pub module: String,
    pub instance: i64,
    #[serde(default)]
    pub completion_expected: i64,
    /// Named date fields of the activity, e.g. `duedate`.
    #[serde(default)]
    pub dates: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionIn {
    pub section: i64,
    #[serde(default)]
    pub sequence: Vec<i64>,
}

fn default_item_type() -> String {
    "mod".to_string()
}

fn default_grade_max() -> f64 {
    100.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeItemIn {
    pub id: i64,
    pub item_name: String,
    #[serde(default = "default_item_type")]
    pub item_type: String,
    pub item_module: String,
    pub item_instance: i64,
    #[serde(default = "default_grade_max")]
    pub grade_max: f64,
    #[serde(default)]
    pub scale_id: Option<i64>,
    #[serde(default)]
    pub grade_pass: f64,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeIn {
    #[serde(default)]
    pub id: Option<i64>,
    pub item_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub final_grade: Option<f64>,
    #[serde(default)]
    pub raw_scale_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionIn {
    pub cm_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub state: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub course: CourseIn,
    #[serde(default)]
    pub users: Vec<UserIn>,
    #[serde(default)]
    pub groups: Vec<GroupIn>,
    #[serde(default)]
    pub scales: Vec<ScaleIn>,
    #[serde(default)]
    pub modules: Vec<ModuleIn>,
    #[serde(default)]
    pub sections: Vec<SectionIn>,
    #[serde(default)]
    pub grade_items: Vec<GradeItemIn>,
    #[serde(default)]
    pub grades: Vec<GradeIn>,
    #[serde(default)]
    pub completions: Vec<CompletionIn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub users: usize,
    pub enrolments: usize,
    pub groups: usize,
    pub scales: usize,
    pub modules: usize,
    pub grade_items: usize,
    pub grades: usize,
    pub completions: usize,
    pub skipped_roles: usize,
}

fn clear_course(conn: &Connection, course_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM completion_states WHERE cm_id IN (SELECT id FROM course_modules WHERE course_id = ?)",
        [course_id],
    )?;
    conn.execute(
        "DELETE FROM grade_grades WHERE item_id IN (SELECT id FROM grade_items WHERE course_id = ?)",
        [course_id],
    )?;
    conn.execute("DELETE FROM grade_items WHERE course_id = ?", [course_id])?;
    conn.execute(
        "DELETE FROM module_dates WHERE cm_id IN (SELECT id FROM course_modules WHERE course_id = ?)",
        [course_id],
    )?;
    conn.execute("DELETE FROM course_modules WHERE course_id = ?", [course_id])?;
    conn.execute(
        "DELETE FROM group_members WHERE group_id IN (SELECT id FROM course_groups WHERE course_id = ?)",
        [course_id],
    )?;
    conn.execute("DELETE FROM course_groups WHERE course_id = ?", [course_id])?;
    conn.execute("DELETE FROM enrolments WHERE course_id = ?", [course_id])?;
    Ok(())
}

pub fn import(conn: &mut Connection, snap: &Snapshot) -> anyhow::Result<ImportCounts> {
    let course_id = snap.course.id;
    let mut counts = ImportCounts::default();

    // Section placement per course module.
    let mut placement: HashMap<i64, (i64, i64)> = HashMap::new();
    for s in &snap.sections {
        for (pos, cm_id) in s.sequence.iter().enumerate() {
            placement.entry(*cm_id).or_insert((s.section, pos as i64));
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO courses(id, full_name) VALUES(?, ?)
         ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name",
        (course_id, &snap.course.full_name),
    )?;
    clear_course(&tx, course_id)?;

    for u in &snap.users {
        tx.execute(
            "INSERT INTO users(id, first_name, last_name) VALUES(?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               first_name = excluded.first_name,
               last_name = excluded.last_name",
            (u.id, &u.first_name, &u.last_name),
        )?;
        counts.users += 1;
        for raw in &u.roles {
            let Some(role) = Role::parse(raw) else {
                tracing::debug!(user_id = u.id, role = %raw, "skipping role without eTask capability");
                counts.skipped_roles += 1;
                continue;
            };
            counts.enrolments += tx.execute(
                "INSERT OR IGNORE INTO enrolments(course_id, user_id, role) VALUES(?, ?, ?)",
                (course_id, u.id, role.as_str()),
            )?;
        }
    }

    for g in &snap.groups {
        tx.execute(
            "INSERT INTO course_groups(id, course_id, name) VALUES(?, ?, ?)",
            (g.id, course_id, &g.name),
        )?;
        for m in &g.members {
            tx.execute(
                "INSERT OR IGNORE INTO group_members(group_id, user_id) VALUES(?, ?)",
                (g.id, m),
            )?;
        }
        counts.groups += 1;
    }

    for s in &snap.scales {
        tx.execute(
            "INSERT INTO scales(id, scale) VALUES(?, ?)
             ON CONFLICT(id) DO UPDATE SET scale = excluded.scale",
            (s.id, &s.scale),
        )?;
        counts.scales += 1;
    }

    for m in &snap.modules {
        let (section, position) = match placement.get(&m.id) {
            Some((s, p)) => (Some(*s), Some(*p)),
            None => (None, None),
        };
        tx.execute(
            "INSERT INTO course_modules(id, course_id, module, instance, section, position, completion_expected)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                m.id,
                course_id,
                &m.module,
                m.instance,
                section,
                position,
                m.completion_expected,
            ),
        )?;
        for (field, value) in &m.dates {
            tx.execute(
                "INSERT INTO module_dates(cm_id, field, value) VALUES(?, ?, ?)",
                (m.id, field, value),
            )?;
        }
        counts.modules += 1;
    }

    for gi in &snap.grade_items {
        tx.execute(
            "INSERT INTO grade_items(id, course_id, item_name, item_type, item_module, item_instance,
                                     grade_max, scale_id, grade_pass, hidden)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                gi.id,
                course_id,
                gi.item_name,
                gi.item_type,
                gi.item_module,
                gi.item_instance,
                gi.grade_max,
                gi.scale_id,
                gi.grade_pass.max(0.0),
                gi.hidden as i64,
            ],
        )?;
        counts.grade_items += 1;
    }

    for g in &snap.grades {
        if g.final_grade.is_some_and(|v| v < 0.0) {
            anyhow::bail!(
                "negative grade for item {} user {}",
                g.item_id,
                g.user_id
            );
        }
        tx.execute(
            "INSERT INTO grade_grades(id, item_id, user_id, final_grade, raw_scale_id)
             VALUES(?, ?, ?, ?, ?)",
            (g.id, g.item_id, g.user_id, g.final_grade, g.raw_scale_id),
        )?;
        counts.grades += 1;
    }

    for c in &snap.completions {
        tx.execute(
            "INSERT INTO completion_states(cm_id, user_id, state) VALUES(?, ?, ?)
             ON CONFLICT(cm_id, user_id) DO UPDATE SET state = excluded.state",
            (c.cm_id, c.user_id, c.state),
        )?;
        counts.completions += 1;
    }

    tx.commit()?;
    tracing::info!(course_id, ?counts, "snapshot imported");
    Ok(counts)
}
