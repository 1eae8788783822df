//! Builds the grading table model: roster, ordered activities, cell statuses,
//! progress and pagination. Rendering lives in [`crate::render`].

use crate::access::{self, Viewer};
use crate::config::{self, DisplayConfig, Placement};
use crate::grade_pass::FlashMessage;
use crate::host::{self, CourseModule, Grade, GradeItem, User};
use crate::progress::{self, Progress, StatusCounts};
use crate::scale::{self, ScaleMenu};
use crate::sequence;
use crate::status::{self, GradeStatus};
use crate::strings::{self, Lang};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct TableRequest {
    pub course_id: i64,
    pub viewer_id: i64,
    pub group: Option<i64>,
    pub page: i64,
    pub editing: bool,
    pub lang: Lang,
    pub sesskey: Option<String>,
    pub section_return: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOption {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSettings {
    pub selected: i64,
    pub options: Vec<GradeOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityHead {
    pub grade_item_id: i64,
    pub cm_id: Option<i64>,
    pub module: String,
    pub module_name: String,
    pub item_name: String,
    pub short_title: String,
    /// Threshold label; `None` when not set.
    pub grade_pass: Option<String>,
    pub due_date: Option<String>,
    pub progress: Progress,
    /// Edit form, present only for teachers in editing mode.
    pub settings: Option<GradeSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Grade(String),
    Completed,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCell {
    pub grade_item_id: i64,
    pub grade_id: Option<i64>,
    pub status: GradeStatus,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub user: User,
    pub cells: Vec<GradeCell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeTable {
    pub course_id: i64,
    pub viewer_id: i64,
    pub placement: Placement,
    pub private_view: bool,
    /// Viewer may edit thresholds and open the host grade editor.
    pub can_edit: bool,
    pub show_group_filter: bool,
    pub selected_group: Option<i64>,
    pub groups: Vec<GroupOption>,
    pub page: i64,
    pub per_page: i64,
    pub students_count: usize,
    pub head: Vec<ActivityHead>,
    pub rows: Vec<StudentRow>,
    pub message: Option<FlashMessage>,
    #[serde(skip)]
    pub lang: Lang,
    #[serde(skip)]
    pub sesskey: Option<String>,
    #[serde(skip)]
    pub section_return: i64,
}

/// Selected group and allowed students for a viewer.
pub struct Audience {
    pub viewer: Viewer,
    pub course_groups: Vec<(i64, String)>,
    pub selected_group: Option<i64>,
    pub students: Vec<User>,
}

pub fn audience(
    conn: &Connection,
    course_id: i64,
    viewer_id: i64,
    requested_group: Option<i64>,
) -> anyhow::Result<Audience> {
    let caps_by_user = host::capabilities_by_user(conn, course_id)?;
    let memberships = host::group_memberships(conn, course_id)?;
    let viewer = Viewer {
        id: viewer_id,
        caps: caps_by_user.get(&viewer_id).copied().unwrap_or_default(),
        groups: memberships.get(&viewer_id).cloned().unwrap_or_default(),
    };
    let course_groups = host::course_groups(conn, course_id)?;
    let selected_group = access::select_group(&viewer, requested_group, &course_groups);
    let roster = host::enrolled_users(conn, course_id)?;
    let students = access::allowed_students(
        roster,
        &caps_by_user,
        &memberships,
        selected_group,
        &viewer.groups,
    );
    Ok(Audience {
        viewer,
        course_groups,
        selected_group,
        students,
    })
}

/// Page index reset to 0 when it points past the last student.
pub fn clamp_page(page: i64, per_page: i64, students_count: usize) -> i64 {
    let page = page.max(0);
    if (students_count as i64) <= page.saturating_mul(per_page) {
        0
    } else {
        page
    }
}

fn threshold_label(item: &GradeItem, menu: Option<&ScaleMenu>) -> Option<String> {
    let value = item.grade_pass.round() as i64;
    if value <= 0 {
        return None;
    }
    match (item.scale_id, menu) {
        (Some(_), Some(m)) => Some(m.label(value).unwrap_or("-").to_string()),
        (Some(_), None) => Some("-".to_string()),
        (None, _) => Some(value.to_string()),
    }
}

fn menu_for<'a>(menus: &'a HashMap<i64, Option<ScaleMenu>>, item: &GradeItem) -> Option<&'a ScaleMenu> {
    item.scale_id
        .and_then(|id| menus.get(&id))
        .and_then(Option::as_ref)
}

fn due_date(
    conn: &Connection,
    cm: Option<&CourseModule>,
    fields: &BTreeMap<String, String>,
) -> anyhow::Result<Option<String>> {
    let Some(cm) = cm else {
        return Ok(None);
    };
    let registered = match fields.get(&cm.module) {
        Some(field) => host::module_date(conn, cm.id, field)?,
        None => None,
    };
    let timestamp = registered.or(Some(cm.completion_expected).filter(|ts| *ts > 0));
    Ok(timestamp.and_then(strings::userdate))
}

fn cell_for(
    item: &GradeItem,
    menu: Option<&ScaleMenu>,
    grade: Option<&Grade>,
    completed: bool,
) -> GradeCell {
    let final_grade = status::normalize_grade(grade.and_then(|g| g.final_grade));
    let threshold = status::normalize_threshold(item.grade_pass);
    let status = status::classify(final_grade, threshold, completed);
    let raw_scale = grade.and_then(|g| g.raw_scale_id);

    let value = match (final_grade, raw_scale) {
        (Some(g), None) => CellValue::Grade(g.to_string()),
        (Some(g), Some(_)) => CellValue::Grade(
            menu.and_then(|m| m.label(g))
                .unwrap_or("-")
                .to_string(),
        ),
        (None, _) if status == GradeStatus::Completed => CellValue::Completed,
        (None, _) => CellValue::Empty,
    };

    GradeCell {
        grade_item_id: item.id,
        grade_id: grade.and_then(|g| g.id),
        status,
        value,
    }
}

pub fn build_grade_table(
    conn: &Connection,
    req: &TableRequest,
    message: Option<FlashMessage>,
) -> anyhow::Result<GradeTable> {
    let cfg: DisplayConfig = config::resolve(conn, req.course_id)?;
    let Audience {
        viewer,
        course_groups,
        selected_group,
        students,
    } = audience(conn, req.course_id, req.viewer_id, req.group)?;

    let modules = host::course_modules(conn, req.course_id)?;
    let module_index = host::module_index(&modules);
    let modules_by_id: HashMap<i64, &CourseModule> = modules.iter().map(|m| (m.id, m)).collect();

    let items = if students.is_empty() {
        Vec::new()
    } else {
        host::grade_items(conn, req.course_id)?
    };
    let numbers = sequence::activity_numbers(&items);
    let items = sequence::order_grade_items(
        items,
        cfg.activities_sorting,
        &module_index,
        &host::section_sequences(&modules),
    );

    let mut menus: HashMap<i64, Option<ScaleMenu>> = HashMap::new();
    for scale_id in items.iter().filter_map(|i| i.scale_id) {
        if !menus.contains_key(&scale_id) {
            let menu = host::scale_menu(conn, scale_id)?;
            if menu.is_none() {
                tracing::warn!(scale_id, "scale missing from snapshot");
            }
            menus.insert(scale_id, menu);
        }
    }

    let completed: HashSet<(i64, i64)> = host::completed_modules(conn, req.course_id)?;
    let private_view = access::is_private_view(cfg.private_view, &viewer);
    let show_progress = cfg.progress_bars || viewer.caps.is_privileged();
    let can_edit = viewer.caps.teacher;
    let due_fields = cfg.due_date_fields();

    // Statuses are computed for every allowed student; progress covers all of them.
    let mut cells_by_user: HashMap<i64, Vec<GradeCell>> = HashMap::new();
    let mut head = Vec::with_capacity(items.len());
    for item in &items {
        let grades = host::item_grades(conn, item.id)?;
        let cm_id = module_index
            .get(&(item.item_module.clone(), item.item_instance))
            .copied();
        let menu = menu_for(&menus, item);

        let mut statuses = Vec::with_capacity(students.len());
        for user in &students {
            let done = cm_id
                .map(|cm| completed.contains(&(cm, user.id)))
                .unwrap_or(false);
            let cell = cell_for(item, menu, grades.get(&user.id), done);
            statuses.push(cell.status);
            cells_by_user.entry(user.id).or_default().push(cell);
        }

        let progress = if show_progress {
            progress::progress(&StatusCounts::tally(statuses), students.len())
        } else {
            Progress::default()
        };

        let settings = (req.editing && can_edit).then(|| GradeSettings {
            selected: item.grade_pass.round() as i64,
            options: scale::grade_pass_options(menu, item.grade_max)
                .into_iter()
                .map(|(value, label)| GradeOption { value, label })
                .collect(),
        });

        let number = numbers
            .get(&(item.item_module.clone(), item.item_instance))
            .copied()
            .unwrap_or(0);
        head.push(ActivityHead {
            grade_item_id: item.id,
            cm_id,
            module: item.item_module.clone(),
            module_name: strings::module_name(req.lang, &item.item_module),
            item_name: item.item_name.clone(),
            short_title: sequence::short_title(&item.item_module, number),
            grade_pass: threshold_label(item, menu),
            due_date: due_date(conn, cm_id.and_then(|id| modules_by_id.get(&id).copied()), &due_fields)?,
            progress,
            settings,
        });
    }

    let students_count = if private_view { 1 } else { students.len() };
    let per_page = cfg.students_per_page.max(1);
    let page = clamp_page(req.page, per_page, students_count);

    let rows: Vec<StudentRow> = access::visible_rows(students, viewer.id, private_view)
        .into_iter()
        .skip((page * per_page) as usize)
        .take(per_page as usize)
        .map(|user| {
            let cells = cells_by_user.remove(&user.id).unwrap_or_default();
            StudentRow { user, cells }
        })
        .collect();

    tracing::debug!(
        course_id = req.course_id,
        viewer_id = req.viewer_id,
        activities = head.len(),
        rows = rows.len(),
        students_count,
        page,
        "grade table built"
    );

    Ok(GradeTable {
        course_id: req.course_id,
        viewer_id: req.viewer_id,
        placement: cfg.placement,
        private_view,
        can_edit,
        show_group_filter: !course_groups.is_empty() && viewer.caps.is_privileged(),
        selected_group,
        groups: course_groups
            .into_iter()
            .map(|(id, name)| GroupOption { id, name })
            .collect(),
        page,
        per_page,
        students_count,
        head,
        rows,
        message,
        lang: req.lang,
        sesskey: req.sesskey.clone(),
        section_return: req.section_return,
    })
}
