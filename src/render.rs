//! HTML for the grading table region.

use crate::grade_pass::FlashMessage;
use crate::status::GradeStatus;
use crate::strings::{self, Lang};
use crate::table::{ActivityHead, CellValue, GradeCell, GradeTable, StudentRow};
use crate::host::User;
use maud::{html, Markup, PreEscaped};

const PAGING_MAX_DISPLAY: i64 = 18;

fn url(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{}?{}", path, query.join("&"))
}

fn course_url(course_id: i64) -> String {
    url("/course/view.php", &[("id", course_id.to_string())])
}

fn initials(user: &User) -> String {
    user.first_name
        .chars()
        .take(1)
        .chain(user.last_name.chars().take(1))
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn render_message(message: &FlashMessage, lang: Lang) -> Markup {
    let class = if message.success {
        "alert alert-success"
    } else {
        "alert alert-error"
    };
    html! {
        div class=(class) data-dismiss="alert" {
            button type="button" class="close" data-dismiss="alert" aria-label=(strings::get(lang, "closebuttontitle")) {
                span aria-hidden="true" { (PreEscaped("&times;")) }
            }
            (PreEscaped(&message.message))
        }
    }
}

pub fn render_progress_bar(value: u32, label: &str) -> Markup {
    html! {
        div.progress-label { (label) " " (value) "%" }
        div.progress {
            div.progress-bar role="progressbar" style=(format!("width: {}%", value))
                aria-valuenow=(value) aria-valuemin="0" aria-valuemax="100" {}
        }
    }
}

fn render_user_head(table: &GradeTable, user: &User) -> Markup {
    let profile = url(
        "/user/view.php",
        &[("id", user.id.to_string()), ("course", table.course_id.to_string())],
    );
    html! {
        span.userinitials { (initials(user)) }
        " "
        a href=(profile) { (user.full_name()) }
    }
}

fn render_popover(table: &GradeTable, head: &ActivityHead) -> Markup {
    let lang = table.lang;
    let not_set = strings::get(lang, "notset");
    let (badge, pass_value) = match &head.grade_pass {
        Some(v) => ("badge badge-pill badge-success", v.as_str()),
        None => ("badge badge-pill badge-secondary", not_set),
    };
    html! {
        div.popover-container {
            div.row {
                div.col-xs-5 {
                    div.row {
                        div.col-xs-12 {
                            div.progress-bar-completed.pb-1 {
                                (render_progress_bar(head.progress.completed, strings::get(lang, "activitycompleted")))
                            }
                        }
                        div.col-xs-12 {
                            div.progress-bar-passed {
                                (render_progress_bar(head.progress.passed, strings::get(lang, "activitypassed")))
                            }
                        }
                    }
                }
                div.col-xs-7 {
                    div.due-date {
                        i.fa.fa-calendar-check-o aria-hidden="true" {}
                        " " (strings::get(lang, "duedate")) ":"
                        br;
                        a href="#" { (head.due_date.as_deref().unwrap_or(not_set)) }
                    }
                    " "
                    div.grade-to-pass {
                        i.fa.fa-graduation-cap aria-hidden="true" {}
                        " " (strings::get(lang, "gradepass")) ": "
                        span class=(badge) { (pass_value) }
                    }
                }
            }
        }
    }
}

fn render_grade_settings(table: &GradeTable, head: &ActivityHead) -> Markup {
    let Some(settings) = &head.settings else {
        return html! {};
    };
    let lang = table.lang;
    let action = url(
        "/course/view.php",
        &[
            ("id", table.course_id.to_string()),
            ("gradeItemId", head.grade_item_id.to_string()),
        ],
    );
    let select_name = format!("gradePass{}", head.grade_item_id);
    html! {
        span.iconsmall.grade-item-dialog.pointer id=(format!("edit-grade-item{}", head.grade_item_id))
            title=(strings::get(lang, "edit")) {
            i.fa.fa-pencil aria-hidden="true" {}
        }
        div.grade-settings.hide id=(format!("grade-settings-edit-grade-item{}", head.grade_item_id)) {
            div.modal-header {
                div.title { (head.module_name) ": " (head.item_name) }
            }
            div.modal-body {
                div.grade-settings-form {
                    form.inline-form.grade-to-pass id=(format!("grade-pass-form{}", head.grade_item_id))
                        method="post" action=(action) {
                        @if let Some(key) = &table.sesskey {
                            input type="hidden" name="sesskey" value=(key);
                        }
                        label for=(select_name) { (strings::get(lang, "gradepass")) ":" }
                        select name=(select_name) id=(select_name) {
                            @for opt in &settings.options {
                                option value=(opt.value) selected[opt.value == settings.selected] { (opt.label) }
                            }
                        }
                    }
                }
            }
            div.modal-footer {
                button.btn.btn-primary type="button" { (strings::get(lang, "savechanges")) }
                button.btn.btn-secondary type="button" data-dismiss="modal" { (strings::get(lang, "cancel")) }
            }
        }
    }
}

fn render_activity_head(table: &GradeTable, head: &ActivityHead) -> Markup {
    let link = match head.cm_id {
        Some(cm_id) if table.can_edit => {
            let mut params = vec![("sr", table.section_return.to_string()), ("update", cm_id.to_string())];
            if let Some(key) = &table.sesskey {
                params.insert(0, ("sesskey", key.clone()));
            }
            url("/course/mod.php", &params)
        }
        Some(cm_id) => url(
            &format!("/mod/{}/view.php", urlencoding::encode(&head.module)),
            &[("id", cm_id.to_string())],
        ),
        None => "#".to_string(),
    };
    let icon = format!("/mod/{}/pix/icon.svg", urlencoding::encode(&head.module));
    let popover = render_popover(table, head).into_string();
    html! {
        div.grade-item-container {
            a href=(link) data-toggle="popover"
                title=(format!("{}: {}", head.module_name, head.item_name))
                data-content=(popover) {
                img.item-ico src=(icon) alt="";
                " " (head.short_title)
            }
            (render_grade_settings(table, head))
        }
    }
}

fn render_cell_value(table: &GradeTable, row: &StudentRow, cell: &GradeCell) -> Markup {
    let text = match &cell.value {
        CellValue::Grade(v) => html! { (v) },
        CellValue::Completed => html! { i.fa.fa-check-square-o aria-hidden="true" {} },
        CellValue::Empty => html! { (PreEscaped("&ndash;")) },
    };
    if !table.can_edit {
        return text;
    }

    let mut params = vec![
        ("courseid", table.course_id.to_string()),
        ("id", cell.grade_id.map(|id| id.to_string()).unwrap_or_default()),
        ("gpr_type", "report".to_string()),
        ("gpr_plugin", "grader".to_string()),
        ("gpr_courseid", table.course_id.to_string()),
    ];
    if cell.grade_id.is_none() {
        params.push(("userid", row.user.id.to_string()));
        params.push(("itemid", cell.grade_item_id.to_string()));
    }
    let item_name = table
        .head
        .iter()
        .find(|h| h.grade_item_id == cell.grade_item_id)
        .map(|h| h.item_name.as_str())
        .unwrap_or_default();
    html! {
        a.grade-item-body href=(url("/grade/edit/tree/grade.php", &params))
            title=(format!("{}: {}", row.user.full_name(), item_name)) {
            (text)
        }
    }
}

fn render_row(table: &GradeTable, row: &StudentRow) -> Markup {
    html! {
        tr {
            td.user-header { (render_user_head(table, &row.user)) }
            @for (cell, head) in row.cells.iter().zip(&table.head) {
                td class=(format!("grade-item-grade text-center {}", cell.status.as_str()))
                    title=(format!("{}: {}", row.user.full_name(), head.item_name)) {
                    (render_cell_value(table, row, cell))
                }
            }
        }
    }
}

pub fn render_paging_bar(total: usize, page: i64, per_page: i64, base: &str, lang: Lang) -> Markup {
    let total = total as i64;
    if per_page <= 0 || total <= per_page {
        return html! {};
    }
    let last = (total + per_page - 1) / per_page - 1;
    let half = PAGING_MAX_DISPLAY / 2;
    let first_shown = (page - half).clamp(0, (last - PAGING_MAX_DISPLAY + 1).max(0));
    let last_shown = (first_shown + PAGING_MAX_DISPLAY - 1).min(last);
    let sep = if base.contains('?') { '&' } else { '?' };
    let page_url = |p: i64| format!("{}{}page={}", base, sep, p);

    html! {
        nav.pagination.pagination-centered aria-label=(strings::get(lang, "page")) {
            ul.pagination {
                @if page > 0 {
                    li.page-item {
                        a.page-link href=(page_url(page - 1)) { (strings::get(lang, "previous")) }
                    }
                }
                @for p in first_shown..=last_shown {
                    @if p == page {
                        li.page-item.active { span.page-link { (p + 1) } }
                    } @else {
                        li.page-item { a.page-link href=(page_url(p)) { (p + 1) } }
                    }
                }
                @if page < last {
                    li.page-item {
                        a.page-link href=(page_url(page + 1)) { (strings::get(lang, "next")) }
                    }
                }
            }
        }
    }
}

fn render_group_form(table: &GradeTable) -> Markup {
    if !table.show_group_filter {
        return html! {};
    }
    let lang = table.lang;
    html! {
        form.inline-form.groups method="get" action="/course/view.php" {
            input type="hidden" name="id" value=(table.course_id);
            label for="eTaskFilterGroup" { (strings::get(lang, "group")) ":" }
            select name="eTaskFilterGroup" id="eTaskFilterGroup" onchange="this.form.submit();" {
                @for g in &table.groups {
                    option value=(g.id) selected[Some(g.id) == table.selected_group] { (g.name) }
                }
            }
        }
    }
}

fn render_footer(table: &GradeTable) -> Markup {
    let lang = table.lang;
    html! {
        div.row.grade-table-footer {
            div.col-md-4 { (render_group_form(table)) }
            div.col-md-4 {
                (render_paging_bar(table.students_count, table.page, table.per_page, &course_url(table.course_id), lang))
            }
            div.col-md-4 {
                div.legend {
                    (strings::get(lang, "legend")) ":"
                    span class=(format!("badge badge-warning {}", GradeStatus::Completed.as_str())) {
                        (strings::get(lang, "activitycompleted"))
                    }
                    span class=(format!("badge badge-success {}", GradeStatus::Passed.as_str())) {
                        (strings::get(lang, "activitypassed"))
                    }
                    span class=(format!("badge badge-danger {}", GradeStatus::Failed.as_str())) {
                        (strings::get(lang, "activityfailed"))
                    }
                }
            }
        }
    }
}

pub fn render_grade_table(table: &GradeTable) -> Markup {
    html! {
        div class=(format!("etask-grade-table {}", table.placement.as_str())) {
            @if let Some(message) = &table.message {
                (render_message(message, table.lang))
            }
            table.grade-table.table-hover.table-striped.table-condensed.table-responsive table-layout="fixed" {
                thead {
                    tr {
                        th {}
                        @for head in &table.head {
                            th.grade-item-header.center { (render_activity_head(table, head)) }
                        }
                    }
                }
                tbody {
                    @for row in &table.rows {
                        (render_row(table, row))
                    }
                }
            }
            (render_footer(table))
        }
    }
}
