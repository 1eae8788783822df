//! Teacher edits of an activity's pass threshold.

use crate::host::{self, Capabilities};
use crate::scale;
use crate::strings::{self, Lang};
use maud::Render;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum GradePassError {
    #[error("grade to pass can only be changed by teachers")]
    Forbidden,
    #[error("grade item {0} not found")]
    UnknownItem(i64),
    #[error("grade to pass {value} for {item_name} is outside 0..={max}")]
    OutOfDomain {
        item_name: String,
        value: i64,
        max: i64,
    },
    #[error("grade to pass for {item_name} is not a whole number")]
    InvalidValue { item_name: String },
    #[error("scale {scale_id} of {item_name} is missing")]
    MissingScale { item_name: String, scale_id: i64 },
    #[error("failed to save grade to pass for {item_name}")]
    Storage {
        item_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl GradePassError {
    fn item_label(&self) -> String {
        match self {
            Self::Forbidden => String::new(),
            Self::UnknownItem(id) => format!("#{}", id),
            Self::InvalidValue { item_name }
            | Self::MissingScale { item_name, .. }
            | Self::OutOfDomain { item_name, .. }
            | Self::Storage { item_name, .. } => item_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradePassUpdate {
    pub grade_item_id: i64,
    pub grade_pass: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradePassSaved {
    pub item_name: String,
    /// Scale entry (or `-` for "not set") on scaled items, the number otherwise.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    pub success: bool,
    /// HTML fragment; user supplied parts are escaped.
    pub message: String,
}

pub fn apply(
    conn: &Connection,
    course_id: i64,
    caps: &Capabilities,
    update: GradePassUpdate,
) -> Result<GradePassSaved, GradePassError> {
    if !caps.teacher {
        return Err(GradePassError::Forbidden);
    }

    let item = host::grade_item(conn, course_id, update.grade_item_id)
        .map_err(|e| GradePassError::Storage {
            item_name: format!("#{}", update.grade_item_id),
            source: e.into(),
        })?
        .ok_or(GradePassError::UnknownItem(update.grade_item_id))?;

    let menu = match item.scale_id {
        Some(id) => host::scale_menu(conn, id).map_err(|e| GradePassError::Storage {
            item_name: item.item_name.clone(),
            source: e.into(),
        })?,
        None => None,
    };
    if let (Some(scale_id), None) = (item.scale_id, menu.as_ref()) {
        tracing::warn!(scale_id, item_id = item.id, "grade item references a missing scale");
        return Err(GradePassError::MissingScale {
            item_name: item.item_name,
            scale_id,
        });
    }

    let max = scale::grade_pass_max(menu.as_ref(), item.grade_max);
    if !(0..=max).contains(&update.grade_pass) {
        return Err(GradePassError::OutOfDomain {
            item_name: item.item_name,
            value: update.grade_pass,
            max,
        });
    }

    let changed = host::update_grade_pass(conn, item.id, update.grade_pass).map_err(|e| {
        GradePassError::Storage {
            item_name: item.item_name.clone(),
            source: e.into(),
        }
    })?;
    if changed == 0 {
        return Err(GradePassError::UnknownItem(item.id));
    }

    let label = match menu.as_ref() {
        Some(m) => m.label(update.grade_pass).unwrap_or("-").to_string(),
        None => update.grade_pass.to_string(),
    };
    tracing::info!(item_id = item.id, grade_pass = update.grade_pass, "grade to pass updated");
    Ok(GradePassSaved {
        item_name: item.item_name,
        label,
    })
}

/// Outcome of an update whose value could not be read. Non-teachers still get
/// [`GradePassError::Forbidden`]; the item name is looked up when the id is known.
pub fn reject_invalid(
    conn: &Connection,
    course_id: i64,
    caps: &Capabilities,
    grade_item_id: Option<i64>,
) -> GradePassError {
    if !caps.teacher {
        return GradePassError::Forbidden;
    }
    let Some(id) = grade_item_id else {
        return GradePassError::InvalidValue {
            item_name: String::new(),
        };
    };
    match host::grade_item(conn, course_id, id) {
        Ok(Some(item)) => GradePassError::InvalidValue {
            item_name: item.item_name,
        },
        Ok(None) => GradePassError::UnknownItem(id),
        Err(e) => GradePassError::Storage {
            item_name: format!("#{}", id),
            source: e.into(),
        },
    }
}

fn escape(s: &str) -> String {
    let mut buf = String::new();
    s.render_to(&mut buf);
    buf
}

/// User-visible outcome of an update. Forbidden updates are silent.
pub fn flash_message(
    lang: Lang,
    outcome: &Result<GradePassSaved, GradePassError>,
) -> Option<FlashMessage> {
    match outcome {
        Ok(saved) => {
            let item_name = escape(&saved.item_name);
            let grade_pass = escape(&saved.label);
            Some(FlashMessage {
                success: true,
                message: strings::fill(
                    strings::get(lang, "gradesavingsuccess"),
                    &[("itemName", item_name.as_str()), ("gradePass", grade_pass.as_str())],
                ),
            })
        }
        Err(GradePassError::Forbidden) => None,
        Err(e) => {
            tracing::warn!(error = %e, "grade to pass update failed");
            let item_name = escape(&e.item_label());
            Some(FlashMessage {
                success: false,
                message: strings::fill(
                    strings::get(lang, "gradesavingerror"),
                    &[("itemName", item_name.as_str())],
                ),
            })
        }
    }
}
