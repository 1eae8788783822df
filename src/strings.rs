//! Localized strings for the grading table (English and Czech).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Cs,
}

impl Lang {
    /// Unknown languages fall back to English.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cs" | "cs_cz" | "cs-cz" => Self::Cs,
            _ => Self::En,
        }
    }
}

// key, en, cs
const STRINGS: &[(&str, &str, &str)] = &[
    ("pluginname", "eTask topics format", "eTask tematické uspořádání"),
    (
        "gradesavingsuccess",
        "Grade to pass for <strong>{itemName}</strong> was successfully updated to value <strong>{gradePass}</strong>.",
        "Potřebná známka pro <strong>{itemName}</strong> byla úspěšně nastavena na hodnotu <strong>{gradePass}</strong>.",
    ),
    (
        "gradesavingerror",
        "Error in saving grade to pass for <strong>{itemName}</strong>. Please, try it again later or contact plugin developer.",
        "Chyba při ukládání potřebné známky pro <strong>{itemName}</strong>. Prosím, zkuste to znovu později nebo kontaktujte vývojáře pluginu.",
    ),
    ("legend", "Legend", "Legenda"),
    ("activitycompleted", "Completed", "Dokončeno"),
    ("activitypassed", "Passed", "Splněno"),
    ("activityfailed", "Failed", "Nesplněno"),
    ("notset", "not set", "nenastaveno"),
    ("gradepass", "Grade to pass", "Potřebná známka"),
    ("duedate", "Due date", "Termín odevzdání"),
    ("group", "Group", "Skupina"),
    ("edit", "Edit", "Upravit"),
    ("closebuttontitle", "Close", "Zavřít"),
    ("savechanges", "Save changes", "Uložit změny"),
    ("cancel", "Cancel", "Zrušit"),
    ("page", "Page", "Stránka"),
    ("previous", "Previous", "Předchozí"),
    ("next", "Next", "Další"),
];

// module, en, cs
const MODULE_NAMES: &[(&str, &str, &str)] = &[
    ("assign", "Assignment", "Úkol"),
    ("quiz", "Quiz", "Test"),
    ("forum", "Forum", "Fórum"),
    ("lesson", "Lesson", "Přednáška"),
    ("workshop", "Workshop", "Workshop"),
    ("scorm", "SCORM package", "SCORM balíček"),
    ("data", "Database", "Databáze"),
    ("glossary", "Glossary", "Slovník"),
    ("lti", "External tool", "Externí nástroj"),
    ("h5pactivity", "H5P", "H5P"),
];

/// Returns the localized string, or the key itself when it is unknown.
pub fn get(lang: Lang, key: &str) -> &str {
    STRINGS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, en, cs)| match lang {
            Lang::En => *en,
            Lang::Cs => *cs,
        })
        .unwrap_or(key)
}

pub fn module_name(lang: Lang, module: &str) -> String {
    if let Some((_, en, cs)) = MODULE_NAMES.iter().find(|(m, _, _)| *m == module) {
        return match lang {
            Lang::En => en.to_string(),
            Lang::Cs => cs.to_string(),
        };
    }
    let mut chars = module.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Substitutes `{name}` placeholders in one pass over the template, so inserted
/// values are never expanded again. Values are inserted verbatim; callers escape.
pub fn fill(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            args.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Host-style long date: `Friday, 1 March 2024, 2:05 PM`.
pub fn userdate(timestamp: i64) -> Option<String> {
    let dt: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)?;
    Some(dt.format("%A, %-d %B %Y, %-I:%M %p").to_string())
}
