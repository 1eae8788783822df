/// Scale items as the host stores them: one comma separated list, addressed from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleMenu {
    items: Vec<String>,
}

impl ScaleMenu {
    pub fn from_list(raw: &str) -> Self {
        let items = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn label(&self, value: i64) -> Option<&str> {
        if value < 1 {
            return None;
        }
        self.items.get((value - 1) as usize).map(|s| s.as_str())
    }

    /// `(value, label)` pairs in ascending value order.
    pub fn entries(&self) -> impl Iterator<Item = (i64, &str)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, s)| (i as i64 + 1, s.as_str()))
    }
}

/// Options for the grade-to-pass select: `0 => "-"` followed by the scale entries,
/// or by the whole numbers `1..=grade_max` for numeric items.
pub fn grade_pass_options(scale: Option<&ScaleMenu>, grade_max: f64) -> Vec<(i64, String)> {
    let mut out = vec![(0, "-".to_string())];
    match scale {
        Some(menu) => out.extend(menu.entries().map(|(v, s)| (v, s.to_string()))),
        None => {
            let max = grade_max.round().max(0.0) as i64;
            out.extend((1..=max).map(|v| (v, v.to_string())));
        }
    }
    out
}

/// Upper bound of the threshold domain for an item.
pub fn grade_pass_max(scale: Option<&ScaleMenu>, grade_max: f64) -> i64 {
    match scale {
        Some(menu) => menu.len() as i64,
        None => grade_max.round().max(0.0) as i64,
    }
}
