use crate::config::ActivitiesSorting;
use crate::host::GradeItem;
use std::collections::{HashMap, HashSet};

pub fn order_grade_items(
    mut items: Vec<GradeItem>,
    sorting: ActivitiesSorting,
    module_index: &HashMap<(String, i64), i64>,
    sections: &[Vec<i64>],
) -> Vec<GradeItem> {
    match sorting {
        ActivitiesSorting::Latest => {
            items.sort_by(|a, b| b.id.cmp(&a.id));
            items
        }
        ActivitiesSorting::Oldest => {
            items.sort_by_key(|i| i.id);
            items
        }
        ActivitiesSorting::Inherit => sort_by_sections(items, module_index, sections),
    }
}

/// Orders items the way their activities appear in the course sections.
///
/// Items of one activity stay together in ascending id order. Activities missing
/// from every section sequence follow, then items whose activity is unknown.
pub fn sort_by_sections(
    mut items: Vec<GradeItem>,
    module_index: &HashMap<(String, i64), i64>,
    sections: &[Vec<i64>],
) -> Vec<GradeItem> {
    items.sort_by_key(|i| i.id);

    let mut cm_order: Vec<i64> = Vec::new();
    let mut by_cm: HashMap<i64, Vec<GradeItem>> = HashMap::new();
    let mut orphans: Vec<GradeItem> = Vec::new();
    for item in items {
        match module_index.get(&(item.item_module.clone(), item.item_instance)) {
            Some(&cm_id) => {
                let bucket = by_cm.entry(cm_id).or_default();
                if bucket.is_empty() {
                    cm_order.push(cm_id);
                }
                bucket.push(item);
            }
            None => orphans.push(item),
        }
    }

    let mut sequence: Vec<i64> = Vec::with_capacity(cm_order.len());
    let mut seen: HashSet<i64> = HashSet::new();
    for cm_id in sections.iter().flatten() {
        if by_cm.contains_key(cm_id) && seen.insert(*cm_id) {
            sequence.push(*cm_id);
        }
    }
    for cm_id in cm_order {
        if seen.insert(cm_id) {
            sequence.push(cm_id);
        }
    }

    let mut out = Vec::new();
    for cm_id in sequence {
        if let Some(bucket) = by_cm.remove(&cm_id) {
            out.extend(bucket);
        }
    }
    out.extend(orphans);
    out
}

/// Running number per module, one per distinct instance, assigned in ascending item id order.
pub fn activity_numbers(items: &[GradeItem]) -> HashMap<(String, i64), usize> {
    let mut ordered: Vec<&GradeItem> = items.iter().collect();
    ordered.sort_by_key(|i| i.id);

    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut out: HashMap<(String, i64), usize> = HashMap::new();
    for item in ordered {
        let key = (item.item_module.clone(), item.item_instance);
        if out.contains_key(&key) {
            continue;
        }
        let n = counters.entry(item.item_module.as_str()).or_insert(0);
        *n += 1;
        out.insert(key, *n);
    }
    out
}

/// `A1`, `Q2`, ...: module initial plus its running number.
pub fn short_title(module: &str, number: usize) -> String {
    let initial: String = module
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    format!("{}{}", initial, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, module: &str, instance: i64) -> GradeItem {
        GradeItem {
            id,
            item_name: format!("{} {}", module, instance),
            item_module: module.to_string(),
            item_instance: instance,
            grade_max: 100.0,
            scale_id: None,
            grade_pass: 0.0,
        }
    }

    fn ids(items: &[GradeItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    fn fixture() -> (Vec<GradeItem>, HashMap<(String, i64), i64>, Vec<Vec<i64>>) {
        let items = vec![
            item(4, "quiz", 1),
            item(1, "assign", 1),
            item(3, "assign", 2),
            item(2, "quiz", 2),
            item(5, "assign", 3),
        ];
        let index: HashMap<(String, i64), i64> = [
            (("assign".to_string(), 1), 101),
            (("assign".to_string(), 2), 102),
            (("quiz".to_string(), 1), 201),
            (("quiz".to_string(), 2), 202),
            (("assign".to_string(), 3), 103),
        ]
        .into_iter()
        .collect();
        // assign 3 (cm 103) is not placed in any section.
        let sections = vec![vec![202, 999], vec![102, 201, 101]];
        (items, index, sections)
    }

    #[test]
    fn latest_and_oldest_sort_by_id() {
        let (items, index, sections) = fixture();
        let latest = order_grade_items(items.clone(), ActivitiesSorting::Latest, &index, &sections);
        assert_eq!(ids(&latest), vec![5, 4, 3, 2, 1]);
        let oldest = order_grade_items(items, ActivitiesSorting::Oldest, &index, &sections);
        assert_eq!(ids(&oldest), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn inherit_follows_sections_then_appends_unplaced() {
        let (items, index, sections) = fixture();
        let sorted = order_grade_items(items, ActivitiesSorting::Inherit, &index, &sections);
        assert_eq!(ids(&sorted), vec![2, 3, 4, 1, 5]);
    }

    #[test]
    fn inherit_is_independent_of_input_order() {
        let (items, index, sections) = fixture();
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(
            ids(&sort_by_sections(items, &index, &sections)),
            ids(&sort_by_sections(reversed, &index, &sections))
        );
    }

    #[test]
    fn inherit_keeps_items_of_one_activity_together_and_orphans_last() {
        let mut items = vec![item(7, "assign", 1), item(6, "forum", 9), item(2, "assign", 1)];
        items.push(item(3, "quiz", 1));
        let index: HashMap<(String, i64), i64> = [
            (("assign".to_string(), 1), 101),
            (("quiz".to_string(), 1), 201),
        ]
        .into_iter()
        .collect();
        let sections = vec![vec![201, 101]];
        let sorted = sort_by_sections(items, &index, &sections);
        assert_eq!(ids(&sorted), vec![3, 2, 7, 6]);
    }

    #[test]
    fn activity_numbers_count_per_module_by_id() {
        let (items, _, _) = fixture();
        let numbers = activity_numbers(&items);
        assert_eq!(numbers[&("assign".to_string(), 1)], 1);
        assert_eq!(numbers[&("quiz".to_string(), 2)], 1);
        assert_eq!(numbers[&("assign".to_string(), 2)], 2);
        assert_eq!(numbers[&("quiz".to_string(), 1)], 2);
        assert_eq!(numbers[&("assign".to_string(), 3)], 3);
        assert_eq!(short_title("assign", 3), "A3");
        assert_eq!(short_title("quiz", 1), "Q1");
    }
}
