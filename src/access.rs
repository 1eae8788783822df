use crate::host::{Capabilities, User};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub id: i64,
    pub caps: Capabilities,
    /// Course groups the viewer belongs to, ascending.
    pub groups: Vec<i64>,
}

/// Group used to filter the roster. Only privileged viewers filter by group;
/// an explicit request wins, then the viewer's first group, then the course's first group.
pub fn select_group(
    viewer: &Viewer,
    requested: Option<i64>,
    course_groups: &[(i64, String)],
) -> Option<i64> {
    if !viewer.caps.is_privileged() {
        return None;
    }
    if let Some(g) = requested.filter(|g| *g != 0) {
        if course_groups.iter().any(|(id, _)| *id == g) {
            return Some(g);
        }
        tracing::debug!(group = g, "requested group is not a course group");
    }
    viewer
        .groups
        .first()
        .copied()
        .or_else(|| course_groups.first().map(|(id, _)| *id))
}

/// Users without groups are always allowed. With a selected group the user must
/// belong to it; otherwise all of the user's groups must be shared with the viewer.
pub fn is_allowed(user_groups: &[i64], selected: Option<i64>, viewer_groups: &[i64]) -> bool {
    if user_groups.is_empty() {
        return true;
    }
    match selected {
        Some(g) => user_groups.contains(&g),
        None => user_groups.iter().all(|g| viewer_groups.contains(g)),
    }
}

/// Enrolled students visible under the group filter, in roster order.
pub fn allowed_students(
    users: Vec<User>,
    caps: &HashMap<i64, Capabilities>,
    memberships: &HashMap<i64, Vec<i64>>,
    selected: Option<i64>,
    viewer_groups: &[i64],
) -> Vec<User> {
    users
        .into_iter()
        .filter(|u| caps.get(&u.id).map(|c| c.student).unwrap_or(false))
        .filter(|u| {
            let groups = memberships.get(&u.id).map(Vec::as_slice).unwrap_or(&[]);
            is_allowed(groups, selected, viewer_groups)
        })
        .collect()
}

/// Students without any privileged capability only see themselves when private view is on.
pub fn is_private_view(private_view_enabled: bool, viewer: &Viewer) -> bool {
    private_view_enabled && viewer.caps.student && !viewer.caps.is_privileged()
}

/// Rows to render: only the viewer under private view, otherwise everyone with the viewer first.
pub fn visible_rows(mut students: Vec<User>, viewer_id: i64, private_view: bool) -> Vec<User> {
    if private_view {
        students.retain(|u| u.id == viewer_id);
        return students;
    }
    if let Some(pos) = students.iter().position(|u| u.id == viewer_id) {
        let me = students.remove(pos);
        students.insert(0, me);
    }
    students
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            first_name: format!("First{}", id),
            last_name: format!("Last{}", id),
        }
    }

    fn student_caps() -> Capabilities {
        Capabilities {
            student: true,
            ..Capabilities::default()
        }
    }

    fn teacher_caps() -> Capabilities {
        Capabilities {
            teacher: true,
            ..Capabilities::default()
        }
    }

    #[test]
    fn private_view_leaves_exactly_one_row_for_a_student() {
        let viewer = Viewer {
            id: 3,
            caps: student_caps(),
            groups: vec![],
        };
        assert!(is_private_view(true, &viewer));
        let rows = visible_rows(vec![user(1), user(2), user(3), user(4)], viewer.id, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
    }

    #[test]
    fn private_view_does_not_apply_to_privileged_viewers() {
        let mut caps = student_caps();
        caps.non_editing_teacher = true;
        let viewer = Viewer {
            id: 9,
            caps,
            groups: vec![],
        };
        assert!(!is_private_view(true, &viewer));
        assert!(!is_private_view(
            false,
            &Viewer {
                id: 3,
                caps: student_caps(),
                groups: vec![]
            }
        ));
    }

    #[test]
    fn viewer_row_moves_to_top_without_private_view() {
        let rows = visible_rows(vec![user(1), user(2), user(3)], 3, false);
        let ids: Vec<i64> = rows.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn group_filter_rules() {
        assert!(is_allowed(&[], Some(5), &[]));
        assert!(is_allowed(&[5, 6], Some(5), &[]));
        assert!(!is_allowed(&[6], Some(5), &[5, 6]));
        assert!(is_allowed(&[1, 2], None, &[1, 2, 3]));
        assert!(!is_allowed(&[1, 4], None, &[1, 2, 3]));
    }

    #[test]
    fn select_group_fallbacks() {
        let course_groups = vec![(7, "B".to_string()), (8, "C".to_string())];
        let teacher = Viewer {
            id: 1,
            caps: teacher_caps(),
            groups: vec![8],
        };
        assert_eq!(select_group(&teacher, Some(7), &course_groups), Some(7));
        assert_eq!(select_group(&teacher, Some(0), &course_groups), Some(8));
        assert_eq!(select_group(&teacher, Some(99), &course_groups), Some(8));

        let loner = Viewer {
            groups: vec![],
            ..teacher.clone()
        };
        assert_eq!(select_group(&loner, None, &course_groups), Some(7));
        assert_eq!(select_group(&loner, None, &[]), None);

        let student = Viewer {
            id: 2,
            caps: student_caps(),
            groups: vec![8],
        };
        assert_eq!(select_group(&student, Some(7), &course_groups), None);
    }

    #[test]
    fn allowed_students_requires_student_capability() {
        let users = vec![user(1), user(2), user(3)];
        let caps: HashMap<i64, Capabilities> = [
            (1, teacher_caps()),
            (2, student_caps()),
            (3, student_caps()),
        ]
        .into_iter()
        .collect();
        let memberships: HashMap<i64, Vec<i64>> = [(3, vec![7])].into_iter().collect();

        let all = allowed_students(users.clone(), &caps, &memberships, None, &[7]);
        assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);

        let other_group = allowed_students(users, &caps, &memberships, Some(8), &[]);
        assert_eq!(other_group.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);
    }
}
