use serde::Serialize;

/// Per-cell outcome shown in the grading table. Also used as the CSS class of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Completed,
    Passed,
    Failed,
    None,
}

impl GradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::None => "none",
        }
    }
}

/// Host grades arrive as floats; the table works in whole numbers and treats 0 as "no grade".
pub fn normalize_grade(final_grade: Option<f64>) -> Option<i64> {
    final_grade
        .filter(|g| g.is_finite())
        .map(|g| g.trunc() as i64)
        .filter(|g| *g > 0)
}

/// Same rule as [`normalize_grade`]: a zero threshold means "not set".
pub fn normalize_threshold(grade_pass: f64) -> Option<i64> {
    normalize_grade(Some(grade_pass))
}

pub fn classify(grade: Option<i64>, threshold: Option<i64>, completed: bool) -> GradeStatus {
    match (grade, threshold) {
        (None, _) if completed => GradeStatus::Completed,
        (None, _) | (_, None) => GradeStatus::None,
        (Some(g), Some(t)) if g >= t => GradeStatus::Passed,
        (Some(_), Some(_)) => GradeStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_input_combination() {
        // (grade, threshold, completed) -> expected
        let cases = [
            (None, None, false, GradeStatus::None),
            (None, None, true, GradeStatus::Completed),
            (None, Some(5), false, GradeStatus::None),
            (None, Some(5), true, GradeStatus::Completed),
            (Some(7), None, false, GradeStatus::None),
            (Some(7), None, true, GradeStatus::None),
            (Some(7), Some(5), false, GradeStatus::Passed),
            (Some(7), Some(5), true, GradeStatus::Passed),
            (Some(3), Some(5), false, GradeStatus::Failed),
            (Some(3), Some(5), true, GradeStatus::Failed),
        ];
        for (grade, threshold, completed, expected) in cases {
            assert_eq!(
                classify(grade, threshold, completed),
                expected,
                "grade={:?} threshold={:?} completed={}",
                grade,
                threshold,
                completed
            );
        }
    }

    #[test]
    fn grade_equal_to_threshold_passes() {
        assert_eq!(classify(Some(5), Some(5), false), GradeStatus::Passed);
    }

    #[test]
    fn zero_grade_and_threshold_count_as_absent() {
        assert_eq!(normalize_grade(Some(0.0)), None);
        assert_eq!(normalize_grade(Some(0.4)), None);
        assert_eq!(normalize_grade(None), None);
        assert_eq!(normalize_grade(Some(7.9)), Some(7));
        assert_eq!(normalize_threshold(0.0), None);
        assert_eq!(normalize_threshold(50.0), Some(50));

        let status = classify(normalize_grade(Some(0.0)), normalize_threshold(5.0), true);
        assert_eq!(status, GradeStatus::Completed);
    }
}
