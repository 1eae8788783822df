use crate::status::GradeStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub completed: usize,
    pub passed: usize,
    pub failed: usize,
    pub none: usize,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = GradeStatus>,
    {
        let mut counts = Self::default();
        for s in statuses {
            match s {
                GradeStatus::Completed => counts.completed += 1,
                GradeStatus::Passed => counts.passed += 1,
                GradeStatus::Failed => counts.failed += 1,
                GradeStatus::None => counts.none += 1,
            }
        }
        counts
    }
}

/// Whole percentages for the activity popover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Students with any outcome: completed, passed or failed.
    pub completed: u32,
    pub passed: u32,
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round() as u32
}

pub fn progress(counts: &StatusCounts, population: usize) -> Progress {
    Progress {
        completed: percent(counts.completed + counts.passed + counts.failed, population),
        passed: percent(counts.passed, population),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_status() {
        let counts = StatusCounts::tally([
            GradeStatus::Passed,
            GradeStatus::Failed,
            GradeStatus::None,
            GradeStatus::Passed,
            GradeStatus::Completed,
        ]);
        assert_eq!(
            counts,
            StatusCounts {
                completed: 1,
                passed: 2,
                failed: 1,
                none: 1
            }
        );
    }

    #[test]
    fn progress_matches_synthetic_counts() {
        let counts = StatusCounts {
            completed: 1,
            passed: 2,
            failed: 1,
            none: 1,
        };
        assert_eq!(
            progress(&counts, 5),
            Progress {
                completed: 80,
                passed: 40
            }
        );

        let thirds = StatusCounts {
            completed: 0,
            passed: 1,
            failed: 0,
            none: 2,
        };
        assert_eq!(
            progress(&thirds, 3),
            Progress {
                completed: 33,
                passed: 33
            }
        );

        let two_thirds = StatusCounts {
            completed: 1,
            passed: 1,
            failed: 0,
            none: 1,
        };
        assert_eq!(progress(&two_thirds, 3).completed, 67);
    }

    #[test]
    fn passed_never_exceeds_completed_and_everyone_done_is_hundred() {
        let all = StatusCounts {
            completed: 2,
            passed: 3,
            failed: 5,
            none: 0,
        };
        let p = progress(&all, 10);
        assert_eq!(p.completed, 100);
        assert_eq!(p.passed, 30);
        assert!(p.passed <= p.completed);
    }

    #[test]
    fn empty_population_yields_zero() {
        assert_eq!(progress(&StatusCounts::default(), 0), Progress::default());
    }
}
