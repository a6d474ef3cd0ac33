//! Units of work and their outcomes

use std::path::PathBuf;

/// One input file paired with its display identifier.
///
/// `worker_id` is 1-based and follows input order. It labels log lines only;
/// it says nothing about which pool thread runs the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub path: PathBuf,
    pub worker_id: usize,
}

/// Terminal state of a processed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    /// Numeric contribution to the batch tally (1 or 0)
    pub fn value(self) -> usize {
        match self {
            Self::Succeeded => 1,
            Self::Failed => 0,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

/// Pair every path with its 1-based position
pub fn build_tasks(paths: Vec<PathBuf>) -> Vec<Task> {
    paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| Task {
            path,
            worker_id: index + 1,
        })
        .collect()
}

/// Count successful outcomes. Order of `outcomes` is irrelevant.
pub fn sum_outcomes(outcomes: &[Outcome]) -> usize {
    outcomes.iter().map(|outcome| outcome.value()).sum()
}
