use crate::data::SemesterName;
use good_lp::ResolutionError;
use std::fmt;

/// Which solve pass an error came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveStage {
    Assignment,
    Timetable(SemesterName),
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStage::Assignment => write!(f, "assignment"),
            SolveStage::Timetable(semester) => write!(f, "timetable for {}", semester),
        }
    }
}

/// Errors from a scheduling run.
///
/// `Timeout` is kept apart from `Infeasible`: a run that hit its time limit
/// leaves optimality unproven, whereas infeasibility is a definite answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The input tables are inconsistent; detected before any solve attempt.
    InvalidInput(String),
    /// The solver proved there is no feasible solution for this stage.
    Infeasible(SolveStage),
    /// The solver hit the caller-supplied time limit.
    Timeout(SolveStage),
    /// Any other solver failure.
    Solver(SolveStage, String),
}

impl SolveError {
    pub(crate) fn from_resolution(stage: SolveStage, err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => SolveError::Infeasible(stage),
            other => {
                let message = other.to_string();
                if message.to_ascii_lowercase().contains("time") {
                    SolveError::Timeout(stage)
                } else {
                    SolveError::Solver(stage, message)
                }
            }
        }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidInput(message) => write!(f, "invalid input: {}", message),
            SolveError::Infeasible(stage) => write!(f, "no feasible solution for {}", stage),
            SolveError::Timeout(stage) => write!(f, "solver timed out during {}", stage),
            SolveError::Solver(stage, message) => {
                write!(f, "solver failed during {}: {}", stage, message)
            }
        }
    }
}

impl std::error::Error for SolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_and_timeout_are_distinct_kinds() {
        let infeasible =
            SolveError::from_resolution(SolveStage::Assignment, ResolutionError::Infeasible);
        assert_eq!(infeasible, SolveError::Infeasible(SolveStage::Assignment));

        let timeout = SolveError::from_resolution(
            SolveStage::Timetable("Fall".to_string()),
            ResolutionError::Other("time limit reached"),
        );
        assert_eq!(
            timeout,
            SolveError::Timeout(SolveStage::Timetable("Fall".to_string()))
        );
    }
}
