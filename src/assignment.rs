use crate::data::{
    MAX_UNITS_PER_SEMESTER, Professor, ProfessorName, Section, SemesterName, SolveOptions,
};
use crate::enumerate::collect_equal_optima;
use crate::error::{SolveError, SolveStage};
use good_lp::{Expression, ProblemVariables, Solution, SolverModel, constraint, default_solver, variable};
use log::{debug, info, trace, warn};
use std::collections::BTreeMap;

/// One candidate pairing: a professor teaching a section they are qualified for.
#[derive(Debug, Clone)]
struct Candidate {
    professor: usize,
    section: usize,
    preferred: bool,
}

/// The section-to-professor assignment model.
///
/// One binary decision per qualified (professor, section) pair; pairs outside
/// the professor's capability set are never created, which fixes those
/// exclusions without extra constraints.
pub struct AssignmentModel<'a> {
    professors: &'a [Professor],
    sections: &'a [Section],
    semesters: &'a [SemesterName],
    section_names: Vec<String>,
    candidates: Vec<Candidate>,
    by_section: Vec<Vec<usize>>,
    by_professor: Vec<Vec<usize>>,
}

/// A solved assignment: which professor teaches each staffed section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentSolution {
    pub assigned: BTreeMap<String, ProfessorName>,
    /// Objective value: assignments matching a stated course preference.
    pub requests_met: i64,
}

impl<'a> AssignmentModel<'a> {
    pub fn new(
        professors: &'a [Professor],
        sections: &'a [Section],
        semesters: &'a [SemesterName],
    ) -> Self {
        let section_names: Vec<String> = sections.iter().map(Section::name).collect();
        let mut candidates = Vec::new();
        let mut by_section = vec![Vec::new(); sections.len()];
        let mut by_professor = vec![Vec::new(); professors.len()];

        for (p, professor) in professors.iter().enumerate() {
            for (s, section) in sections.iter().enumerate() {
                if !professor.can_teach.contains(&section.course) {
                    continue;
                }
                by_section[s].push(candidates.len());
                by_professor[p].push(candidates.len());
                candidates.push(Candidate {
                    professor: p,
                    section: s,
                    preferred: professor.prefers_course(&section.course),
                });
            }
        }
        trace!(
            "assignment model: {} candidate variables out of {} professor-section pairs",
            candidates.len(),
            professors.len() * sections.len()
        );

        Self {
            professors,
            sections,
            semesters,
            section_names,
            candidates,
            by_section,
            by_professor,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn solve(&self, options: &SolveOptions) -> Result<AssignmentSolution, SolveError> {
        self.solve_pinned(None, options)
    }

    /// Builds a fresh model (optionally with one variable pinned to true) and
    /// solves it. Every call is isolated; nothing is reused between solves.
    fn solve_pinned(
        &self,
        pin: Option<usize>,
        options: &SolveOptions,
    ) -> Result<AssignmentSolution, SolveError> {
        let mut problem = ProblemVariables::new();
        let vars = problem.add_vector(variable().binary(), self.candidates.len());

        // maximize assignments that match a stated preference
        let objective = self
            .candidates
            .iter()
            .zip(&vars)
            .filter(|(candidate, _)| candidate.preferred)
            .map(|(_, var)| *var)
            .sum::<Expression>();

        let mut model = problem.maximise(objective).using(default_solver);
        if let Some(threads) = options.threads {
            model = model.set_option("threads", threads);
        }
        if let Some(seed) = options.random_seed {
            model = model.set_option("random_seed", seed);
        }
        if let Some(limit) = options.time_limit_secs {
            model = model.set_option("time_limit", limit);
        }

        // mandatory sections get exactly one professor, optional ones at most one
        for (s, section) in self.sections.iter().enumerate() {
            let staffed = self.by_section[s]
                .iter()
                .map(|&i| vars[i])
                .sum::<Expression>();
            if section.must_offer {
                model.add_constraint(constraint!(staffed == 1));
            } else {
                model.add_constraint(constraint!(staffed <= 1));
            }
        }

        // unit caps: total per professor, and 12 per professor per semester
        for (p, professor) in self.professors.iter().enumerate() {
            let load = self.by_professor[p].iter().fold(
                Expression::from(0.0),
                |acc, &i| acc + f64::from(self.sections[self.candidates[i].section].units) * vars[i],
            );
            model.add_constraint(constraint!(load <= f64::from(professor.max_units)));

            for semester in self.semesters {
                let semester_load = self
                    .by_professor[p]
                    .iter()
                    .filter(|&&i| &self.sections[self.candidates[i].section].semester == semester)
                    .fold(Expression::from(0.0), |acc, &i| {
                        acc + f64::from(self.sections[self.candidates[i].section].units) * vars[i]
                    });
                model.add_constraint(constraint!(
                    semester_load <= f64::from(MAX_UNITS_PER_SEMESTER)
                ));
            }
        }

        if let Some(pinned) = pin {
            model.add_constraint(constraint!(vars[pinned] == 1));
        }

        let solution = model
            .solve()
            .map_err(|e| SolveError::from_resolution(SolveStage::Assignment, e))?;

        let mut assigned = BTreeMap::new();
        let mut requests_met = 0;
        for (candidate, var) in self.candidates.iter().zip(&vars) {
            if solution.value(*var) > 0.5 {
                assigned.insert(
                    self.section_names[candidate.section].clone(),
                    self.professors[candidate.professor].name.clone(),
                );
                if candidate.preferred {
                    requests_met += 1;
                }
            }
        }
        Ok(AssignmentSolution {
            assigned,
            requests_met,
        })
    }

    /// Alternate assignments with the same number of requests met as `base`.
    pub fn enumerate_optimal(
        &self,
        base: &AssignmentSolution,
        options: &SolveOptions,
    ) -> Vec<AssignmentSolution> {
        let workers = options.workers(self.candidates.len());
        info!(
            "enumerating assignment optima: {} pins on {} workers",
            self.candidates.len(),
            workers
        );
        collect_equal_optima(self.candidates.len(), workers, |pin| {
            match self.solve_pinned(Some(pin), options) {
                Ok(solution) if solution.requests_met == base.requests_met => Some(solution),
                Ok(solution) => {
                    debug!(
                        "pin {} optimal at {} requests, below base {}",
                        pin, solution.requests_met, base.requests_met
                    );
                    None
                }
                Err(SolveError::Infeasible(_)) => {
                    debug!("pin {} infeasible, skipped", pin);
                    None
                }
                Err(err) => {
                    warn!("pin {} failed: {}", pin, err);
                    None
                }
            }
        })
    }
}
