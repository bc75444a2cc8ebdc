use crate::conflict::ConflictIndex;
use crate::data::{Professor, Section, SemesterName, SolveOptions, Timeslot};
use crate::enumerate::collect_equal_optima;
use crate::error::{SolveError, SolveStage};
use good_lp::{Expression, ProblemVariables, Solution, SolverModel, constraint, default_solver, variable};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::collections::BTreeMap;

/// One (professor, section) pair from a solved assignment.
#[derive(Debug, Clone)]
pub struct Teaching<'a> {
    pub professor: &'a Professor,
    pub section: &'a Section,
}

/// A candidate placement of one teaching into one timeslot.
#[derive(Debug, Clone)]
struct SlotCandidate {
    teaching: usize,
    slot: usize,
    preferred: bool,
}

/// The per-semester timetable model.
///
/// One binary decision per (teaching, timeslot) pair. Lab sections only get
/// candidates on lab slots and vice versa, so a lab mismatch is fixed to zero
/// by construction; a lab section with no lab slot at all then makes its
/// exactly-one constraint unsatisfiable, which is the required failure.
pub struct TimetableModel<'a> {
    semester: SemesterName,
    teachings: Vec<Teaching<'a>>,
    section_names: Vec<String>,
    candidates: Vec<SlotCandidate>,
    by_teaching: Vec<Vec<usize>>,
    /// Same professor, two sections, colliding slots (or the same slot):
    /// hard-forbidden placements.
    exclusions: Vec<(usize, usize)>,
    /// Different courses on overlapping distinct slots: soft, counted by one
    /// indicator each. Same-slot collisions stay out of the objective; the
    /// hard constraints own those.
    conflict_pairs: Vec<(usize, usize)>,
}

/// A solved timetable for one semester.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimetableSolution {
    pub semester: SemesterName,
    /// Section name -> index into the timeslot list.
    pub slots: BTreeMap<String, usize>,
    pub objective: i64,
    /// Placements landing in a preferred day segment.
    pub requests_met: i64,
    /// Cross-professor overlapping placements in the solution.
    pub cross_conflicts: i64,
}

impl<'a> TimetableModel<'a> {
    pub fn new(
        semester: SemesterName,
        teachings: Vec<Teaching<'a>>,
        timeslots: &'a [Timeslot],
        conflicts: &'a ConflictIndex,
    ) -> Self {
        let section_names: Vec<String> = teachings.iter().map(|t| t.section.name()).collect();

        let mut candidates = Vec::new();
        let mut by_teaching = vec![Vec::new(); teachings.len()];
        for (t, teaching) in teachings.iter().enumerate() {
            for (s, slot) in timeslots.iter().enumerate() {
                if slot.is_lab != teaching.section.is_lab {
                    continue;
                }
                by_teaching[t].push(candidates.len());
                candidates.push(SlotCandidate {
                    teaching: t,
                    slot: s,
                    preferred: teaching.professor.prefers_slot(slot),
                });
            }
        }

        let mut exclusions = Vec::new();
        let mut conflict_pairs = Vec::new();
        for (t1, t2) in (0..teachings.len()).tuple_combinations() {
            let same_professor = teachings[t1].professor.name == teachings[t2].professor.name;
            let same_course = teachings[t1].section.course == teachings[t2].section.course;
            for &c1 in &by_teaching[t1] {
                for &c2 in &by_teaching[t2] {
                    let (s1, s2) = (candidates[c1].slot, candidates[c2].slot);
                    let overlapping = s1 != s2 && conflicts.conflicting(s1, s2);
                    if same_professor && (s1 == s2 || overlapping) {
                        exclusions.push((c1, c2));
                    }
                    if !same_professor && !same_course && overlapping {
                        conflict_pairs.push((c1, c2));
                    }
                }
            }
        }
        trace!(
            "timetable model for {}: {} teachings, {} placement variables, {} exclusions, {} conflict indicators",
            semester,
            teachings.len(),
            candidates.len(),
            exclusions.len(),
            conflict_pairs.len()
        );

        Self {
            semester,
            teachings,
            section_names,
            candidates,
            by_teaching,
            exclusions,
            conflict_pairs,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn solve(&self, options: &SolveOptions) -> Result<TimetableSolution, SolveError> {
        self.solve_pinned(None, options)
    }

    fn solve_pinned(
        &self,
        pin: Option<usize>,
        options: &SolveOptions,
    ) -> Result<TimetableSolution, SolveError> {
        if self.teachings.is_empty() {
            return Ok(TimetableSolution {
                semester: self.semester.clone(),
                slots: BTreeMap::new(),
                objective: 0,
                requests_met: 0,
                cross_conflicts: 0,
            });
        }

        let mut problem = ProblemVariables::new();
        let placements = problem.add_vector(variable().binary(), self.candidates.len());
        let indicators = problem.add_vector(variable().binary(), self.conflict_pairs.len());

        let conflict_total = indicators.iter().copied().sum::<Expression>();
        let preference_total = self
            .candidates
            .iter()
            .zip(&placements)
            .filter(|(candidate, _)| candidate.preferred)
            .map(|(_, var)| *var)
            .sum::<Expression>();

        // Cross-scaling each sum by the other's variable count evens out their
        // influence before the conflict-over-preference weighting applies.
        let preference_count = self.candidates.len().max(1) as i64;
        let conflict_count = self.conflict_pairs.len().max(1) as i64;
        let objective = ((options.conflict_weight * preference_count) as f64) * conflict_total
            - ((options.preference_weight * conflict_count) as f64) * preference_total;

        let mut model = problem.minimise(objective).using(default_solver);
        if let Some(threads) = options.threads {
            model = model.set_option("threads", threads);
        }
        if let Some(seed) = options.random_seed {
            model = model.set_option("random_seed", seed);
        }
        if let Some(limit) = options.time_limit_secs {
            model = model.set_option("time_limit", limit);
        }

        // each taught section occupies exactly one slot
        for slots in &self.by_teaching {
            let placed = slots.iter().map(|&i| placements[i]).sum::<Expression>();
            model.add_constraint(constraint!(placed == 1));
        }

        // a professor never holds two sections in colliding slots
        for &(c1, c2) in &self.exclusions {
            model.add_constraint(constraint!(placements[c1] + placements[c2] <= 1));
        }

        // indicator = AND of the two placements, linearized
        for (k, &(c1, c2)) in self.conflict_pairs.iter().enumerate() {
            model.add_constraint(constraint!(
                placements[c1] + placements[c2] - indicators[k] <= 1
            ));
            model.add_constraint(constraint!(indicators[k] <= placements[c1]));
            model.add_constraint(constraint!(indicators[k] <= placements[c2]));
        }

        if let Some(pinned) = pin {
            model.add_constraint(constraint!(placements[pinned] == 1));
        }

        let solution = model.solve().map_err(|e| {
            SolveError::from_resolution(SolveStage::Timetable(self.semester.clone()), e)
        })?;

        let mut slots = BTreeMap::new();
        let mut requests_met = 0;
        for (candidate, var) in self.candidates.iter().zip(&placements) {
            if solution.value(*var) > 0.5 {
                slots.insert(
                    self.section_names[candidate.teaching].clone(),
                    candidate.slot,
                );
                if candidate.preferred {
                    requests_met += 1;
                }
            }
        }
        let cross_conflicts = indicators
            .iter()
            .filter(|var| solution.value(**var) > 0.5)
            .count() as i64;
        let objective = options.conflict_weight * preference_count * cross_conflicts
            - options.preference_weight * conflict_count * requests_met;
        debug!(
            "{}: {} placements, {} preferred, {} cross conflicts",
            self.semester,
            slots.len(),
            requests_met,
            cross_conflicts
        );

        Ok(TimetableSolution {
            semester: self.semester.clone(),
            slots,
            objective,
            requests_met,
            cross_conflicts,
        })
    }

    /// Alternate timetables with the same objective value as `base`.
    pub fn enumerate_optimal(
        &self,
        base: &TimetableSolution,
        options: &SolveOptions,
    ) -> Vec<TimetableSolution> {
        let workers = options.workers(self.candidates.len());
        info!(
            "enumerating timetable optima for {}: {} pins on {} workers",
            self.semester,
            self.candidates.len(),
            workers
        );
        collect_equal_optima(self.candidates.len(), workers, |pin| {
            match self.solve_pinned(Some(pin), options) {
                Ok(solution) if solution.objective == base.objective => Some(solution),
                Ok(_) => None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DaySegment;
    use std::collections::{HashMap, HashSet};

    fn professor(name: &str) -> Professor {
        Professor {
            name: name.to_string(),
            max_units: 12,
            can_teach: HashSet::new(),
            preferences: HashSet::new(),
            preferred_times: HashMap::new(),
        }
    }

    fn morning_mwf_fan(name: &str) -> Professor {
        let mut p = professor(name);
        p.preferred_times.insert(
            "Monday-Wednesday-Friday".to_string(),
            HashSet::from([DaySegment::Morning]),
        );
        p
    }

    fn section(course: &str, index: u32, is_lab: bool) -> Section {
        Section {
            course: course.to_string(),
            index,
            semester: "Fall".to_string(),
            units: 4,
            must_offer: true,
            is_lab,
        }
    }

    fn slot(weekdays: [bool; 5], start: u32, end: u32, is_lab: bool) -> Timeslot {
        Timeslot {
            weekdays,
            start,
            end,
            is_lab,
        }
    }

    const MWF: [bool; 5] = [true, false, true, false, true];
    const TR: [bool; 5] = [false, true, false, true, false];

    fn solve(
        teachings: Vec<Teaching<'_>>,
        timeslots: &[Timeslot],
    ) -> Result<TimetableSolution, SolveError> {
        let conflicts = ConflictIndex::build(timeslots);
        TimetableModel::new("Fall".to_string(), teachings, timeslots, &conflicts)
            .solve(&SolveOptions::default())
    }

    #[test]
    fn infeasible_when_no_conflict_free_pair_exists() {
        let prof = professor("A");
        let first = section("CS101", 0, false);
        let second = section("CS102", 0, false);
        // three pairwise-overlapping slots: no way to separate two sections
        let timeslots = vec![
            slot(MWF, 540, 590, false),
            slot(MWF, 550, 600, false),
            slot(MWF, 560, 610, false),
        ];
        let teachings = vec![
            Teaching { professor: &prof, section: &first },
            Teaching { professor: &prof, section: &second },
        ];

        let err = solve(teachings, &timeslots).unwrap_err();
        assert_eq!(
            err,
            SolveError::Infeasible(SolveStage::Timetable("Fall".to_string()))
        );
    }

    #[test]
    fn lab_section_without_lab_slots_is_infeasible() {
        let prof = professor("A");
        let lab = section("BIO101", 0, true);
        let timeslots = vec![slot(MWF, 540, 590, false), slot(TR, 540, 590, false)];
        let teachings = vec![Teaching { professor: &prof, section: &lab }];

        let err = solve(teachings, &timeslots).unwrap_err();
        assert_eq!(
            err,
            SolveError::Infeasible(SolveStage::Timetable("Fall".to_string()))
        );
    }

    #[test]
    fn lab_flags_must_match_both_ways() {
        let prof = professor("A");
        let lab = section("BIO101", 0, true);
        let lecture = section("CS101", 0, false);
        let timeslots = vec![slot(MWF, 540, 590, false), slot(TR, 540, 590, true)];
        let teachings = vec![
            Teaching { professor: &prof, section: &lab },
            Teaching { professor: &prof, section: &lecture },
        ];

        let solution = solve(teachings, &timeslots).unwrap();
        assert_eq!(solution.slots["Fall BIO101 Section 0"], 1);
        assert_eq!(solution.slots["Fall CS101 Section 0"], 0);
    }

    #[test]
    fn same_professor_sections_land_in_disjoint_slots() {
        let prof = professor("A");
        let first = section("CS101", 0, false);
        let second = section("CS102", 0, false);
        let timeslots = vec![
            slot(MWF, 540, 590, false),
            slot(MWF, 560, 610, false),
            slot(TR, 540, 590, false),
        ];
        let conflicts = ConflictIndex::build(&timeslots);
        let teachings = vec![
            Teaching { professor: &prof, section: &first },
            Teaching { professor: &prof, section: &second },
        ];

        let solution = TimetableModel::new("Fall".to_string(), teachings, &timeslots, &conflicts)
            .solve(&SolveOptions::default())
            .unwrap();
        let chosen: Vec<usize> = solution.slots.values().copied().collect();
        assert_eq!(chosen.len(), 2);
        assert_ne!(chosen[0], chosen[1]);
        assert!(!conflicts.conflicting(chosen[0], chosen[1]));
    }

    #[test]
    fn preferred_segment_wins_when_nothing_conflicts() {
        let prof = morning_mwf_fan("A");
        let teaching_section = section("CS101", 0, false);
        let timeslots = vec![
            slot(TR, 17 * 60 + 30, 18 * 60 + 20, false),
            slot(MWF, 540, 590, false),
        ];
        let teachings = vec![Teaching { professor: &prof, section: &teaching_section }];

        let solution = solve(teachings, &timeslots).unwrap();
        assert_eq!(solution.slots["Fall CS101 Section 0"], 1);
        assert_eq!(solution.requests_met, 1);
        assert_eq!(solution.cross_conflicts, 0);
    }

    #[test]
    fn cross_professor_overlap_is_avoided_when_a_free_slot_exists() {
        let first_prof = professor("A");
        let second_prof = professor("B");
        let first = section("CS101", 0, false);
        let second = section("CS201", 0, false);
        let timeslots = vec![
            slot(MWF, 540, 590, false),
            slot(MWF, 550, 600, false),
            slot(TR, 540, 590, false),
        ];
        let teachings = vec![
            Teaching { professor: &first_prof, section: &first },
            Teaching { professor: &second_prof, section: &second },
        ];

        let solution = solve(teachings, &timeslots).unwrap();
        assert_eq!(solution.cross_conflicts, 0);
    }

    #[test]
    fn conflict_avoidance_outweighs_preference_satisfaction() {
        // A's lab is stuck on the morning MWF lab slot; B's preferred morning
        // MWF slot overlaps it, so the default weighting pushes B to TR
        let first_prof = morning_mwf_fan("A");
        let second_prof = morning_mwf_fan("B");
        let lab = section("BIO101", 0, true);
        let lecture = section("CS201", 0, false);
        let timeslots = vec![
            slot(MWF, 540, 590, true),
            slot(MWF, 550, 600, false),
            slot(TR, 540, 590, false),
        ];
        let teachings = vec![
            Teaching { professor: &first_prof, section: &lab },
            Teaching { professor: &second_prof, section: &lecture },
        ];

        let solution = solve(teachings.clone(), &timeslots).unwrap();
        assert_eq!(solution.cross_conflicts, 0);
        assert_eq!(solution.requests_met, 1);
        assert_eq!(solution.slots["Fall CS201 Section 0"], 2);

        // a heavy enough preference weight flips the tradeoff
        let mut options = SolveOptions::default();
        options.preference_weight = 100;
        let conflicts = ConflictIndex::build(&timeslots);
        let greedy = TimetableModel::new("Fall".to_string(), teachings, &timeslots, &conflicts)
            .solve(&options)
            .unwrap();
        assert_eq!(greedy.cross_conflicts, 1);
        assert_eq!(greedy.requests_met, 2);
    }

    #[test]
    fn enumeration_returns_every_slot_choice_at_the_optimum() {
        let prof = professor("A");
        let teaching_section = section("CS101", 0, false);
        let timeslots = vec![slot(MWF, 540, 590, false), slot(TR, 540, 590, false)];
        let conflicts = ConflictIndex::build(&timeslots);
        let teachings = vec![Teaching { professor: &prof, section: &teaching_section }];
        let model = TimetableModel::new("Fall".to_string(), teachings, &timeslots, &conflicts);

        let options = SolveOptions::default();
        let base = model.solve(&options).unwrap();
        let optima = model.enumerate_optimal(&base, &options);

        assert_eq!(optima.len(), 2);
        assert!(optima.iter().all(|s| s.objective == base.objective));
        let chosen: HashSet<usize> = optima
            .iter()
            .map(|s| s.slots["Fall CS101 Section 0"])
            .collect();
        assert_eq!(chosen, HashSet::from([0, 1]));
    }
}
