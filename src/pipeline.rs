use crate::assignment::AssignmentModel;
use crate::conflict::ConflictIndex;
use crate::data::{
    Professor, ScheduleOutput, SchedulingInput, Section, SemesterSchedule, SolveOptions,
    SolveStats,
};
use crate::error::SolveError;
use crate::par::parallel_map;
use crate::report;
use crate::timetable::{Teaching, TimetableModel};
use crate::validate;
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;
use std::time::Instant;

/// Runs the whole two-stage pipeline: validate, staff the sections, then
/// timetable each semester.
///
/// Per-semester timetable solves are independent and run on a worker pool
/// bounded by the core count; each one builds its own model. A semester whose
/// timetable is infeasible (or times out) is reported failed in place while
/// the other semesters still come back solved.
pub fn solve_schedule(
    input: &SchedulingInput,
    options: &SolveOptions,
) -> Result<ScheduleOutput, SolveError> {
    let start_time = Instant::now();
    let semesters = input.semesters();
    let sections = input.derive_sections(&semesters);
    validate::validate(input, &sections)?;

    let conflicts = ConflictIndex::build(&input.timeslots);

    info!(
        "staffing {} sections across {} semesters with {} professors...",
        sections.len(),
        semesters.len(),
        input.professors.len()
    );
    let assignment_model = AssignmentModel::new(&input.professors, &sections, &semesters);
    let assignment = assignment_model.solve(options)?;
    info!("assignment solved: {} requests met", assignment.requests_met);

    let alternates = options.enumerate_alternates.then(|| {
        assignment_model
            .enumerate_optimal(&assignment, options)
            .into_iter()
            .filter(|alternate| alternate != &assignment)
            .map(|alternate| report::assignment_report(&sections, &input.professors, &alternate))
            .collect::<Vec<_>>()
    });

    // partition the taught sections by semester
    let professors_by_name: HashMap<&str, &Professor> = input
        .professors
        .iter()
        .map(|p| (p.name.as_str(), p))
        .collect();
    let sections_by_name: HashMap<String, &Section> =
        sections.iter().map(|s| (s.name(), s)).collect();
    let teachings_by_semester: HashMap<String, Vec<Teaching<'_>>> = assignment
        .assigned
        .iter()
        .map(|(section_name, professor_name)| {
            let section = sections_by_name[section_name.as_str()];
            let professor = professors_by_name[professor_name.as_str()];
            (section.semester.clone(), Teaching { professor, section })
        })
        .into_group_map();

    let workers = options.workers(semesters.len());
    info!(
        "timetabling {} semesters on {} workers...",
        semesters.len(),
        workers
    );
    let timetables = parallel_map(semesters.len(), workers, |i| {
        let semester = &semesters[i];
        let teachings = teachings_by_semester
            .get(semester)
            .cloned()
            .unwrap_or_default();
        TimetableModel::new(semester.clone(), teachings, &input.timeslots, &conflicts)
            .solve(options)
    });

    let mut semester_schedules = Vec::new();
    let mut timetable_requests_met = 0;
    let mut cross_conflicts = 0;
    for (semester, result) in semesters.iter().zip(timetables) {
        let assignments = report::assignment_report(
            sections.iter().filter(|s| &s.semester == semester),
            &input.professors,
            &assignment,
        );
        let (timetable, timetable_error) = match result {
            Ok(solution) => {
                timetable_requests_met += solution.requests_met;
                cross_conflicts += solution.cross_conflicts;
                let entries = report::timetable_report(
                    &solution,
                    &assignment,
                    &input.professors,
                    &input.timeslots,
                );
                (Some(entries), None)
            }
            Err(err) => {
                warn!("timetable for {} failed: {}", semester, err);
                (None, Some(err.to_string()))
            }
        };
        semester_schedules.push(SemesterSchedule {
            semester: semester.clone(),
            assignments,
            timetable,
            timetable_error,
        });
    }

    let duration = start_time.elapsed();
    info!("schedule solved in {:.2?}", duration);

    Ok(ScheduleOutput {
        semesters: semester_schedules,
        professor_loads: report::professor_loads(&input.professors, &sections, &assignment),
        stats: SolveStats {
            requests_met: assignment.requests_met,
            timetable_requests_met,
            cross_conflicts,
            wall_time_secs: duration.as_secs_f64(),
        },
        alternate_assignments: alternates,
    })
}
