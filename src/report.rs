use crate::assignment::AssignmentSolution;
use crate::data::{
    Professor, ProfessorLoad, Section, SectionAssignment, TimetableEntry, Timeslot,
};
use crate::timetable::TimetableSolution;
use std::collections::HashMap;

/// Read-only projections from solved models back to report structures. The
/// preference flags are recomputed here as plain lookups; nothing touches the
/// solver again.

/// Per-section staffing rows, sorted by section name. Unstaffed optional
/// sections show up with no professor.
pub fn assignment_report<'a, I>(
    sections: I,
    professors: &[Professor],
    solution: &AssignmentSolution,
) -> Vec<SectionAssignment>
where
    I: IntoIterator<Item = &'a Section>,
{
    let by_name: HashMap<&str, &Professor> =
        professors.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut rows: Vec<SectionAssignment> = sections
        .into_iter()
        .map(|section| {
            let name = section.name();
            let professor = solution.assigned.get(&name).cloned();
            let requested = professor
                .as_deref()
                .and_then(|assignee| by_name.get(assignee))
                .is_some_and(|assignee| assignee.prefers_course(&section.course));
            SectionAssignment {
                section: name,
                course: section.course.clone(),
                professor,
                requested,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.section.cmp(&b.section));
    rows
}

/// One row per placed section: the chosen slot's shape plus whether it hits
/// the professor's time-of-day preference.
pub fn timetable_report(
    solution: &TimetableSolution,
    assignment: &AssignmentSolution,
    professors: &[Professor],
    timeslots: &[Timeslot],
) -> Vec<TimetableEntry> {
    let by_name: HashMap<&str, &Professor> =
        professors.iter().map(|p| (p.name.as_str(), p)).collect();

    solution
        .slots
        .iter()
        .map(|(section_name, &slot_index)| {
            let professor_name = &assignment.assigned[section_name];
            let professor = by_name[professor_name.as_str()];
            let slot = &timeslots[slot_index];
            TimetableEntry {
                professor: professor_name.clone(),
                section: section_name.clone(),
                start: slot.start,
                end: slot.end,
                day_pattern: slot.day_pattern(),
                preferred: professor.prefers_slot(slot),
            }
        })
        .collect()
}

/// Per-professor view of the assignment: sections and units per semester.
pub fn professor_loads(
    professors: &[Professor],
    sections: &[Section],
    solution: &AssignmentSolution,
) -> Vec<ProfessorLoad> {
    let mut loads: Vec<ProfessorLoad> = professors
        .iter()
        .map(|professor| ProfessorLoad {
            professor: professor.name.clone(),
            total_units: 0,
            units: Default::default(),
            sections: Default::default(),
        })
        .collect();
    loads.sort_by(|a, b| a.professor.cmp(&b.professor));

    let index_of: HashMap<String, usize> = loads
        .iter()
        .enumerate()
        .map(|(i, load)| (load.professor.clone(), i))
        .collect();

    for section in sections {
        let name = section.name();
        let Some(assignee) = solution.assigned.get(&name) else {
            continue;
        };
        let load = &mut loads[index_of[assignee.as_str()]];
        load.total_units += section.units;
        *load.units.entry(section.semester.clone()).or_default() += section.units;
        load.sections
            .entry(section.semester.clone())
            .or_default()
            .push(name);
    }
    for load in &mut loads {
        for names in load.sections.values_mut() {
            names.sort();
        }
    }
    loads
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    fn professor(name: &str, prefers: &[&str]) -> Professor {
        Professor {
            name: name.to_string(),
            max_units: 12,
            can_teach: HashSet::new(),
            preferences: prefers.iter().map(|c| c.to_string()).collect(),
            preferred_times: HashMap::new(),
        }
    }

    fn section(course: &str, index: u32, semester: &str) -> Section {
        Section {
            course: course.to_string(),
            index,
            semester: semester.to_string(),
            units: 4,
            must_offer: true,
            is_lab: false,
        }
    }

    #[test]
    fn report_marks_requested_and_unassigned_sections() {
        let professors = vec![professor("A", &["CS101"])];
        let sections = vec![section("CS101", 0, "Fall"), section("CS201", 0, "Fall")];
        let solution = AssignmentSolution {
            assigned: BTreeMap::from([("Fall CS101 Section 0".to_string(), "A".to_string())]),
            requests_met: 1,
        };

        let rows = assignment_report(&sections, &professors, &solution);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].professor.as_deref(), Some("A"));
        assert!(rows[0].requested);
        assert_eq!(rows[1].professor, None);
        assert!(!rows[1].requested);
    }

    #[test]
    fn loads_accumulate_units_per_semester() {
        let professors = vec![professor("A", &[]), professor("B", &[])];
        let sections = vec![
            section("CS101", 0, "Fall"),
            section("CS101", 1, "Spring"),
            section("CS201", 0, "Fall"),
        ];
        let solution = AssignmentSolution {
            assigned: BTreeMap::from([
                ("Fall CS101 Section 0".to_string(), "A".to_string()),
                ("Spring CS101 Section 1".to_string(), "A".to_string()),
                ("Fall CS201 Section 0".to_string(), "B".to_string()),
            ]),
            requests_met: 0,
        };

        let loads = professor_loads(&professors, &sections, &solution);
        assert_eq!(loads[0].professor, "A");
        assert_eq!(loads[0].total_units, 8);
        assert_eq!(loads[0].units["Fall"], 4);
        assert_eq!(loads[0].units["Spring"], 4);
        assert_eq!(loads[1].total_units, 4);
    }
}
