use crate::data::{Section, SchedulingInput};
use crate::error::SolveError;
use log::debug;
use std::collections::HashSet;

/// Precondition checks over the input tables. Everything here is fatal and
/// surfaces before any model is built, naming the offending entity; solver
/// infeasibility after these pass points at genuinely conflicting constraints.
pub fn validate(input: &SchedulingInput, sections: &[Section]) -> Result<(), SolveError> {
    let mut course_names = HashSet::new();
    for course in &input.courses {
        if !course_names.insert(course.name.as_str()) {
            return Err(invalid(format!(
                "course {} is defined more than once",
                course.name
            )));
        }
    }

    let mut professor_names = HashSet::new();
    for professor in &input.professors {
        if !professor_names.insert(professor.name.as_str()) {
            return Err(invalid(format!(
                "professor {} is defined more than once",
                professor.name
            )));
        }
    }

    // capability and preference tables must agree with the course table
    for professor in &input.professors {
        for course in professor.can_teach.iter().chain(&professor.preferences) {
            if !course_names.contains(course.as_str()) {
                return Err(invalid(format!(
                    "professor {} references unknown course {}",
                    professor.name, course
                )));
            }
        }
    }

    for course in &input.courses {
        for (semester, mandatory) in &course.must_offer {
            let offered = match course.sections.get(semester) {
                Some(count) => *count,
                None => {
                    return Err(invalid(format!(
                        "course {} has mandatory offerings for {} but no sections there",
                        course.name, semester
                    )));
                }
            };
            if *mandatory > offered {
                return Err(invalid(format!(
                    "course {} in {}: {} mandatory offerings but only {} sections",
                    course.name, semester, mandatory, offered
                )));
            }
        }
    }

    for course in &input.courses {
        let teachable = input
            .professors
            .iter()
            .any(|professor| professor.can_teach.contains(&course.name));
        if !teachable {
            return Err(invalid(format!("No professor can teach {}", course.name)));
        }
    }

    let capacity: u32 = input.professors.iter().map(|p| p.max_units).sum();
    let mandatory_units: u32 = sections
        .iter()
        .filter(|section| section.must_offer)
        .map(|section| section.units)
        .sum();
    if mandatory_units > capacity {
        return Err(invalid(format!(
            "professors can only teach {} units but mandatory sections require {} units total",
            capacity, mandatory_units
        )));
    }

    for (index, slot) in input.timeslots.iter().enumerate() {
        if slot.start >= slot.end {
            return Err(invalid(format!(
                "timeslot {} ends at {} before it starts at {}",
                index, slot.end, slot.start
            )));
        }
        if !slot.weekdays.iter().any(|day| *day) {
            return Err(invalid(format!("timeslot {} has no weekday set", index)));
        }
    }

    debug!(
        "input validated: {} professors, {} courses, {} sections, {} timeslots",
        input.professors.len(),
        input.courses.len(),
        sections.len(),
        input.timeslots.len()
    );
    Ok(())
}

fn invalid(message: String) -> SolveError {
    SolveError::InvalidInput(message)
}
