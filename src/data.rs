use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

// Type aliases for clarity
pub type CourseName = String;
pub type ProfessorName = String;
pub type SemesterName = String;

/// Hard cap on the units a professor may teach in a single semester.
pub const MAX_UNITS_PER_SEMESTER: u32 = 12;

pub const WEEKDAY_NAMES: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Coarse time-of-day bucket derived from a timeslot's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DaySegment {
    Morning,
    Afternoon,
    Evening,
}

impl DaySegment {
    /// Buckets a start time (minutes since midnight): before noon is Morning,
    /// before 17:00 is Afternoon, anything later is Evening.
    pub fn from_start(minute: u32) -> Self {
        if minute < 12 * 60 {
            DaySegment::Morning
        } else if minute < 17 * 60 {
            DaySegment::Afternoon
        } else {
            DaySegment::Evening
        }
    }
}

impl fmt::Display for DaySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySegment::Morning => write!(f, "Morning"),
            DaySegment::Afternoon => write!(f, "Afternoon"),
            DaySegment::Evening => write!(f, "Evening"),
        }
    }
}

/// A professor with their teaching capacity, capabilities, and preferences.
///
/// `preferences` is not required to be a subset of `can_teach`; only capability
/// restricts what may be assigned.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Professor {
    pub name: ProfessorName,
    pub max_units: u32,
    #[serde(default)]
    pub can_teach: HashSet<CourseName>,
    #[serde(default)]
    pub preferences: HashSet<CourseName>,
    /// Preferred day segments keyed by day pattern, e.g.
    /// "Monday-Wednesday-Friday" -> {Morning, Afternoon}.
    #[serde(default)]
    pub preferred_times: HashMap<String, HashSet<DaySegment>>,
}

impl Professor {
    pub fn prefers_course(&self, course: &str) -> bool {
        self.preferences.contains(course)
    }

    /// Whether this slot's day segment is preferred for its day pattern.
    pub fn prefers_slot(&self, slot: &Timeslot) -> bool {
        self.preferred_times
            .get(&slot.day_pattern())
            .is_some_and(|segments| segments.contains(&slot.day_segment()))
    }
}

impl fmt::Display for Professor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One row of the course table: unit weight, lab flag, and per-semester
/// section and mandatory-offering counts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: CourseName,
    pub units: u32,
    #[serde(default)]
    pub is_lab: bool,
    /// Number of sections to derive per semester.
    #[serde(default)]
    pub sections: HashMap<SemesterName, u32>,
    /// How many of those sections must be offered (the rest are optional).
    #[serde(default)]
    pub must_offer: HashMap<SemesterName, u32>,
}

/// One offering instance of a course in one semester. Derived once from the
/// course table and immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub course: CourseName,
    pub index: u32,
    pub semester: SemesterName,
    pub units: u32,
    pub must_offer: bool,
    pub is_lab: bool,
}

impl Section {
    pub fn name(&self) -> String {
        format!("{} {} Section {}", self.semester, self.course, self.index)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A weekly timeslot: start/end in minutes since midnight plus Monday-Friday flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeslot {
    pub weekdays: [bool; 5],
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub is_lab: bool,
}

impl Timeslot {
    /// Canonical day pattern string, e.g. "Monday-Wednesday-Friday".
    pub fn day_pattern(&self) -> String {
        let days: Vec<&str> = self
            .weekdays
            .iter()
            .zip(WEEKDAY_NAMES)
            .filter(|(active, _)| **active)
            .map(|(_, name)| name)
            .collect();
        days.join("-")
    }

    pub fn day_segment(&self) -> DaySegment {
        DaySegment::from_start(self.start)
    }

    /// Two slots conflict when they share a weekday and their [start, end]
    /// intervals overlap, boundaries included.
    pub fn conflicts_with(&self, other: &Timeslot) -> bool {
        let shared_day = self
            .weekdays
            .iter()
            .zip(other.weekdays.iter())
            .any(|(a, b)| *a && *b);
        shared_day && self.start <= other.end && other.start <= self.end
    }

    pub fn time_range(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day_pattern(), self.time_range())
    }
}

/// The complete input for a scheduling run: already-parsed typed tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub professors: Vec<Professor>,
    pub courses: Vec<Course>,
    pub timeslots: Vec<Timeslot>,
}

impl SchedulingInput {
    /// Semester list: the sorted union of semester names across all courses.
    pub fn semesters(&self) -> Vec<SemesterName> {
        let names: BTreeSet<&SemesterName> = self
            .courses
            .iter()
            .flat_map(|course| course.sections.keys())
            .collect();
        names.into_iter().cloned().collect()
    }

    /// Expands per-semester section counts into concrete sections. Indices run
    /// continuously per course across semesters; within a semester the first
    /// `must_offer` sections are mandatory.
    pub fn derive_sections(&self, semesters: &[SemesterName]) -> Vec<Section> {
        let mut courses: Vec<&Course> = self.courses.iter().collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));

        let mut sections = Vec::new();
        for course in courses {
            let mut index = 0;
            for semester in semesters {
                let count = course.sections.get(semester).copied().unwrap_or(0);
                let mandatory = course.must_offer.get(semester).copied().unwrap_or(0);
                for offering in 0..count {
                    sections.push(Section {
                        course: course.name.clone(),
                        index,
                        semester: semester.clone(),
                        units: course.units,
                        must_offer: offering < mandatory,
                        is_lab: course.is_lab,
                    });
                    index += 1;
                }
            }
        }
        sections
    }
}

/// Solver configuration carried through the whole pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolveOptions {
    /// Passed to the solver as its time limit; a hit limit surfaces as a
    /// timeout error, not as infeasibility.
    pub time_limit_secs: Option<f64>,
    pub threads: Option<i32>,
    pub random_seed: Option<i32>,
    /// Weight on cross-professor slot conflicts in the timetable objective.
    pub conflict_weight: i64,
    /// Weight on time-of-day preference hits in the timetable objective.
    pub preference_weight: i64,
    /// Cap on worker threads for per-semester solves and enumeration;
    /// defaults to the number of cores.
    pub worker_threads: Option<usize>,
    /// Also enumerate alternate equally-optimal assignments.
    pub enumerate_alternates: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_secs: None,
            threads: None,
            random_seed: None,
            conflict_weight: 3,
            preference_weight: 2,
            worker_threads: None,
            enumerate_alternates: false,
        }
    }
}

impl SolveOptions {
    /// Worker pool size for `jobs` independent solves.
    pub(crate) fn workers(&self, jobs: usize) -> usize {
        let cap = self.worker_threads.unwrap_or_else(num_cpus::get);
        cap.min(jobs).max(1)
    }
}

/// One section's staffing outcome, with the preference recomputed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAssignment {
    pub section: String,
    pub course: CourseName,
    pub professor: Option<ProfessorName>,
    pub requested: bool,
}

/// One taught section's placement in the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub professor: ProfessorName,
    pub section: String,
    pub start: u32,
    pub end: u32,
    pub day_pattern: String,
    pub preferred: bool,
}

/// Everything solved for one semester. A failed timetable pass keeps the
/// assignments and carries the failure message instead of entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterSchedule {
    pub semester: SemesterName,
    pub assignments: Vec<SectionAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timetable: Option<Vec<TimetableEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timetable_error: Option<String>,
}

/// Per-professor load summary across semesters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorLoad {
    pub professor: ProfessorName,
    pub total_units: u32,
    pub units: BTreeMap<SemesterName, u32>,
    pub sections: BTreeMap<SemesterName, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    /// Assignment objective: preference-satisfying assignments.
    pub requests_met: i64,
    /// Timetable preference hits, summed over solved semesters.
    pub timetable_requests_met: i64,
    /// Cross-professor slot conflicts, summed over solved semesters.
    pub cross_conflicts: i64,
    pub wall_time_secs: f64,
}

/// The final output of a scheduling run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutput {
    pub semesters: Vec<SemesterSchedule>,
    pub professor_loads: Vec<ProfessorLoad>,
    pub stats: SolveStats,
    /// Alternate equally-optimal assignments, present when enumeration was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_assignments: Option<Vec<Vec<SectionAssignment>>>,
}
