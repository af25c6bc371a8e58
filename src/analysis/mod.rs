//! Academic status derivation.
//!
//! Turns a student's raw grade-attempt history plus the governing
//! curriculum chart into one [`AcademicStatus`] snapshot. Nothing here is
//! persisted; the snapshot is recomputed from the store on every
//! recommendation request.

use crate::curriculum::{CourseType, Curriculum, CurriculumVersion};
use crate::students::{GradeAttempt, StudentRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

/// Standing derived from GPA and recent failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicStanding {
    Normal,
    GoodStanding,
    Excellent,
    Probation,
}

/// Coarse progress level used in the advisory narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    Introductory,
    Intermediate,
    Advanced,
    Final,
}

impl AcademicLevel {
    pub fn persian_name(self) -> &'static str {
        match self {
            Self::Introductory => "مقدماتی",
            Self::Intermediate => "میانی",
            Self::Advanced => "پیشرفته",
            Self::Final => "نهایی",
        }
    }
}

/// Authoritative outcome of one course (latest attempt only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResult {
    pub course_code: String,
    pub course_name: String,
    pub grade: f64,
    pub credits: u32,
    pub course_type: CourseType,
    pub attempt_number: u32,
    #[serde(default)]
    pub semester_taken: Option<u32>,
}

/// Progress inside one specialization track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackProgress {
    pub credits_completed: u32,
    pub minimum_required: u32,
    pub is_sufficient: bool,
}

/// Where the student stands on elective concentrations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpecializationStatus {
    pub selection_allowed: bool,
    pub selected_group: Option<String>,
    pub completed_specialized_credits: u32,
    pub progress_by_group: BTreeMap<String, TrackProgress>,
}

/// Credit accounting toward graduation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationProgress {
    pub credits_passed: u32,
    pub credits_required: u32,
    pub progress_percentage: f64,
    pub level: AcademicLevel,
    pub credits_by_type: BTreeMap<CourseType, u32>,
    pub remaining_credits: u32,
    pub estimated_semesters_remaining: u32,
}

/// One derived snapshot of a student's academic situation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicStatus {
    pub student_id: Uuid,
    pub student_number: String,
    pub gpa: f64,
    pub total_credits_passed: u32,
    pub standing: AcademicStanding,
    pub entry_year: i32,
    pub current_semester: u32,
    pub curriculum_version: CurriculumVersion,
    pub group_assignment: Option<String>,
    pub failed_courses: Vec<CourseResult>,
    pub completed_courses: Vec<CourseResult>,
    pub prerequisite_status: BTreeMap<String, bool>,
    pub specialization_status: SpecializationStatus,
    pub graduation_progress: GraduationProgress,
}

impl AcademicStatus {
    pub fn completed_codes(&self) -> HashSet<&str> {
        self.completed_courses
            .iter()
            .map(|c| c.course_code.as_str())
            .collect()
    }

    pub fn has_completed(&self, course_code: &str) -> bool {
        self.completed_courses
            .iter()
            .any(|c| c.course_code == course_code)
    }

    pub fn failed_course(&self, course_code: &str) -> Option<&CourseResult> {
        self.failed_courses
            .iter()
            .find(|c| c.course_code == course_code)
    }

    /// Chart courses whose prerequisite set is not yet satisfied.
    pub fn unmet_prerequisites(&self) -> Vec<&str> {
        self.prerequisite_status
            .iter()
            .filter(|(_, met)| !**met)
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn group_restrictions_active(&self) -> bool {
        self.group_assignment.is_some() && self.current_semester <= 2
    }
}

/// Derives the full academic snapshot. Absent grade data degrades to a
/// zeroed snapshot instead of failing; an unknown student is the caller's
/// NotFound concern.
pub fn analyze_status(student: &StudentRecord, curriculum: &Curriculum) -> AcademicStatus {
    let authoritative = authoritative_attempts(&student.grades);

    let (gpa, total_credits_passed) = gpa_and_passed_credits(&authoritative, curriculum);
    let completed_courses = course_results(&authoritative, curriculum, true);
    let failed_courses = course_results(&authoritative, curriculum, false);
    let standing = determine_standing(gpa, &authoritative);

    let completed_codes: HashSet<&str> = completed_courses
        .iter()
        .map(|c| c.course_code.as_str())
        .collect();
    let prerequisite_status = prerequisite_status(&completed_codes, curriculum);
    let specialization_status =
        specialization_status(&completed_courses, student.current_semester, curriculum);
    let graduation_progress =
        graduation_progress(total_credits_passed, &completed_courses, curriculum);

    let curriculum_version = CurriculumVersion::for_entry_year(student.entry_year);
    let group_assignment = group_assignment(curriculum_version, &student.student_number);

    AcademicStatus {
        student_id: student.id,
        student_number: student.student_number.clone(),
        gpa,
        total_credits_passed,
        standing,
        entry_year: student.entry_year,
        current_semester: student.current_semester,
        curriculum_version,
        group_assignment,
        failed_courses,
        completed_courses,
        prerequisite_status,
        specialization_status,
        graduation_progress,
    }
}

/// Groups attempts by course code and keeps the highest attempt number per
/// course. Output is ordered by course code for determinism.
fn authoritative_attempts(grades: &[GradeAttempt]) -> Vec<&GradeAttempt> {
    let mut latest: BTreeMap<&str, &GradeAttempt> = BTreeMap::new();
    for attempt in grades {
        latest
            .entry(attempt.course_code.as_str())
            .and_modify(|current| {
                if attempt.attempt_number > current.attempt_number {
                    *current = attempt;
                }
            })
            .or_insert(attempt);
    }
    latest.into_values().collect()
}

fn course_credits(course_code: &str, curriculum: &Curriculum) -> u32 {
    match curriculum.course_info(course_code) {
        Some(info) => info.total_credits(),
        None => {
            warn!(course_code, "grade attempt references a course unknown to the chart");
            0
        }
    }
}

fn gpa_and_passed_credits(attempts: &[&GradeAttempt], curriculum: &Curriculum) -> (f64, u32) {
    let mut total_points = 0.0;
    let mut total_weight = 0u32;
    let mut passed_credits = 0u32;

    for attempt in attempts {
        let Some(grade) = attempt.grade else { continue };
        let credits = course_credits(&attempt.course_code, curriculum);
        total_points += grade * f64::from(credits);
        total_weight += credits;
        if grade >= 10.0 {
            passed_credits += credits;
        }
    }

    let gpa = if total_weight > 0 {
        (total_points / f64::from(total_weight) * 100.0).round() / 100.0
    } else {
        0.0
    };
    (gpa, passed_credits)
}

fn course_results(
    attempts: &[&GradeAttempt],
    curriculum: &Curriculum,
    passed: bool,
) -> Vec<CourseResult> {
    attempts
        .iter()
        .filter_map(|attempt| {
            let grade = attempt.grade?;
            if (grade >= 10.0) != passed {
                return None;
            }
            let info = curriculum.course_info(&attempt.course_code);
            Some(CourseResult {
                course_code: attempt.course_code.clone(),
                course_name: info
                    .map(|i| i.course_name.clone())
                    .unwrap_or_else(|| attempt.course_code.clone()),
                grade,
                credits: course_credits(&attempt.course_code, curriculum),
                course_type: info.map(|i| i.course_type).unwrap_or_default(),
                attempt_number: attempt.attempt_number,
                semester_taken: attempt.semester_taken,
            })
        })
        .collect()
}

/// Probation below GPA 12, otherwise graded by GPA, unless more than two
/// authoritative attempts failed in the most recent recorded semester.
fn determine_standing(gpa: f64, attempts: &[&GradeAttempt]) -> AcademicStanding {
    if gpa < 12.0 {
        return AcademicStanding::Probation;
    }

    let current_term = attempts
        .iter()
        .filter_map(|a| a.semester_taken)
        .max();
    if let Some(term) = current_term {
        let failed_in_term = attempts
            .iter()
            .filter(|a| a.semester_taken == Some(term))
            .filter(|a| a.grade.map(|g| g < 10.0).unwrap_or(false))
            .count();
        if failed_in_term > 2 {
            return AcademicStanding::Probation;
        }
    }

    if gpa >= 17.0 {
        AcademicStanding::Excellent
    } else if gpa >= 15.0 {
        AcademicStanding::GoodStanding
    } else {
        AcademicStanding::Normal
    }
}

fn prerequisite_status(
    completed_codes: &HashSet<&str>,
    curriculum: &Curriculum,
) -> BTreeMap<String, bool> {
    let mut status = BTreeMap::new();
    for plan in curriculum.semesters.values() {
        for course in &plan.courses {
            let met = course
                .prerequisites
                .iter()
                .all(|prereq| completed_codes.contains(prereq.as_str()));
            status.insert(course.course_code.clone(), met);
        }
    }
    status
}

fn specialization_status(
    completed: &[CourseResult],
    current_semester: u32,
    curriculum: &Curriculum,
) -> SpecializationStatus {
    let mut progress_by_group = BTreeMap::new();
    let credits_by_code: HashMap<&str, u32> = completed
        .iter()
        .map(|c| (c.course_code.as_str(), c.credits))
        .collect();

    for track in &curriculum.specialization_tracks {
        let credits_completed: u32 = track
            .courses
            .iter()
            .filter_map(|code| credits_by_code.get(code.as_str()))
            .sum();
        progress_by_group.insert(
            track.track_name.clone(),
            TrackProgress {
                credits_completed,
                minimum_required: track.min_credits,
                is_sufficient: credits_completed >= track.min_credits,
            },
        );
    }

    // A track counts as selected once at least 3 of its credits are done;
    // ties resolve to the first track in name order.
    let selected = progress_by_group
        .iter()
        .max_by(|a, b| {
            a.1.credits_completed
                .cmp(&b.1.credits_completed)
                .then_with(|| b.0.cmp(a.0))
        })
        .filter(|(_, progress)| progress.credits_completed >= 3);

    let (selected_group, completed_specialized_credits) = match selected {
        Some((name, progress)) => (Some(name.clone()), progress.credits_completed),
        None => (None, 0),
    };

    SpecializationStatus {
        selection_allowed: current_semester >= 5,
        selected_group,
        completed_specialized_credits,
        progress_by_group,
    }
}

fn graduation_progress(
    credits_passed: u32,
    completed: &[CourseResult],
    curriculum: &Curriculum,
) -> GraduationProgress {
    let credits_required = curriculum.total_credits_required;

    let mut credits_by_type = BTreeMap::new();
    for course in completed {
        *credits_by_type.entry(course.course_type).or_insert(0) += course.credits;
    }

    let percentage = if credits_required > 0 {
        (f64::from(credits_passed) / f64::from(credits_required) * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let level = if credits_passed < 35 {
        AcademicLevel::Introductory
    } else if credits_passed < 70 {
        AcademicLevel::Intermediate
    } else if credits_passed < 105 {
        AcademicLevel::Advanced
    } else {
        AcademicLevel::Final
    };

    let remaining_credits = credits_required.saturating_sub(credits_passed);
    GraduationProgress {
        credits_passed,
        credits_required,
        progress_percentage: percentage,
        level,
        credits_by_type,
        remaining_credits,
        estimated_semesters_remaining: (remaining_credits / 18).max(1),
    }
}

/// Cohort assignment for post-1403 entrants: even last digit of the
/// student number → "A", odd → "B". Unreadable numbers default to "A".
fn group_assignment(version: CurriculumVersion, student_number: &str) -> Option<String> {
    if version != CurriculumVersion::Post1403 {
        return None;
    }
    let group = match student_number.chars().last().and_then(|c| c.to_digit(10)) {
        Some(digit) if digit % 2 == 0 => "A",
        Some(_) => "B",
        None => {
            warn!(student_number, "student number has no trailing digit, defaulting to group A");
            "A"
        }
    };
    Some(group.to_string())
}
