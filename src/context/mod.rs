//! Context assembly.
//!
//! Produces one self-contained, fully typed context object per
//! (student, target-semester, preferences) request. The same object feeds
//! the rule-based selection pass and, rendered through
//! [`format::format_for_llm`], the language-model pass.

pub mod format;

pub use format::format_for_llm;

use crate::analysis::{AcademicStatus, CourseResult};
use crate::curriculum::{
    CatalogSource, Curriculum, CurriculumCourse, OfferedCourse, ReferenceStore, SemesterOfferings,
    SpecializationTrack,
};
use crate::rules::{self, CourseValidationResult, CreditBand};
use crate::students::StudentRecord;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Persian weekday names, Saturday first, as used across schedules.
pub const WEEKDAYS: [&str; 7] = [
    "شنبه",
    "یکشنبه",
    "دوشنبه",
    "سه‌شنبه",
    "چهارشنبه",
    "پنج‌شنبه",
    "جمعه",
];

/// Named teaching bands of the day.
pub const TIME_BANDS: [(&str, &str); 3] = [
    ("صبح", "8:00-13:00"),
    ("بعدازظهر", "14:00-19:00"),
    ("عصر", "19:30-22:00"),
];

/// Static scheduling metadata carried with every context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingInfo {
    pub weekdays: Vec<String>,
    pub time_bands: BTreeMap<String, String>,
}

impl Default for SchedulingInfo {
    fn default() -> Self {
        Self {
            weekdays: WEEKDAYS.iter().map(|day| (*day).to_string()).collect(),
            time_bands: TIME_BANDS
                .iter()
                .map(|(name, range)| ((*name).to_string(), (*range).to_string()))
                .collect(),
        }
    }
}

/// Free-form wishes forwarded by the student.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    #[serde(default)]
    pub desired_credits: Option<u32>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub preferred_schedule: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// Advisory posture chosen for this request; first matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrategy {
    RecoveryFocused,
    GpaImprovement,
    GraduationFocused,
    SpecializationFocused,
    FoundationBuilding,
}

/// Exactly one strategy per call: recovery when more than two courses are
/// failed, GPA repair below 12, graduation push from semester 7,
/// specialization from semester 5, foundations otherwise.
pub fn choose_strategy(status: &AcademicStatus) -> RecommendationStrategy {
    if status.failed_courses.len() > 2 {
        RecommendationStrategy::RecoveryFocused
    } else if status.gpa < 12.0 {
        RecommendationStrategy::GpaImprovement
    } else if status.current_semester >= 7 {
        RecommendationStrategy::GraduationFocused
    } else if status.current_semester >= 5 {
        RecommendationStrategy::SpecializationFocused
    } else {
        RecommendationStrategy::FoundationBuilding
    }
}

/// Completed courses grouped by grade band.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GradeBands {
    /// Grade ≥ 17.
    pub high: Vec<CourseResult>,
    /// 14 ≤ grade < 17.
    pub average: Vec<CourseResult>,
    /// 10 ≤ grade < 14.
    pub low: Vec<CourseResult>,
}

/// History section of the context.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AcademicHistory {
    pub completed: Vec<CourseResult>,
    pub completed_by_band: GradeBands,
    pub failed: Vec<CourseResult>,
    /// Failed courses already attempted more than once.
    pub repeated_failures: Vec<CourseResult>,
    pub met_prerequisites: Vec<String>,
    pub unmet_prerequisites: Vec<String>,
    /// Future mandatory courses currently blocked by missing prerequisites.
    pub blocking_courses: Vec<String>,
}

/// Chart expectations for one semester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterExpectation {
    pub semester: u32,
    pub semester_name: Option<String>,
    pub courses: Vec<CurriculumCourse>,
}

/// Cohort-restriction narrative.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GroupRestrictionInfo {
    pub applicable: bool,
    pub student_group: Option<String>,
    pub restrictions_active: bool,
    pub affected_semesters: Vec<u32>,
    pub freedom_starts_semester: u32,
}

/// Curriculum section of the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumContext {
    pub total_credits_required: u32,
    pub minimum_gpa: f64,
    pub current_semester_expectations: Option<SemesterExpectation>,
    pub next_semester_preview: Option<SemesterExpectation>,
    pub specialization_tracks: Vec<SpecializationTrack>,
    pub group_restrictions: GroupRestrictionInfo,
}

/// Static capacity summary read from the offerings document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapacitySummary {
    pub total_courses: u32,
    pub full_courses: u32,
    /// Courses at or above 80 % enrollment.
    pub high_demand_courses: Vec<String>,
    pub available_spots: BTreeMap<String, u32>,
}

/// Offerings section of the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingsContext {
    pub semester: String,
    pub persian_name: Option<String>,
    pub group_based_system: bool,
    pub special_notes: Vec<String>,
    pub capacity: CapacitySummary,
}

/// Constraint summary handed to both selection passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConstraints {
    pub credit_band: CreditBand,
    /// Softer target inside the band: (min + 2, max − 2).
    pub recommended_range: (u32, u32),
    pub must_take_failed: bool,
    pub prerequisite_gaps: bool,
    pub group_restrictions_active: bool,
    pub strategy: RecommendationStrategy,
    pub max_difficult_courses: u32,
    pub min_easy_courses: u32,
    pub specialization_focus: bool,
}

/// One candidate the student is structurally eligible to see, annotated
/// with its rules verdict and the catalog it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableCourse {
    pub course: OfferedCourse,
    pub source: CatalogSource,
    pub validation: CourseValidationResult,
}

impl AvailableCourse {
    pub fn code(&self) -> &str {
        &self.course.course_code
    }

    pub fn credits(&self) -> u32 {
        self.course.credits.total()
    }
}

/// The complete assembled context for one recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationContext {
    pub context_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub target_semester: String,
    pub status: AcademicStatus,
    pub history: AcademicHistory,
    pub curriculum: CurriculumContext,
    pub offerings: OfferingsContext,
    pub constraints: RecommendationConstraints,
    pub preferences: UserPreferences,
    pub available_courses: Vec<AvailableCourse>,
    pub scheduling: SchedulingInfo,
}

impl RecommendationContext {
    pub fn valid_courses(&self) -> impl Iterator<Item = &AvailableCourse> {
        self.available_courses
            .iter()
            .filter(|course| course.validation.is_valid)
    }

    pub fn find_available(&self, course_code: &str) -> Option<&AvailableCourse> {
        self.available_courses
            .iter()
            .find(|course| course.code() == course_code)
    }
}

/// Assembles the full context: derives the status snapshot, loads reference
/// data, filters and validates every visible candidate, and packages the
/// typed sections.
pub fn assemble_context(
    student: &StudentRecord,
    store: &ReferenceStore,
    target_semester: &str,
    preferences: UserPreferences,
) -> Result<RecommendationContext> {
    let version = crate::curriculum::CurriculumVersion::for_entry_year(student.entry_year);
    let curriculum = store.curriculum(version)?;
    let offerings = store.offerings(target_semester)?;
    let status = crate::analysis::analyze_status(student, curriculum);

    let available_courses = collect_available_courses(&status, curriculum, store, &offerings);
    let history = build_history(&status, curriculum);
    let curriculum_context = build_curriculum_context(&status, curriculum);
    let offerings_context = build_offerings_context(&offerings);
    let constraints = build_constraints(&status);

    Ok(RecommendationContext {
        context_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        target_semester: target_semester.to_string(),
        status,
        history,
        curriculum: curriculum_context,
        offerings: offerings_context,
        constraints,
        preferences,
        available_courses,
        scheduling: SchedulingInfo::default(),
    })
}

fn collect_available_courses(
    status: &AcademicStatus,
    curriculum: &Curriculum,
    store: &ReferenceStore,
    offerings: &SemesterOfferings,
) -> Vec<AvailableCourse> {
    let restrictions_active = status.group_restrictions_active();
    let mut seen = std::collections::HashSet::new();
    let mut courses = Vec::new();

    for (course, source) in offerings.all_courses() {
        if restrictions_active {
            if let CatalogSource::Group(group_id) = &source {
                if Some(group_id.as_str()) != status.group_assignment.as_deref() {
                    continue;
                }
            }
        }
        if !seen.insert(course.course_code.clone()) {
            continue;
        }
        let validation = rules::validate_course(
            &course.course_code,
            status,
            curriculum,
            store.general_rules(),
            offerings,
            &[],
        );
        courses.push(AvailableCourse {
            course: course.clone(),
            source,
            validation,
        });
    }
    courses
}

fn build_history(status: &AcademicStatus, curriculum: &Curriculum) -> AcademicHistory {
    let mut bands = GradeBands::default();
    for course in &status.completed_courses {
        if course.grade >= 17.0 {
            bands.high.push(course.clone());
        } else if course.grade >= 14.0 {
            bands.average.push(course.clone());
        } else {
            bands.low.push(course.clone());
        }
    }

    let repeated_failures = status
        .failed_courses
        .iter()
        .filter(|course| course.attempt_number > 1)
        .cloned()
        .collect();

    let met_prerequisites = status
        .prerequisite_status
        .iter()
        .filter(|(_, met)| **met)
        .map(|(code, _)| code.clone())
        .collect();
    let unmet_prerequisites = status
        .prerequisite_status
        .iter()
        .filter(|(_, met)| !**met)
        .map(|(code, _)| code.clone())
        .collect();

    AcademicHistory {
        completed: status.completed_courses.clone(),
        completed_by_band: bands,
        failed: status.failed_courses.clone(),
        repeated_failures,
        met_prerequisites,
        unmet_prerequisites,
        blocking_courses: blocking_courses(status, curriculum),
    }
}

/// Mandatory courses in future semesters whose prerequisites are not yet
/// satisfied.
fn blocking_courses(status: &AcademicStatus, curriculum: &Curriculum) -> Vec<String> {
    let completed = status.completed_codes();
    let mut blocked = Vec::new();
    for (semester, plan) in &curriculum.semesters {
        if *semester <= status.current_semester {
            continue;
        }
        for course in &plan.courses {
            if !course.is_mandatory || course.prerequisites.is_empty() {
                continue;
            }
            let met = course
                .prerequisites
                .iter()
                .all(|prereq| completed.contains(prereq.as_str()));
            if !met {
                blocked.push(course.course_code.clone());
            }
        }
    }
    blocked
}

fn semester_expectation(curriculum: &Curriculum, semester: u32) -> Option<SemesterExpectation> {
    curriculum
        .semester_plan(semester)
        .map(|plan| SemesterExpectation {
            semester,
            semester_name: plan.semester_name.clone(),
            courses: plan.courses.clone(),
        })
}

fn build_curriculum_context(status: &AcademicStatus, curriculum: &Curriculum) -> CurriculumContext {
    let group_restrictions = match &status.group_assignment {
        None => GroupRestrictionInfo {
            freedom_starts_semester: 3,
            ..GroupRestrictionInfo::default()
        },
        Some(group) => GroupRestrictionInfo {
            applicable: true,
            student_group: Some(group.clone()),
            restrictions_active: status.current_semester <= 2,
            affected_semesters: if status.current_semester <= 2 {
                vec![1, 2]
            } else {
                Vec::new()
            },
            freedom_starts_semester: 3,
        },
    };

    CurriculumContext {
        total_credits_required: curriculum.total_credits_required,
        minimum_gpa: curriculum.minimum_gpa,
        current_semester_expectations: semester_expectation(curriculum, status.current_semester),
        next_semester_preview: semester_expectation(curriculum, status.current_semester + 1),
        specialization_tracks: curriculum.specialization_tracks.clone(),
        group_restrictions,
    }
}

fn build_offerings_context(offerings: &SemesterOfferings) -> OfferingsContext {
    let mut capacity = CapacitySummary::default();
    for (course, _) in offerings.all_courses() {
        capacity.total_courses += 1;
        let (Some(cap), Some(enrolled)) = (course.capacity, course.enrolled) else {
            continue;
        };
        if enrolled >= cap {
            capacity.full_courses += 1;
        } else if f64::from(enrolled) >= f64::from(cap) * 0.8 {
            capacity.high_demand_courses.push(course.course_code.clone());
        }
        capacity
            .available_spots
            .insert(course.course_code.clone(), cap.saturating_sub(enrolled));
    }

    OfferingsContext {
        semester: offerings.semester.clone(),
        persian_name: offerings.persian_name.clone(),
        group_based_system: offerings.group_based_system,
        special_notes: offerings.special_notes.clone(),
        capacity,
    }
}

fn build_constraints(status: &AcademicStatus) -> RecommendationConstraints {
    let credit_band = CreditBand::for_gpa(status.gpa);
    RecommendationConstraints {
        credit_band,
        recommended_range: (
            credit_band.min_credits + 2,
            credit_band.max_credits.saturating_sub(2),
        ),
        must_take_failed: !status.failed_courses.is_empty(),
        prerequisite_gaps: status.prerequisite_status.values().any(|met| !met),
        group_restrictions_active: status.group_restrictions_active(),
        strategy: choose_strategy(status),
        max_difficult_courses: if status.gpa < 15.0 { 2 } else { 3 },
        min_easy_courses: 1,
        specialization_focus: status.current_semester >= 5,
    }
}
