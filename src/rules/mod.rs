//! Academic rules engine.
//!
//! Decides whether a course (or a whole proposed selection) may legally be
//! taken and assigns each candidate a priority. Rule violations are normal
//! outcomes, so they are returned as structured errors inside result
//! objects and never raised.

pub mod schedule;

pub use schedule::{ConflictKind, ScheduleConflict};

use crate::analysis::AcademicStatus;
use crate::curriculum::{
    Curriculum, CurriculumVersion, Difficulty, GeneralCourseRules, SemesterOfferings,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credit ceiling and floor derived from GPA. Boundaries are inclusive at
/// the lower GPA of each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBand {
    pub max_credits: u32,
    pub min_credits: u32,
}

impl CreditBand {
    pub fn for_gpa(gpa: f64) -> Self {
        if gpa >= 17.0 {
            Self { max_credits: 24, min_credits: 12 }
        } else if gpa >= 15.0 {
            Self { max_credits: 20, min_credits: 12 }
        } else if gpa >= 12.0 {
            Self { max_credits: 18, min_credits: 12 }
        } else {
            Self { max_credits: 16, min_credits: 14 }
        }
    }
}

/// Verdict for one candidate course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseValidationResult {
    pub course_code: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub priority_score: i32,
}

/// Difficulty/type distribution of a proposed selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BalanceAnalysis {
    pub difficulty_distribution: BTreeMap<Difficulty, u32>,
    pub type_distribution: BTreeMap<crate::curriculum::CourseType, u32>,
    pub warnings: Vec<String>,
    pub balance_score: i32,
}

/// Which high-priority needs the selection addresses or ignores.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriorityAnalysis {
    pub selected_failed_courses: Vec<String>,
    pub missed_failed_courses: Vec<String>,
    pub missing_prerequisites: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Aggregate verdict for a full proposed course set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionValidation {
    pub course_validations: Vec<CourseValidationResult>,
    pub total_credits: u32,
    pub credit_band: CreditBand,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_valid: bool,
    pub balance: BalanceAnalysis,
    pub priorities: PriorityAnalysis,
}

/// Validates a single candidate against every applicable rule. Checks do
/// not short-circuit; all failures accumulate into `errors`.
pub fn validate_course(
    course_code: &str,
    status: &AcademicStatus,
    curriculum: &Curriculum,
    general: &GeneralCourseRules,
    offerings: &SemesterOfferings,
    already_selected: &[String],
) -> CourseValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // 1. Offered this semester at all.
    if !offerings.is_offered(course_code, status.group_assignment.as_deref()) {
        errors.push(format!("درس {course_code} در این ترم ارائه نمی‌شود"));
    }

    // 2. Prerequisites, each missing one reported individually.
    if let Some(info) = curriculum.course_info(course_code) {
        for prereq in &info.prerequisites {
            if !status.has_completed(prereq) {
                errors.push(format!("پیش‌نیاز {prereq} گذرانده نشده است"));
            }
        }
    }

    // 3. Cohort restriction for early post-1403 semesters.
    if let Some(group) = restricted_group(status) {
        if !offerings.offered_to_group(course_code, group) {
            errors.push(format!("درس {course_code} برای گروه {group} ارائه نمی‌شود"));
        }
    }

    // 4. General-education constraints.
    check_general_rules(course_code, status, general, already_selected, &mut errors);

    // 5. Schedule conflicts against everything already picked.
    if let Some(course) = offerings.find(course_code) {
        for other_code in already_selected {
            if other_code == course_code {
                continue;
            }
            let Some(other) = offerings.find(other_code) else { continue };
            for conflict in schedule::find_conflicts(course, other) {
                errors.push(format!(
                    "تداخل زمانی با درس {}: {}",
                    conflict.other_code, conflict.details
                ));
            }
        }
    }

    // 6. Priority score.
    let priority_score = course_priority(course_code, status, curriculum);

    // 7. Non-blocking advisories.
    course_warnings(course_code, status, curriculum, &mut warnings);

    CourseValidationResult {
        course_code: course_code.to_string(),
        is_valid: errors.is_empty(),
        errors,
        warnings,
        priority_score,
    }
}

/// The cohort group the student is pinned to, when restrictions are active.
fn restricted_group(status: &AcademicStatus) -> Option<&str> {
    if status.curriculum_version != CurriculumVersion::Post1403 || status.current_semester > 2 {
        return None;
    }
    status.group_assignment.as_deref()
}

fn check_general_rules(
    course_code: &str,
    status: &AcademicStatus,
    general: &GeneralCourseRules,
    already_selected: &[String],
    errors: &mut Vec<String>,
) {
    if general.is_religious(course_code) {
        let selected_religious = already_selected
            .iter()
            .filter(|code| general.is_religious(code))
            .count();
        if selected_religious >= 1 {
            errors.push("در هر ترم فقط یک درس معارف اسلامی قابل انتخاب است".to_string());
        }
    }

    if general.is_physical_education(course_code) {
        let completed_pe_credits: u32 = status
            .completed_courses
            .iter()
            .filter(|course| general.is_physical_education(&course.course_code))
            .map(|course| course.credits)
            .sum();
        if completed_pe_credits >= 2 {
            errors.push("حداکثر 2 واحد تربیت بدنی در کل دوره مجاز است".to_string());
        }
    }

    if let Some(language) = general.language_course(course_code) {
        for prereq in &language.prerequisites {
            if !status.has_completed(prereq) {
                errors.push(format!("پیش‌نیاز {prereq} برای درس زبان گذرانده نشده است"));
            }
        }
    }
}

/// Priority score for one candidate: failed courses dominate, then
/// prerequisite fan-out, then how overdue the course is, then electives.
pub fn course_priority(
    course_code: &str,
    status: &AcademicStatus,
    curriculum: &Curriculum,
) -> i32 {
    let mut priority = 0;

    if let Some(failed) = status.failed_course(course_code) {
        priority += 100 + failed.attempt_number as i32 * 10;
    }

    if curriculum.is_prerequisite_for_others(course_code) {
        priority += 50;
    }

    if curriculum.is_elective(course_code) {
        priority += 10;
    }

    if let Some(recommended) = curriculum.recommended_semester(course_code) {
        if recommended <= status.current_semester {
            priority += 30;
        } else if recommended == status.current_semester + 1 {
            priority += 20;
        }
    }

    priority
}

fn course_warnings(
    course_code: &str,
    status: &AcademicStatus,
    curriculum: &Curriculum,
    warnings: &mut Vec<String>,
) {
    if curriculum.difficulty_of(course_code) == Difficulty::Hard && status.gpa < 14.0 {
        warnings.push(format!("درس {course_code} سطح دشواری بالایی دارد"));
    }

    if let Some(track) = curriculum.track_of(course_code) {
        let track_credits: u32 = status
            .completed_courses
            .iter()
            .filter(|course| track.courses.iter().any(|c| *c == course.course_code))
            .map(|course| course.credits)
            .sum();
        if track_credits > 18 {
            warnings.push("تعداد واحدهای انتخابی از این گرایش بالا است".to_string());
        }
    }
}

/// Validates a full proposed set: each course individually (the others act
/// as the conflict context), then the credit band, balance and priority
/// coverage of the whole.
pub fn validate_selection(
    selected_courses: &[String],
    status: &AcademicStatus,
    curriculum: &Curriculum,
    general: &GeneralCourseRules,
    offerings: &SemesterOfferings,
) -> SelectionValidation {
    let mut course_validations = Vec::with_capacity(selected_courses.len());
    let mut total_credits = 0u32;

    for course_code in selected_courses {
        let others: Vec<String> = selected_courses
            .iter()
            .filter(|code| *code != course_code)
            .cloned()
            .collect();
        let validation =
            validate_course(course_code, status, curriculum, general, offerings, &others);
        if validation.is_valid {
            total_credits += offerings.course_credits(course_code).unwrap_or(0);
        }
        course_validations.push(validation);
    }

    let credit_band = CreditBand::for_gpa(status.gpa);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    if total_credits > credit_band.max_credits {
        errors.push(format!(
            "تعداد واحدها ({total_credits}) از حد مجاز ({}) بیشتر است",
            credit_band.max_credits
        ));
    } else if total_credits < credit_band.min_credits {
        warnings.push(format!(
            "تعداد واحدها ({total_credits}) کمتر از حداقل مجاز ({}) است",
            credit_band.min_credits
        ));
    }

    let balance = analyze_balance(selected_courses, curriculum);
    warnings.extend(balance.warnings.iter().cloned());

    let priorities = analyze_priorities(selected_courses, status, curriculum);
    warnings.extend(priorities.suggestions.iter().cloned());

    SelectionValidation {
        is_valid: errors.is_empty(),
        course_validations,
        total_credits,
        credit_band,
        errors,
        warnings,
        balance,
        priorities,
    }
}

fn analyze_balance(selected_courses: &[String], curriculum: &Curriculum) -> BalanceAnalysis {
    let mut difficulty_distribution = BTreeMap::new();
    let mut type_distribution = BTreeMap::new();

    for course_code in selected_courses {
        *difficulty_distribution
            .entry(curriculum.difficulty_of(course_code))
            .or_insert(0) += 1;
        let course_type = curriculum
            .course_info(course_code)
            .map(|info| info.course_type)
            .unwrap_or_default();
        *type_distribution.entry(course_type).or_insert(0) += 1;
    }

    let mut warnings = Vec::new();
    let hard = *difficulty_distribution.get(&Difficulty::Hard).unwrap_or(&0);
    if hard > 2 {
        warnings.push("تعداد دروس سخت زیاد است - توصیه می‌شود تعادل ایجاد کنید".to_string());
    }
    let specialized = *type_distribution
        .get(&crate::curriculum::CourseType::Specialized)
        .unwrap_or(&0);
    if specialized > 3 {
        warnings.push("تعداد دروس تخصصی زیاد است - دروس عمومی را نیز در نظر بگیرید".to_string());
    }

    let total = selected_courses.len() as f64;
    let mut balance_score = 100i32;
    if total > 0.0 {
        let hard_ratio = f64::from(hard) / total;
        if hard_ratio > 0.6 {
            balance_score -= 30;
        } else if hard_ratio < 0.1 {
            balance_score -= 10;
        }
        let specialized_ratio = f64::from(specialized) / total;
        if specialized_ratio > 0.7 {
            balance_score -= 20;
        }
    }

    BalanceAnalysis {
        difficulty_distribution,
        type_distribution,
        warnings,
        balance_score: balance_score.max(0),
    }
}

fn analyze_priorities(
    selected_courses: &[String],
    status: &AcademicStatus,
    curriculum: &Curriculum,
) -> PriorityAnalysis {
    let selected_failed_courses: Vec<String> = status
        .failed_courses
        .iter()
        .filter(|course| selected_courses.iter().any(|c| *c == course.course_code))
        .map(|course| course.course_code.clone())
        .collect();
    let missed_failed_courses: Vec<String> = status
        .failed_courses
        .iter()
        .filter(|course| !selected_courses.iter().any(|c| *c == course.course_code))
        .map(|course| course.course_code.clone())
        .collect();

    let mut missing_prerequisites = Vec::new();
    for course_code in selected_courses {
        if let Some(info) = curriculum.course_info(course_code) {
            for prereq in &info.prerequisites {
                if !status.has_completed(prereq) && !missing_prerequisites.contains(prereq) {
                    missing_prerequisites.push(prereq.clone());
                }
            }
        }
    }

    let mut suggestions = Vec::new();
    if !missed_failed_courses.is_empty() {
        suggestions.push(format!(
            "دروس مردودی نادیده گرفته شده: {}",
            missed_failed_courses.join("، ")
        ));
    }
    if !missing_prerequisites.is_empty() {
        suggestions.push(format!(
            "پیش‌نیازهای مفقود: {}",
            missing_prerequisites.join("، ")
        ));
    }

    PriorityAnalysis {
        selected_failed_courses,
        missed_failed_courses,
        missing_prerequisites,
        suggestions,
    }
}
