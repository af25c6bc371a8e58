//! Recommendation engine.
//!
//! Reconciles the deterministic rule-based pass with the advisory model
//! pass, builds the weekly calendar, and re-validates the merged set
//! against the credit band. The model is a second opinion only; every hard
//! constraint is enforced here regardless of what it said.

pub mod schedule;

pub use schedule::{build_weekly_schedule, WeeklySchedule};

use crate::config::AppConfig;
use crate::context::{
    assemble_context, AvailableCourse, RecommendationContext, RecommendationStrategy,
    UserPreferences,
};
use crate::curriculum::{CourseType, Curriculum, Difficulty, ReferenceStore};
use crate::llm::{generate_llm_recommendations, CompletionClient, LlmRecommendation};
use crate::rules::CreditBand;
use crate::students::StudentRecord;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// One course in the final advisory list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRecommendation {
    pub course_code: String,
    pub course_name: String,
    pub credits: u32,
    pub priority_score: i32,
    pub reason: String,
    pub time_slots: Vec<String>,
    pub instructor: Option<String>,
    pub prerequisites_met: bool,
    pub difficulty: Difficulty,
    pub course_type: CourseType,
}

/// Deterministic verdict on the merged recommendation set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: ValidationSummary,
}

/// Counters the presentation layer surfaces alongside the verdict.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationSummary {
    pub total_credits: u32,
    pub total_courses: usize,
    pub difficulty_distribution: BTreeMap<Difficulty, u32>,
    pub type_distribution: BTreeMap<CourseType, u32>,
    pub failed_courses_covered: usize,
    pub prerequisites_covered: usize,
}

/// Narrative handed back to the student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub strategy_rationale: String,
    /// Priority label → course names actually recommended in that range.
    pub priority_groups: BTreeMap<String, Vec<String>>,
    pub total_credits: u32,
    pub balance_score: i32,
    pub conflicts_count: usize,
    pub distribution_quality: String,
    pub next_steps: Vec<String>,
}

/// Condensed academic picture echoed with every result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicSnapshot {
    pub gpa: f64,
    pub credit_band: CreditBand,
    pub failed_courses_count: usize,
    pub group_restrictions_active: bool,
}

/// Everything one recommendation request produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub student_number: String,
    pub target_semester: String,
    pub strategy: RecommendationStrategy,
    pub total_available_courses: usize,
    pub rule_based: Vec<CourseRecommendation>,
    pub llm_based: Option<LlmRecommendation>,
    pub final_recommendations: Vec<CourseRecommendation>,
    pub weekly_schedule: WeeklySchedule,
    pub validation: FinalValidation,
    pub academic_context: AcademicSnapshot,
    pub explanation: Explanation,
}

/// Full pipeline for one request: assemble context, run both passes, merge,
/// schedule, validate, explain. Analyzer/assembly failures propagate; a
/// failed model pass degrades to rule-based output with a logged warning.
pub fn generate_recommendations(
    student: &StudentRecord,
    store: &ReferenceStore,
    client: Option<&dyn CompletionClient>,
    target_semester: &str,
    preferences: UserPreferences,
    use_llm: bool,
    config: &AppConfig,
) -> Result<RecommendationResult> {
    info!(
        student = %student.student_number,
        target_semester,
        "generating course recommendations"
    );

    let context = assemble_context(student, store, target_semester, preferences)?;
    let curriculum = store.curriculum(context.status.curriculum_version)?;

    let rule_based = rule_based_recommendations(&context, curriculum);

    let llm_based = if use_llm {
        match client {
            Some(client) => {
                let offerings = store.offerings(target_semester)?;
                match generate_llm_recommendations(client, &context, &offerings, &config.llm) {
                    Ok(result) => Some(result),
                    Err(error) => {
                        warn!(%error, "LLM recommendation failed, using rule-based only");
                        None
                    }
                }
            }
            None => {
                warn!("no completion client configured, using rule-based only");
                None
            }
        }
    } else {
        None
    };

    let final_recommendations = combine_recommendations(
        &rule_based,
        llm_based.as_ref(),
        &context,
        curriculum,
        config.recommendation.max_recommendations,
    );

    let weekly_schedule = build_weekly_schedule(&final_recommendations);
    let validation = validate_final(&final_recommendations, &context);
    let explanation = build_explanation(&context, &final_recommendations, &weekly_schedule);

    info!(
        count = final_recommendations.len(),
        credits = weekly_schedule.total_credits,
        "recommendations ready"
    );

    Ok(RecommendationResult {
        student_number: student.student_number.clone(),
        target_semester: target_semester.to_string(),
        strategy: context.constraints.strategy,
        total_available_courses: context.available_courses.len(),
        academic_context: AcademicSnapshot {
            gpa: context.status.gpa,
            credit_band: context.constraints.credit_band,
            failed_courses_count: context.history.failed.len(),
            group_restrictions_active: context.constraints.group_restrictions_active,
        },
        rule_based,
        llm_based,
        final_recommendations,
        weekly_schedule,
        validation,
        explanation,
    })
}

fn make_recommendation(
    available: &AvailableCourse,
    curriculum: &Curriculum,
    priority_score: i32,
    reason: String,
) -> CourseRecommendation {
    let info = curriculum.course_info(available.code());
    CourseRecommendation {
        course_code: available.code().to_string(),
        course_name: available.course.course_name.clone(),
        credits: available.credits(),
        priority_score,
        reason,
        time_slots: available.course.time_slots.clone(),
        instructor: available.course.instructor.clone(),
        prerequisites_met: available.validation.is_valid,
        difficulty: curriculum.difficulty_of(available.code()),
        course_type: info.map(|i| i.course_type).unwrap_or_default(),
    }
}

/// Candidates for one tier, strongest validation priority first.
fn tier_candidates<'a>(
    context: &'a RecommendationContext,
    codes: impl IntoIterator<Item = String>,
    taken: &HashSet<String>,
) -> Vec<&'a AvailableCourse> {
    let mut candidates: Vec<&AvailableCourse> = codes
        .into_iter()
        .filter(|code| !taken.contains(code))
        .filter_map(|code| context.find_available(&code))
        .filter(|course| course.validation.is_valid)
        .collect();
    candidates.sort_by(|a, b| b.validation.priority_score.cmp(&a.validation.priority_score));
    candidates
}

/// Greedy, priority-tiered selection: failed courses, then missing
/// prerequisites, then current-term mandatory courses, then specialization
/// (semester >= 5), then electives until the minimum is met. The credit
/// ceiling is never exceeded.
pub fn rule_based_recommendations(
    context: &RecommendationContext,
    curriculum: &Curriculum,
) -> Vec<CourseRecommendation> {
    let max_credits = context.constraints.credit_band.max_credits;
    let min_credits = context.constraints.credit_band.min_credits;
    let mut recommendations: Vec<CourseRecommendation> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut current_credits = 0u32;

    let push_within_budget =
        |course: &AvailableCourse,
         score: i32,
         reason: String,
         recommendations: &mut Vec<CourseRecommendation>,
         taken: &mut HashSet<String>,
         current_credits: &mut u32| {
            if taken.contains(course.code()) {
                return false;
            }
            let credits = course.credits();
            if *current_credits + credits > max_credits {
                return false;
            }
            recommendations.push(make_recommendation(course, curriculum, score, reason));
            taken.insert(course.code().to_string());
            *current_credits += credits;
            true
        };

    // Tier 1: failed courses currently offered and valid.
    let failed_codes: Vec<String> = context
        .history
        .failed
        .iter()
        .map(|course| course.course_code.clone())
        .collect();
    for course in tier_candidates(context, failed_codes, &taken) {
        let attempt = context
            .status
            .failed_course(course.code())
            .map(|failed| failed.attempt_number)
            .unwrap_or(1);
        push_within_budget(
            course,
            100 + attempt as i32 * 10,
            format!("درس مردودی - تلاش {attempt}"),
            &mut recommendations,
            &mut taken,
            &mut current_credits,
        );
    }

    // Tier 2: the prerequisite courses still missing for blocked chart
    // courses; taking them is what unblocks future semesters.
    let mut missing_prereqs: Vec<String> = Vec::new();
    for blocked in &context.history.unmet_prerequisites {
        if let Some(info) = curriculum.course_info(blocked) {
            for prereq in &info.prerequisites {
                if !context.status.has_completed(prereq) && !missing_prereqs.contains(prereq) {
                    missing_prereqs.push(prereq.clone());
                }
            }
        }
    }
    for course in tier_candidates(context, missing_prereqs, &taken) {
        push_within_budget(
            course,
            80,
            "پیش‌نیاز برای دروس آینده".to_string(),
            &mut recommendations,
            &mut taken,
            &mut current_credits,
        );
    }

    // Tier 3: current-term mandatory courses not yet completed.
    let mandatory: Vec<String> = context
        .curriculum
        .current_semester_expectations
        .iter()
        .flat_map(|expectation| expectation.courses.iter())
        .filter(|course| course.is_mandatory)
        .filter(|course| !context.status.has_completed(&course.course_code))
        .map(|course| course.course_code.clone())
        .collect();
    for course in tier_candidates(context, mandatory, &taken) {
        push_within_budget(
            course,
            70,
            "درس اجباری ترم جاری".to_string(),
            &mut recommendations,
            &mut taken,
            &mut current_credits,
        );
    }

    // Tier 4: specialization-track courses from semester 5 on.
    if context.status.current_semester >= 5 {
        if let Some(track_codes) = specialization_codes(context, curriculum) {
            for course in tier_candidates(context, track_codes, &taken) {
                push_within_budget(
                    course,
                    60,
                    "تقویت گرایش تخصصی".to_string(),
                    &mut recommendations,
                    &mut taken,
                    &mut current_credits,
                );
            }
        }
    }

    // Tier 5: electives, only until the minimum credit floor is reached.
    if current_credits < min_credits {
        let electives: Vec<String> = curriculum
            .general_electives
            .iter()
            .map(|course| course.course_code.clone())
            .chain(
                curriculum
                    .specialization_tracks
                    .iter()
                    .flat_map(|track| track.courses.iter().cloned()),
            )
            .filter(|code| !context.status.has_completed(code))
            .collect();
        for course in tier_candidates(context, electives, &taken) {
            if current_credits >= min_credits {
                break;
            }
            push_within_budget(
                course,
                40,
                "تکمیل حداقل واحد مجاز".to_string(),
                &mut recommendations,
                &mut taken,
                &mut current_credits,
            );
        }
    }

    recommendations.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    recommendations
}

/// Track to draw tier-4 candidates from: the selected group, else the one
/// with the most completed credits.
fn specialization_codes(
    context: &RecommendationContext,
    curriculum: &Curriculum,
) -> Option<Vec<String>> {
    let specialization = &context.status.specialization_status;
    let group = specialization.selected_group.clone().or_else(|| {
        specialization
            .progress_by_group
            .iter()
            .max_by_key(|(_, progress)| progress.credits_completed)
            .map(|(name, _)| name.clone())
    })?;
    let track = curriculum
        .specialization_tracks
        .iter()
        .find(|track| track.track_name == group)?;
    Some(
        track
            .courses
            .iter()
            .filter(|code| !context.status.has_completed(code))
            .cloned()
            .collect(),
    )
}

/// Merge policy: model courses lead at descending priority 90, 89, …,
/// enriched from the catalog where possible; rule-based courses the model
/// missed follow at their score minus 20 (floor 0). Sorted and capped.
pub fn combine_recommendations(
    rule_based: &[CourseRecommendation],
    llm_based: Option<&LlmRecommendation>,
    context: &RecommendationContext,
    curriculum: &Curriculum,
    max_recommendations: usize,
) -> Vec<CourseRecommendation> {
    let Some(llm) = llm_based.filter(|llm| !llm.parsed.is_empty()) else {
        info!("LLM recommendations not available, using rule-based only");
        return rule_based.to_vec();
    };

    let mut combined: Vec<CourseRecommendation> = Vec::new();
    for (index, course) in llm.parsed.courses.iter().take(max_recommendations).enumerate() {
        let priority_score = 90 - index as i32;
        let reason = format!("پیشنهاد LLM - اولویت {}", index + 1);
        match context.find_available(&course.course_code) {
            Some(available) => {
                let mut recommendation =
                    make_recommendation(available, curriculum, priority_score, reason);
                if let Some(model_reason) = &course.reason {
                    recommendation.reason = model_reason.clone();
                }
                combined.push(recommendation);
            }
            None => combined.push(CourseRecommendation {
                course_code: course.course_code.clone(),
                course_name: course.course_name.clone(),
                credits: course.credits.unwrap_or(3),
                priority_score,
                reason,
                time_slots: course.time_slots.clone(),
                instructor: course.instructor.clone(),
                // Not in the catalog, so prerequisites cannot be verified.
                prerequisites_met: false,
                difficulty: Difficulty::Medium,
                course_type: CourseType::Core,
            }),
        }
    }

    let llm_codes: HashSet<&str> = llm
        .parsed
        .courses
        .iter()
        .map(|course| course.course_code.as_str())
        .collect();
    for recommendation in rule_based {
        if !llm_codes.contains(recommendation.course_code.as_str()) {
            let mut demoted = recommendation.clone();
            demoted.priority_score = (demoted.priority_score - 20).max(0);
            combined.push(demoted);
        }
    }

    combined.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    combined.truncate(max_recommendations);
    combined
}

/// Deterministic re-check of the merged set against the credit band and
/// prerequisite coverage. The model never overrides these.
pub fn validate_final(
    recommendations: &[CourseRecommendation],
    context: &RecommendationContext,
) -> FinalValidation {
    let band = context.constraints.credit_band;
    let total_credits: u32 = recommendations.iter().map(|r| r.credits).sum();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    if total_credits > band.max_credits {
        errors.push(format!(
            "تعداد واحدها ({total_credits}) از حد مجاز ({}) بیشتر است",
            band.max_credits
        ));
    } else if total_credits < band.min_credits {
        warnings.push(format!(
            "تعداد واحدها ({total_credits}) کمتر از حداقل ({}) است",
            band.min_credits
        ));
    }

    for recommendation in recommendations {
        if !recommendation.prerequisites_met {
            warnings.push(format!(
                "پیش‌نیازهای {} برآورده نشده",
                recommendation.course_name
            ));
        }
    }

    let mut difficulty_distribution = BTreeMap::new();
    let mut type_distribution = BTreeMap::new();
    for recommendation in recommendations {
        *difficulty_distribution
            .entry(recommendation.difficulty)
            .or_insert(0) += 1;
        *type_distribution
            .entry(recommendation.course_type)
            .or_insert(0) += 1;
    }

    if !recommendations.is_empty() {
        let hard = *difficulty_distribution.get(&Difficulty::Hard).unwrap_or(&0);
        if f64::from(hard) / recommendations.len() as f64 > 0.6 {
            warnings.push("نسبت دروس سخت بالا است".to_string());
        }
    }

    let recommended_codes: HashSet<&str> = recommendations
        .iter()
        .map(|r| r.course_code.as_str())
        .collect();
    let failed_courses_covered = context
        .history
        .failed
        .iter()
        .filter(|course| recommended_codes.contains(course.course_code.as_str()))
        .count();
    let prerequisites_covered = context
        .history
        .unmet_prerequisites
        .iter()
        .filter(|code| recommended_codes.contains(code.as_str()))
        .count();

    FinalValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        summary: ValidationSummary {
            total_credits,
            total_courses: recommendations.len(),
            difficulty_distribution,
            type_distribution,
            failed_courses_covered,
            prerequisites_covered,
        },
    }
}

fn priority_label(score: i32) -> &'static str {
    if score >= 80 {
        "اولویت بالا"
    } else if score >= 60 {
        "اولویت متوسط"
    } else {
        "اولویت پایین"
    }
}

fn build_explanation(
    context: &RecommendationContext,
    recommendations: &[CourseRecommendation],
    weekly: &WeeklySchedule,
) -> Explanation {
    let failed_count = context.history.failed.len();
    let strategy_rationale = match context.constraints.strategy {
        RecommendationStrategy::RecoveryFocused => format!(
            "با توجه به {failed_count} درس مردودی، تمرکز بر جبران دروس است"
        ),
        RecommendationStrategy::GpaImprovement => format!(
            "با توجه به معدل {}، تمرکز بر بهبود عملکرد است",
            context.status.gpa
        ),
        RecommendationStrategy::GraduationFocused => {
            "با توجه به ترم پایانی، تمرکز بر فارغ‌التحصیلی است".to_string()
        }
        RecommendationStrategy::SpecializationFocused => {
            "با توجه به ترم پیشرفته، تمرکز بر تقویت گرایش تخصصی است".to_string()
        }
        RecommendationStrategy::FoundationBuilding => {
            "استراتژی متعادل برای پیشرفت تحصیلی".to_string()
        }
    };

    let mut priority_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for recommendation in recommendations {
        priority_groups
            .entry(priority_label(recommendation.priority_score).to_string())
            .or_default()
            .push(recommendation.course_name.clone());
    }

    Explanation {
        strategy_rationale,
        priority_groups,
        total_credits: weekly.total_credits,
        balance_score: weekly.balance_score,
        conflicts_count: weekly.conflicts.len(),
        distribution_quality: if weekly.balance_score >= 70 {
            "خوب".to_string()
        } else {
            "قابل بهبود".to_string()
        },
        next_steps: vec![
            "بررسی جدول زمانی و تأیید عدم تداخل".to_string(),
            "مطالعه سرفصل دروس پیشنهادی".to_string(),
            "مشورت با استاد راهنما در صورت نیاز".to_string(),
            "ثبت‌نام در زمان تعیین شده".to_string(),
        ],
    }
}
