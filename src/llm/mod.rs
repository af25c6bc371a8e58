//! Language-model seam and prompt construction.
//!
//! The transport (HTTP client, retries, the 30-second user-facing timeout)
//! belongs to the embedding bot process; the core sees the model as a pure
//! text-in/text-out function behind [`CompletionClient`]. Nothing returned
//! by the model is trusted for hard constraints: every credit, prerequisite
//! and scheduling decision is re-verified deterministically afterwards.

pub mod grades;
pub mod parser;

pub use grades::{
    fallback_grade_parsing, format_grades_for_confirmation, parse_grades_text, GradeParseResult,
    ParsedGrade, ParsedGradeStatus,
};
pub use parser::{
    parse_recommendation_response, ParseTier, ParsedCourse, ParsedRecommendation, ParsedSummary,
};

use crate::config::LlmSettings;
use crate::context::RecommendationContext;
use crate::curriculum::SemesterOfferings;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;
use tracing::{debug, info};

/// Text-completion interface owned by the excluded transport layer.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, system_instruction: &str, prompt: &str) -> Result<String>;
}

/// System instruction for the advisory pass.
pub const ADVISOR_SYSTEM_PROMPT: &str = "شما یک مشاور تحصیلی خبره برای دانشجویان مهندسی کامپیوتر ایرانی هستید.\nوظیفه شما ارائه پیشنهادات هوشمندانه و دقیق برای انتخاب واحد است.\n\nدر پاسخ خود:\n1. قوانین تحصیلی را دقیقاً رعایت کنید\n2. اولویت را به دروس مردودی و پیش‌نیازها دهید\n3. برنامه زمانی متعادل و بدون تداخل ارائه دهید\n4. توضیح روشن و کاربردی برای هر پیشنهاد بدهید\n5. پاسخ را به فارسی و در فرمت خواسته شده ارائه دهید";

/// How well the model's proposal holds up against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecommendationAnalysis {
    /// Share (0–100) of recommended codes that exist in the catalog.
    pub validity_score: f64,
    pub coverage_score: i32,
    pub balance_score: i32,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

/// Outcome of one best-effort model pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRecommendation {
    pub raw_response: String,
    pub parsed: ParsedRecommendation,
    pub analysis: RecommendationAnalysis,
}

/// Builds the full advisory prompt: rendered context, the student's own
/// preferences, and per-course detail for the strongest candidates.
pub fn build_recommendation_prompt(
    context: &RecommendationContext,
    settings: &LlmSettings,
) -> String {
    let mut prompt = crate::context::format_for_llm(context);

    let preferences = &context.preferences;
    if preferences.desired_credits.is_some()
        || preferences.interests.is_some()
        || preferences.preferred_schedule.is_some()
        || preferences.additional_notes.is_some()
    {
        writeln!(prompt).ok();
        writeln!(prompt, "# ترجیحات دانشجو").ok();
        writeln!(prompt).ok();
        writeln!(
            prompt,
            "**تعداد واحد مطلوب:** {}",
            preferences
                .desired_credits
                .map(|c| c.to_string())
                .unwrap_or_else(|| "نامشخص".to_string())
        )
        .ok();
        writeln!(
            prompt,
            "**علاقه‌مندی‌ها:** {}",
            preferences.interests.as_deref().unwrap_or("نامشخص")
        )
        .ok();
        writeln!(
            prompt,
            "**زمان‌بندی ترجیحی:** {}",
            preferences.preferred_schedule.as_deref().unwrap_or("نامشخص")
        )
        .ok();
        writeln!(
            prompt,
            "**سایر درخواست‌ها:** {}",
            preferences.additional_notes.as_deref().unwrap_or("ندارد")
        )
        .ok();
    }

    let strongest: Vec<_> = context
        .valid_courses()
        .take(settings.prompt_course_limit)
        .collect();
    if !strongest.is_empty() {
        writeln!(prompt).ok();
        writeln!(
            prompt,
            "# جزئیات دروس موجود ({} درس اول)",
            strongest.len()
        )
        .ok();
        writeln!(prompt).ok();
        for course in strongest {
            writeln!(
                prompt,
                "- **{}** ({}): {} واحد، اولویت: {}، زمان: {}",
                course.course.course_name,
                course.code(),
                course.credits(),
                course.validation.priority_score,
                if course.course.time_slots.is_empty() {
                    "نامشخص".to_string()
                } else {
                    course.course.time_slots.join("، ")
                }
            )
            .ok();
        }
    }

    prompt
}

/// Runs the best-effort model pass: prompt, completion, parse, quality
/// analysis. Errors propagate to the caller, which degrades to the
/// rule-based result.
pub fn generate_llm_recommendations(
    client: &dyn CompletionClient,
    context: &RecommendationContext,
    offerings: &SemesterOfferings,
    settings: &LlmSettings,
) -> Result<LlmRecommendation> {
    let prompt = build_recommendation_prompt(context, settings);
    debug!(prompt_chars = prompt.len(), "sending advisory prompt");

    let raw_response = client.complete(ADVISOR_SYSTEM_PROMPT, &prompt)?;
    debug!(response_chars = raw_response.len(), "received advisory response");

    let parsed = parse_recommendation_response(&raw_response, Some(offerings));
    info!(
        courses = parsed.courses.len(),
        tier = ?parsed.tier,
        "parsed model recommendation"
    );
    let catalog_codes: HashSet<&str> = offerings
        .all_courses()
        .map(|(course, _)| course.course_code.as_str())
        .collect();
    let analysis = analyze_recommendations(&parsed, &catalog_codes);

    Ok(LlmRecommendation {
        raw_response,
        parsed,
        analysis,
    })
}

/// Scores the parsed proposal: are the codes real, are the credits sane,
/// is the weekly spread reasonable.
pub fn analyze_recommendations(
    parsed: &ParsedRecommendation,
    catalog_codes: &HashSet<&str>,
) -> RecommendationAnalysis {
    let mut analysis = RecommendationAnalysis::default();

    if parsed.courses.is_empty() {
        analysis.issues.push("No courses recommended".to_string());
        return analysis;
    }

    let recommended: HashSet<&str> = parsed
        .courses
        .iter()
        .map(|course| course.course_code.as_str())
        .collect();
    let valid: Vec<&&str> = recommended.intersection(catalog_codes).collect();
    let invalid: Vec<String> = recommended
        .difference(catalog_codes)
        .map(|code| code.to_string())
        .collect();

    analysis.validity_score = valid.len() as f64 / recommended.len() as f64 * 100.0;
    if invalid.is_empty() {
        analysis
            .strengths
            .push("All recommended courses are available".to_string());
    } else {
        analysis
            .issues
            .push(format!("Invalid course codes: {}", invalid.join(", ")));
    }

    match parsed.summary.total_credits {
        Some(credits) if (12..=24).contains(&credits) => {
            analysis
                .strengths
                .push(format!("Appropriate credit count: {credits}"));
        }
        Some(credits) => {
            analysis
                .issues
                .push(format!("Credit count may be inappropriate: {credits}"));
        }
        None => {
            analysis
                .issues
                .push("Could not determine credit count".to_string());
        }
    }

    let max_per_day = parsed
        .weekly_schedule
        .values()
        .map(|courses| courses.len())
        .max()
        .unwrap_or(0);
    if max_per_day > 0 && max_per_day <= 3 {
        analysis.strengths.push("Good daily distribution".to_string());
        analysis.balance_score = 80;
    } else {
        analysis
            .issues
            .push("Some days may be overloaded".to_string());
        analysis.balance_score = 50;
    }

    if valid.len() >= 3 {
        analysis.coverage_score = 80;
        analysis.strengths.push("Good course coverage".to_string());
    } else {
        analysis.coverage_score = 40;
        analysis.issues.push("Limited course coverage".to_string());
    }

    analysis
}
