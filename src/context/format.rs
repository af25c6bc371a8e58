//! Persian rendering of the assembled context for the language model.
//!
//! A pure function of the context object: same input, same text. The
//! rendered sections mirror what a human advisor would read (profile,
//! failed courses, applicable rules, eligible courses, strategy guidance),
//! ending with the exact response format the model is asked to follow.

use super::{RecommendationContext, RecommendationStrategy, WEEKDAYS};
use crate::analysis::AcademicStanding;
use std::fmt::Write;

fn standing_token(standing: AcademicStanding) -> &'static str {
    match standing {
        AcademicStanding::Normal => "normal",
        AcademicStanding::GoodStanding => "good_standing",
        AcademicStanding::Excellent => "excellent",
        AcademicStanding::Probation => "probation",
    }
}

pub(crate) fn strategy_token(strategy: RecommendationStrategy) -> &'static str {
    match strategy {
        RecommendationStrategy::RecoveryFocused => "recovery_focused",
        RecommendationStrategy::GpaImprovement => "gpa_improvement",
        RecommendationStrategy::GraduationFocused => "graduation_focused",
        RecommendationStrategy::SpecializationFocused => "specialization_focused",
        RecommendationStrategy::FoundationBuilding => "foundation_building",
    }
}

fn gpa_category(gpa: f64) -> &'static str {
    if gpa >= 17.0 {
        "عالی"
    } else if gpa >= 15.0 {
        "خوب"
    } else if gpa >= 12.0 {
        "قابل قبول"
    } else {
        "ضعیف"
    }
}

/// Renders the structured context into the single prompt payload.
pub fn format_for_llm(context: &RecommendationContext) -> String {
    let mut text = String::new();
    let status = &context.status;
    let constraints = &context.constraints;

    // Student profile.
    writeln!(text, "# اطلاعات دانشجو").ok();
    writeln!(text).ok();
    writeln!(text, "**معدل کل:** {} ({})", status.gpa, gpa_category(status.gpa)).ok();
    writeln!(text, "**واحدهای گذرانده:** {}", status.total_credits_passed).ok();
    writeln!(text, "**ترم فعلی:** {}", status.current_semester).ok();
    writeln!(text, "**سال ورود:** {}", status.entry_year).ok();
    writeln!(text, "**وضعیت تحصیلی:** {}", standing_token(status.standing)).ok();
    writeln!(text, "**نسخه چارت:** {}", status.curriculum_version).ok();
    writeln!(
        text,
        "**گروه:** {}",
        status.group_assignment.as_deref().unwrap_or("ندارد")
    )
    .ok();
    writeln!(text).ok();
    writeln!(
        text,
        "**حد مجاز واحد:** {}-{} واحد",
        constraints.credit_band.min_credits, constraints.credit_band.max_credits
    )
    .ok();
    writeln!(
        text,
        "**سطح تحصیلی:** {}",
        status.graduation_progress.level.persian_name()
    )
    .ok();
    writeln!(
        text,
        "**پیشرفت تحصیلی:** {}%",
        status.graduation_progress.progress_percentage
    )
    .ok();

    // Failed courses demand the model's attention first.
    if !context.history.failed.is_empty() {
        writeln!(text).ok();
        writeln!(text, "# دروس مردودی (اولویت بالا)").ok();
        writeln!(text).ok();
        for course in &context.history.failed {
            writeln!(
                text,
                "- {} ({}): نمره {}، تلاش {}",
                course.course_name, course.course_code, course.grade, course.attempt_number
            )
            .ok();
        }
    }

    // Applicable rules.
    writeln!(text).ok();
    writeln!(text, "# قوانین تحصیلی مربوطه").ok();
    writeln!(text).ok();
    writeln!(
        text,
        "- حداکثر واحد: {}",
        constraints.credit_band.max_credits
    )
    .ok();
    writeln!(
        text,
        "- حداقل واحد: {}",
        constraints.credit_band.min_credits
    )
    .ok();
    writeln!(
        text,
        "- وضعیت مشروطی: {}",
        if status.standing == AcademicStanding::Probation {
            "بله"
        } else {
            "خیر"
        }
    )
    .ok();
    writeln!(
        text,
        "- محدودیت گروه: {}",
        if constraints.group_restrictions_active {
            "فعال"
        } else {
            "غیرفعال"
        }
    )
    .ok();

    // Eligible courses with validity annotations.
    let valid_courses: Vec<_> = context.valid_courses().collect();
    if !valid_courses.is_empty() {
        writeln!(text).ok();
        writeln!(text, "# دروس قابل انتخاب").ok();
        writeln!(text).ok();
        for course in valid_courses {
            writeln!(
                text,
                "- **{}** ({}): {} واحد، اولویت: {}، زمان: {}",
                course.course.course_name,
                course.code(),
                course.credits(),
                course.validation.priority_score,
                course.course.time_slots.join("، ")
            )
            .ok();
        }
    }

    // Strategy guidance and the expected response shape.
    writeln!(text).ok();
    writeln!(text, "# راهنمای پیشنهاد").ok();
    writeln!(text).ok();
    writeln!(
        text,
        "**استراتژی توصیه شده:** {}",
        strategy_token(constraints.strategy)
    )
    .ok();
    writeln!(
        text,
        "**محدوده واحد پیشنهادی:** {}-{} واحد",
        constraints.recommended_range.0, constraints.recommended_range.1
    )
    .ok();
    writeln!(
        text,
        "**حداکثر دروس سخت:** {}",
        constraints.max_difficult_courses
    )
    .ok();
    writeln!(text, "**حداقل دروس آسان:** {}", constraints.min_easy_courses).ok();
    writeln!(text).ok();
    writeln!(text, "## اولویت‌های انتخاب:").ok();
    writeln!(text, "1. دروس مردودی (اولویت بالا)").ok();
    writeln!(text, "2. دروس پیش‌نیاز برای ترم‌های آینده").ok();
    writeln!(text, "3. دروس اجباری ترم جاری").ok();
    writeln!(text, "4. دروس گرایش (در صورت انتخاب گرایش)").ok();
    writeln!(text, "5. دروس اختیاری تکمیلی").ok();
    writeln!(text).ok();
    writeln!(text, "## خروجی مورد انتظار:").ok();
    writeln!(text, "لطفاً پیشنهاد دروس را در فرمت زیر ارائه دهید:").ok();
    writeln!(text).ok();
    writeln!(text, "🗓️ **برنامه هفتگی:**").ok();
    writeln!(text).ok();
    for day in WEEKDAYS {
        writeln!(text, "**{day}:**").ok();
        writeln!(
            text,
            "- [نام درس] ([کد درس]) - [ساعت] - [تعداد واحد] واحد - استاد: [نام استاد]"
        )
        .ok();
        writeln!(text).ok();
    }
    writeln!(text, "📊 **خلاصه پیشنهاد:**").ok();
    writeln!(text, "- مجموع واحدها: [تعداد] واحد").ok();
    writeln!(text, "- دروس مردودی پوشش داده شده: [تعداد]").ok();
    writeln!(text, "- دروس جدید: [تعداد]").ok();
    writeln!(text).ok();
    writeln!(text, "💡 **توجیه انتخاب:**").ok();
    writeln!(text, "[توضیح منطق انتخاب]").ok();
    writeln!(text).ok();
    writeln!(text, "⚠️ **نکات مهم:**").ok();
    writeln!(text, "[هشدارها]").ok();

    text
}
