//! Weekly calendar construction for a recommendation set.

use super::CourseRecommendation;
use crate::context::WEEKDAYS;
use crate::curriculum::Difficulty;
use crate::rules::schedule::parse_time_slot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// The calendar view of a recommendation set. Courses dropped for a
/// conflict stay in the recommendation list but not on the calendar, and
/// `total_credits` counts every recommended course regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub total_credits: u32,
    pub courses_by_day: BTreeMap<String, Vec<CourseRecommendation>>,
    pub conflicts: Vec<String>,
    pub balance_score: i32,
    /// The full recommended set, including courses that lost their calendar
    /// slot to a conflict.
    pub recommendations: Vec<CourseRecommendation>,
}

fn day_has_conflict(
    placed: &[CourseRecommendation],
    day: &str,
    start_minutes: u32,
    end_minutes: u32,
) -> bool {
    placed.iter().any(|course| {
        course.time_slots.iter().any(|slot| match parse_time_slot(slot) {
            Some(existing) => {
                existing.weekday == day
                    && existing.start_minutes < end_minutes
                    && start_minutes < existing.end_minutes
            }
            None => false,
        })
    })
}

/// Places every slot of every recommendation on its weekday, recording a
/// conflict string (and skipping the placement) when it overlaps something
/// already scheduled that day.
pub fn build_weekly_schedule(recommendations: &[CourseRecommendation]) -> WeeklySchedule {
    let mut courses_by_day: BTreeMap<String, Vec<CourseRecommendation>> = WEEKDAYS
        .iter()
        .map(|day| ((*day).to_string(), Vec::new()))
        .collect();
    let mut conflicts = Vec::new();

    for recommendation in recommendations {
        for slot in &recommendation.time_slots {
            let Some(parsed) = parse_time_slot(slot) else {
                warn!(slot = %slot, course = %recommendation.course_code, "invalid time slot format");
                continue;
            };
            let Some(day_courses) = courses_by_day.get_mut(&parsed.weekday) else {
                warn!(slot = %slot, "time slot names an unknown weekday");
                continue;
            };
            if day_has_conflict(
                day_courses,
                &parsed.weekday,
                parsed.start_minutes,
                parsed.end_minutes,
            ) {
                conflicts.push(format!(
                    "تداخل زمانی: {} در {}",
                    recommendation.course_name, slot
                ));
            } else {
                day_courses.push(recommendation.clone());
            }
        }
    }

    let total_credits = recommendations.iter().map(|r| r.credits).sum();
    let balance_score = schedule_balance(&courses_by_day, recommendations);

    WeeklySchedule {
        total_credits,
        courses_by_day,
        conflicts,
        balance_score,
        recommendations: recommendations.to_vec(),
    }
}

/// Starts at 100; loses 20 when any day carries more than three courses and
/// 30 when over 60 % of the set is hard.
fn schedule_balance(
    courses_by_day: &BTreeMap<String, Vec<CourseRecommendation>>,
    recommendations: &[CourseRecommendation],
) -> i32 {
    let mut score = 100;

    let max_per_day = courses_by_day
        .values()
        .map(|courses| courses.len())
        .max()
        .unwrap_or(0);
    if max_per_day > 3 {
        score -= 20;
    }

    if !recommendations.is_empty() {
        let hard = recommendations
            .iter()
            .filter(|r| r.difficulty == Difficulty::Hard)
            .count();
        if hard as f64 / recommendations.len() as f64 > 0.6 {
            score -= 30;
        }
    }

    score.max(0)
}
