//! Tiered parsing of language-model recommendation responses.
//!
//! Model output drifts between a fenced JSON block, the requested Persian
//! weekly-schedule text, and free prose. Each tier is an independent
//! function returning `Option<ParsedRecommendation>`; the public entry
//! point tries them in order and always returns a result object. Malformed
//! input is a normal operating condition here, never an error.

use crate::context::WEEKDAYS;
use crate::curriculum::SemesterOfferings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// One course extracted from model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCourse {
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Numbers the model reported about its own proposal.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParsedSummary {
    pub total_credits: Option<u32>,
    pub failed_courses_covered: Option<u32>,
    pub prerequisite_courses: Option<u32>,
    pub new_courses: Option<u32>,
    pub mapped_grade_count: usize,
}

/// Which tier produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    JsonBlock,
    LabeledText,
    BareTokens,
    Empty,
}

/// Structured view of whatever the model returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRecommendation {
    pub courses: Vec<ParsedCourse>,
    pub weekly_schedule: BTreeMap<String, Vec<ParsedCourse>>,
    pub summary: ParsedSummary,
    pub explanation: Option<String>,
    pub warnings: Vec<String>,
    pub tier: ParseTier,
}

impl ParsedRecommendation {
    fn empty() -> Self {
        Self {
            courses: Vec::new(),
            weekly_schedule: BTreeMap::new(),
            summary: ParsedSummary::default(),
            explanation: None,
            warnings: Vec::new(),
            tier: ParseTier::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Parses a model response, trying fenced JSON, then the labeled weekly
/// text, then bare course-code extraction. Always returns a result object.
pub fn parse_recommendation_response(
    response: &str,
    catalog: Option<&SemesterOfferings>,
) -> ParsedRecommendation {
    parse_json_block(response)
        .or_else(|| parse_weekly_text(response))
        .or_else(|| parse_bare_tokens(response, catalog))
        .unwrap_or_else(|| {
            debug!("model response yielded no recognizable courses");
            ParsedRecommendation::empty()
        })
}

/// Extracts the contents of the first fenced ```json block, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("fence regex"));
    fence
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct JsonCourse {
    #[serde(default)]
    course_code: String,
    #[serde(default)]
    course_name: String,
    #[serde(default)]
    credits: Option<serde_json::Value>,
    #[serde(default)]
    time_slots: Vec<String>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonResponse {
    #[serde(default)]
    recommended_courses: Vec<JsonCourse>,
    #[serde(default)]
    mapped_grades: Vec<serde_json::Value>,
    #[serde(default)]
    total_credits: Option<u32>,
    #[serde(default)]
    analysis: Option<String>,
}

fn credits_value(raw: &serde_json::Value) -> Option<u32> {
    match raw {
        serde_json::Value::Number(n) => n.as_u64().map(|v| v as u32),
        serde_json::Value::Object(map) => {
            let theoretical = map.get("theoretical").and_then(|v| v.as_u64()).unwrap_or(0);
            let practical = map.get("practical").and_then(|v| v.as_u64()).unwrap_or(0);
            Some((theoretical + practical) as u32)
        }
        _ => None,
    }
}

/// Tier 1: a fenced JSON block with the documented field names.
pub fn parse_json_block(response: &str) -> Option<ParsedRecommendation> {
    let block = extract_json_block(response)?;
    let parsed: JsonResponse = match serde_json::from_str(block) {
        Ok(parsed) => parsed,
        Err(error) => {
            debug!(%error, "fenced block is not valid JSON, falling through");
            return None;
        }
    };
    if parsed.recommended_courses.is_empty() {
        return None;
    }

    let courses: Vec<ParsedCourse> = parsed
        .recommended_courses
        .into_iter()
        .filter(|course| !course.course_code.trim().is_empty())
        .map(|course| ParsedCourse {
            course_name: if course.course_name.is_empty() {
                course.course_code.clone()
            } else {
                course.course_name
            },
            course_code: course.course_code,
            credits: course.credits.as_ref().and_then(credits_value),
            time_slots: course.time_slots,
            instructor: course.instructor,
            reason: course.reason,
        })
        .collect();
    if courses.is_empty() {
        return None;
    }

    // JSON responses carry no weekday layout; spread courses over the week
    // so the calendar view still has something to show.
    let mut weekly_schedule = BTreeMap::new();
    for (course, day) in courses.iter().zip(WEEKDAYS.iter()) {
        weekly_schedule.insert((*day).to_string(), vec![course.clone()]);
    }

    Some(ParsedRecommendation {
        summary: ParsedSummary {
            total_credits: parsed.total_credits,
            mapped_grade_count: parsed.mapped_grades.len(),
            ..ParsedSummary::default()
        },
        explanation: parsed.analysis,
        warnings: Vec::new(),
        courses,
        weekly_schedule,
        tier: ParseTier::JsonBlock,
    })
}

fn course_line_regexes() -> (&'static Regex, &'static Regex) {
    static FULL: OnceLock<Regex> = OnceLock::new();
    static SIMPLE: OnceLock<Regex> = OnceLock::new();
    let full = FULL.get_or_init(|| {
        Regex::new(r"-\s*(.+?)\s*\(([A-Z0-9]+)\)\s*-\s*(.+?)\s*-\s*(\d+)\s*واحد(?:\s*-\s*استاد:\s*(.+))?")
            .expect("course line regex")
    });
    let simple = SIMPLE
        .get_or_init(|| Regex::new(r"-\s*(.+?)\s*\(([A-Z0-9]+)\)").expect("simple line regex"));
    (full, simple)
}

/// Extracts one course from a schedule bullet line.
fn parse_course_line(line: &str) -> Option<ParsedCourse> {
    let (full, simple) = course_line_regexes();
    if let Some(captures) = full.captures(line) {
        return Some(ParsedCourse {
            course_name: captures[1].trim().to_string(),
            course_code: captures[2].to_string(),
            time_slots: vec![captures[3].trim().to_string()],
            credits: captures[4].parse().ok(),
            instructor: captures.get(5).map(|m| m.as_str().trim().to_string()),
            reason: None,
        });
    }
    simple.captures(line).map(|captures| ParsedCourse {
        course_name: captures[1].trim().to_string(),
        course_code: captures[2].to_string(),
        time_slots: Vec::new(),
        credits: None,
        instructor: None,
        reason: None,
    })
}

/// The body of one `**header:**` section: everything until the next bold
/// header line or the end of the text.
fn section_body<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let marker = format!("**{header}:**");
    let start = text.find(&marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find("\n**").unwrap_or(rest.len());
    Some(&rest[..end])
}

fn extract_number_after(text: &str, label: &str) -> Option<u32> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d+").expect("number regex"));
    let found = number.find(rest)?;
    // Only accept a number on the same logical line as the label.
    if rest[..found.start()].contains('\n') {
        return None;
    }
    found.as_str().parse().ok()
}

/// Tier 2: the Persian weekly-schedule text format the prompt asks for.
pub fn parse_weekly_text(response: &str) -> Option<ParsedRecommendation> {
    let mut weekly_schedule = BTreeMap::new();
    let mut courses: Vec<ParsedCourse> = Vec::new();

    for day in WEEKDAYS {
        let Some(body) = section_body(response, day) else { continue };
        let mut day_courses = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if !line.starts_with('-') {
                continue;
            }
            if let Some(course) = parse_course_line(line) {
                if !courses
                    .iter()
                    .any(|c: &ParsedCourse| c.course_code == course.course_code)
                {
                    courses.push(course.clone());
                }
                day_courses.push(course);
            }
        }
        if !day_courses.is_empty() {
            weekly_schedule.insert(day.to_string(), day_courses);
        }
    }

    if courses.is_empty() {
        return None;
    }

    let summary_body = section_body(response, "خلاصه پیشنهاد").unwrap_or("");
    let summary = ParsedSummary {
        total_credits: extract_number_after(summary_body, "مجموع واحدها"),
        failed_courses_covered: extract_number_after(summary_body, "دروس مردودی"),
        prerequisite_courses: extract_number_after(summary_body, "دروس پیش‌نیاز"),
        new_courses: extract_number_after(summary_body, "دروس جدید"),
        mapped_grade_count: 0,
    };

    let explanation = section_body(response, "توجیه انتخاب")
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .map(|body| body.to_string());
    let warnings = section_body(response, "نکات مهم")
        .map(|body| {
            body.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| line.trim_start_matches('-').trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(ParsedRecommendation {
        courses,
        weekly_schedule,
        summary,
        explanation,
        warnings,
        tier: ParseTier::LabeledText,
    })
}

/// Tier 3: scrape anything that looks like a course code and enrich it from
/// the offerings catalog when possible.
pub fn parse_bare_tokens(
    response: &str,
    catalog: Option<&SemesterOfferings>,
) -> Option<ParsedRecommendation> {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    let tokens =
        TOKENS.get_or_init(|| Regex::new(r"\b[0-9]{7,12}\b|[A-Z]+[0-9]+").expect("token regex"));

    let mut courses: Vec<ParsedCourse> = Vec::new();
    for token in tokens.find_iter(response) {
        let code = token.as_str();
        if courses.iter().any(|c| c.course_code == code) {
            continue;
        }
        let offered = catalog.and_then(|offerings| offerings.find(code));
        courses.push(match offered {
            Some(course) => ParsedCourse {
                course_code: course.course_code.clone(),
                course_name: course.course_name.clone(),
                credits: Some(course.credits.total()),
                time_slots: course.time_slots.clone(),
                instructor: course.instructor.clone(),
                reason: None,
            },
            None => ParsedCourse {
                course_code: code.to_string(),
                course_name: format!("درس {code}"),
                credits: None,
                time_slots: Vec::new(),
                instructor: None,
                reason: None,
            },
        });
        if courses.len() == 10 {
            break;
        }
    }

    if courses.is_empty() {
        return None;
    }
    Some(ParsedRecommendation {
        courses,
        weekly_schedule: BTreeMap::new(),
        summary: ParsedSummary::default(),
        explanation: None,
        warnings: Vec::new(),
        tier: ParseTier::BareTokens,
    })
}
