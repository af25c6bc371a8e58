//! Grade-text intake parsing.
//!
//! Students paste their transcript in whatever shape their portal produced.
//! The primary path asks the model for structured JSON with a few-shot
//! prompt; when that fails, a regex fallback extracts `code: grade` pairs
//! at a fixed 0.7 confidence. Both paths are total: malformed input
//! produces an empty low-confidence result, never an error.

use super::{parser::extract_json_block, CompletionClient};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::OnceLock;
use tracing::warn;

/// Status the parser inferred for one grade entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParsedGradeStatus {
    Passed,
    Failed,
    Withdrawn,
    #[default]
    Unknown,
}

/// One grade extracted from user text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedGrade {
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub status: ParsedGradeStatus,
    #[serde(default)]
    pub semester_taken: Option<u32>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Result of one grade-text parsing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeParseResult {
    pub success: bool,
    pub parsed_grades: Vec<ParsedGrade>,
    pub warnings: Vec<String>,
    pub confidence: f64,
    pub raw_text: String,
}

const GRADE_SYSTEM_PROMPT: &str = "You are an expert at parsing Iranian university grade information. Parse the user's grade text into structured JSON format.";

fn build_grade_prompt(text: &str, known_courses: &[(String, String)], course_limit: usize) -> String {
    let mut prompt = String::new();
    writeln!(
        prompt,
        "Parse the following grade text from an Iranian university student. Extract course codes, names, grades, and status."
    )
    .ok();
    writeln!(prompt).ok();
    writeln!(prompt, "**Input Text:** \"{text}\"").ok();
    writeln!(prompt).ok();
    writeln!(prompt, "**Valid Courses (Code → Name):**").ok();
    if known_courses.is_empty() {
        writeln!(prompt, "No course list provided - infer from text").ok();
    } else {
        for (code, name) in known_courses.iter().take(course_limit) {
            writeln!(prompt, "- {code}: {name}").ok();
        }
    }
    writeln!(prompt).ok();
    writeln!(prompt, "**Instructions:**").ok();
    writeln!(prompt, "1. Extract each course mentioned in the text").ok();
    writeln!(
        prompt,
        "2. Match Persian course names to course codes using the Valid Courses list above"
    )
    .ok();
    writeln!(
        prompt,
        "3. Extract numerical grades (0-20 scale) or status (passed/failed/withdrawn)"
    )
    .ok();
    writeln!(
        prompt,
        "4. Determine status: \"passed\" (grade >= 10), \"failed\" (grade < 10 or explicitly failed), \"withdrawn\""
    )
    .ok();
    writeln!(prompt, "5. Provide confidence score (0-1) for each parsing").ok();
    writeln!(prompt).ok();
    writeln!(prompt, "**Output Format (JSON):**").ok();
    writeln!(prompt, "```json").ok();
    writeln!(
        prompt,
        r#"{{
    "success": true,
    "parsed_grades": [
        {{"course_code": "CS101", "course_name": "Programming Fundamentals", "grade": 18.5, "status": "passed", "semester_taken": 1, "confidence": 0.95}},
        {{"course_code": "MATH201", "course_name": "Calculus", "grade": null, "status": "failed", "semester_taken": 2, "confidence": 0.9}}
    ],
    "warnings": ["Unknown course code: PHYS101"],
    "confidence": 0.92
}}"#
    )
    .ok();
    writeln!(prompt, "```").ok();
    writeln!(prompt).ok();
    writeln!(
        prompt,
        "Common formats: \"Math1: 17\", \"CS101: 18\", \"Physics: failed\", \"Data Structure = 19.5\". Handle Persian course names and semester markers like \"ترم 1\". Flag unknown course codes as warnings."
    )
    .ok();
    prompt
}

#[derive(Debug, Deserialize)]
struct JsonGradeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    parsed_grades: Vec<ParsedGrade>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

/// Parses a model grade response; JSON failure falls back to regex.
pub fn parse_grade_response(response: &str, original_text: &str) -> GradeParseResult {
    let block = extract_json_block(response).unwrap_or(response);
    match serde_json::from_str::<JsonGradeResponse>(block) {
        Ok(parsed) => GradeParseResult {
            success: parsed.success && !parsed.parsed_grades.is_empty(),
            parsed_grades: parsed.parsed_grades,
            warnings: parsed.warnings,
            confidence: parsed.confidence,
            raw_text: original_text.to_string(),
        },
        Err(error) => {
            warn!(%error, "model grade response was not valid JSON, using regex fallback");
            fallback_grade_parsing(original_text)
        }
    }
}

/// Regex fallback over the raw user text: `<code-or-name>[:=]<grade-or-word>`
/// pairs at a fixed 0.7 confidence.
pub fn fallback_grade_parsing(text: &str) -> GradeParseResult {
    static PAIRS: OnceLock<Regex> = OnceLock::new();
    let pairs = PAIRS.get_or_init(|| {
        Regex::new(r"(?i)(\w+)\s*[:=]\s*(\d+(?:\.\d+)?|failed|fail|passed|pass)")
            .expect("grade pair regex")
    });

    let mut parsed_grades: Vec<ParsedGrade> = Vec::new();
    for captures in pairs.captures_iter(text) {
        let course_code = captures[1].to_uppercase();
        if parsed_grades.iter().any(|g| g.course_code == course_code) {
            continue;
        }
        let token = captures[2].to_lowercase();
        let (grade, status) = match token.as_str() {
            "failed" | "fail" => (None, ParsedGradeStatus::Failed),
            "passed" | "pass" => (None, ParsedGradeStatus::Passed),
            number => match number.parse::<f64>() {
                Ok(value) if value >= 10.0 => (Some(value), ParsedGradeStatus::Passed),
                Ok(value) => (Some(value), ParsedGradeStatus::Failed),
                Err(_) => continue,
            },
        };
        parsed_grades.push(ParsedGrade {
            course_code,
            course_name: None,
            grade,
            status,
            semester_taken: None,
            confidence: 0.7,
        });
    }

    GradeParseResult {
        success: !parsed_grades.is_empty(),
        parsed_grades,
        warnings: vec!["Using basic parsing - LLM parsing failed".to_string()],
        confidence: 0.7,
        raw_text: text.to_string(),
    }
}

/// Full grade-intake flow: model pass first, regex fallback on any failure.
pub fn parse_grades_text(
    client: &dyn CompletionClient,
    text: &str,
    known_courses: &[(String, String)],
    course_limit: usize,
) -> GradeParseResult {
    let prompt = build_grade_prompt(text, known_courses, course_limit);
    match client.complete(GRADE_SYSTEM_PROMPT, &prompt) {
        Ok(response) => parse_grade_response(&response, text),
        Err(error) => {
            warn!(%error, "grade parsing completion failed, using regex fallback");
            fallback_grade_parsing(text)
        }
    }
}

/// Renders a parsed result for the confirmation step in the chat flow.
pub fn format_grades_for_confirmation(result: &GradeParseResult) -> String {
    if !result.success || result.parsed_grades.is_empty() {
        return "هیچ نمره‌ای از متن وارد شده استخراج نشد.".to_string();
    }

    let mut lines = vec!["📋 **نمرات شناسایی شده:**".to_string(), String::new()];
    for (index, grade) in result.parsed_grades.iter().enumerate() {
        let marker = match grade.status {
            ParsedGradeStatus::Passed => "✅",
            ParsedGradeStatus::Failed => "❌",
            _ => "⚠️",
        };
        let grade_text = grade
            .grade
            .map(|g| format!("{g:.1}"))
            .unwrap_or_else(|| status_word(grade.status).to_string());
        let mut line = format!("{}. {} **{}**", index + 1, marker, grade.course_code);
        if let Some(name) = &grade.course_name {
            line.push_str(&format!(" ({name})"));
        }
        line.push_str(&format!(": {grade_text}"));
        if let Some(semester) = grade.semester_taken {
            line.push_str(&format!(" - ترم {semester}"));
        }
        lines.push(line);
    }

    if !result.warnings.is_empty() {
        lines.push(String::new());
        lines.push("⚠️ **هشدارها:**".to_string());
        for warning in &result.warnings {
            lines.push(format!("- {warning}"));
        }
    }

    lines.push(String::new());
    lines.push(format!("📊 **اطمینان:** {:.0}%", result.confidence * 100.0));
    lines.join("\n")
}

fn status_word(status: ParsedGradeStatus) -> &'static str {
    match status {
        ParsedGradeStatus::Passed => "قبول",
        ParsedGradeStatus::Failed => "مردود",
        ParsedGradeStatus::Withdrawn => "حذف",
        ParsedGradeStatus::Unknown => "نامشخص",
    }
}
