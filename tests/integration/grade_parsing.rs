use crate::support::fixture::{AdvisoryFixture, FailingClient, ScriptedClient};
use coursebase::llm::{format_grades_for_confirmation, ParsedGradeStatus};

#[test]
fn structured_model_response_wins() {
    let fixture = AdvisoryFixture::new();
    let response = r#"```json
{
  "success": true,
  "parsed_grades": [
    {"course_code": "MATH101", "course_name": "ریاضی عمومی 1", "grade": 15.0,
     "status": "passed", "semester_taken": 1, "confidence": 0.95},
    {"course_code": "DISC201", "grade": 9.0, "status": "failed", "confidence": 0.9}
  ],
  "warnings": [],
  "confidence": 0.93
}
```"#;
    let advisor = fixture.advisor(Some(Box::new(ScriptedClient {
        response: response.to_string(),
    })));

    let result = advisor.parse_grade_text(
        "ریاضی 15، گسسته 9",
        &[("MATH101".to_string(), "ریاضی عمومی 1".to_string())],
    );
    assert!(result.success);
    assert_eq!(result.parsed_grades.len(), 2);
    assert_eq!(result.parsed_grades[0].status, ParsedGradeStatus::Passed);
    assert_eq!(result.parsed_grades[1].status, ParsedGradeStatus::Failed);
    assert!((result.confidence - 0.93).abs() < 1e-9);
}

#[test]
fn transport_failure_falls_back_to_regex_at_fixed_confidence() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(Some(Box::new(FailingClient)));

    let result = advisor.parse_grade_text("CS101: 18, MATH201 = failed", &[]);
    assert!(result.success);
    assert!((result.confidence - 0.7).abs() < 1e-9);
    assert_eq!(result.parsed_grades.len(), 2);
    assert!(result.parsed_grades.iter().all(|g| (g.confidence - 0.7).abs() < 1e-9));
}

#[test]
fn garbage_model_output_degrades_to_fallback_not_error() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(Some(Box::new(ScriptedClient {
        response: "این یک پاسخ بدون ساختار است".to_string(),
    })));

    let result = advisor.parse_grade_text("PHYS101: 8", &[]);
    assert!(result.success);
    assert_eq!(result.parsed_grades.len(), 1);
    assert_eq!(result.parsed_grades[0].status, ParsedGradeStatus::Failed);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("basic parsing")));
}

#[test]
fn confirmation_rendering_is_presentable() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(Some(Box::new(FailingClient)));

    let result = advisor.parse_grade_text("CS101: 18", &[]);
    let rendered = format_grades_for_confirmation(&result);
    assert!(rendered.contains("CS101"));
    assert!(rendered.contains("18.0"));
}

#[test]
fn standalone_response_parser_is_total() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let empty = advisor.parse_recommendation_response("هیچ پیشنهادی ندارم");
    assert!(empty.courses.is_empty());

    let parsed = advisor.parse_recommendation_response(
        "**شنبه:**\n- ریاضی عمومی 2 (MATH201) - 10:00-12:00 - 3 واحد\n",
    );
    assert_eq!(parsed.courses.len(), 1);
    assert_eq!(parsed.courses[0].course_code, "MATH201");
}
