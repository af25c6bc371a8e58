use crate::support::fixture::AdvisoryFixture;

#[test]
fn prerequisite_gate_blocks_and_releases() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    // CS101 never passed: CS201 stays locked.
    let probation = advisor.analyze_status("40210031").unwrap();
    let result = advisor
        .validate_course("CS201", &probation, &offerings, &[])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("CS101")));

    // CS101 passed with 17: CS201 opens up.
    let senior = advisor.analyze_status("40110015").unwrap();
    let result = advisor
        .validate_course("CS201", &senior, &offerings, &[])
        .unwrap();
    assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
}

#[test]
fn each_missing_prerequisite_is_reported_individually() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    // DS301 needs CS201 (passed) and DISC201 (failed).
    let senior = advisor.analyze_status("40110015").unwrap();
    let result = advisor
        .validate_course("DS301", &senior, &offerings, &[])
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("DISC201"));
}

#[test]
fn cohort_restriction_rejects_other_groups_courses() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();
    let freshman = advisor.analyze_status("40310024").unwrap();

    // CS102 is only taught to cohort B.
    let result = advisor
        .validate_course("CS102", &freshman, &offerings, &[])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("گروه A")));

    // The cohort's own section is fine.
    let result = advisor
        .validate_course("MATH101", &freshman, &offerings, &[])
        .unwrap();
    assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
}

#[test]
fn one_religious_course_per_term() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();
    let status = advisor.analyze_status("40210031").unwrap();

    let alone = advisor
        .validate_course("REL102", &status, &offerings, &[])
        .unwrap();
    assert!(alone.is_valid, "unexpected errors: {:?}", alone.errors);

    let with_other = advisor
        .validate_course("REL102", &status, &offerings, &["REL101".to_string()])
        .unwrap();
    assert!(!with_other.is_valid);
    assert!(with_other.errors.iter().any(|e| e.contains("معارف")));
}

#[test]
fn physical_education_capped_at_two_credits() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    let status = advisor.analyze_status("40130088").unwrap();
    let result = advisor
        .validate_course("PE103", &status, &offerings, &[])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("تربیت بدنی")));
}

#[test]
fn language_sequence_enforces_its_own_chain() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    let status = advisor.analyze_status("40210031").unwrap();
    let result = advisor
        .validate_course("ENG201", &status, &offerings, &[])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("ENG101")));
}

#[test]
fn lecture_overlap_with_selection_is_an_error() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    let status = advisor.analyze_status("40110015").unwrap();
    let result = advisor
        .validate_course("MATH201", &status, &offerings, &["CONF101".to_string()])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("تداخل")));
}

#[test]
fn shared_exam_date_is_an_error() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    let status = advisor.analyze_status("40110015").unwrap();
    let result = advisor
        .validate_course("EX401", &status, &offerings, &["EX402".to_string()])
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("امتحان")));
}

#[test]
fn failed_course_with_retries_outranks_missing_prerequisite() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);
    let offerings = advisor.offerings("mehr_1404").unwrap();

    let senior = advisor.analyze_status("40110015").unwrap();
    let failed = advisor
        .validate_course("DISC201", &senior, &offerings, &[])
        .unwrap();
    // 100 for the failed course, +10 per attempt, +50 prerequisite fan-out,
    // +30 overdue relative to its recommended semester.
    assert!(failed.priority_score >= 110);
    assert!(failed.is_valid);

    let ordinary = advisor
        .validate_course("SE501", &senior, &offerings, &[])
        .unwrap();
    assert!(failed.priority_score > ordinary.priority_score);
}
