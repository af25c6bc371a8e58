use crate::support::fixture::AdvisoryFixture;
use coursebase::curriculum::CurriculumVersion;
use coursebase::AdvisorError;

#[test]
fn latest_attempt_drives_gpa_and_credit_totals() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let status = advisor.analyze_status("40110015").unwrap();
    // Six authoritative 3-credit courses: 15, 12, 17, 13, 9, 16.
    assert!((status.gpa - 13.67).abs() < 1e-9);
    assert_eq!(status.total_credits_passed, 15);
    assert_eq!(status.completed_courses.len(), 5);
    assert_eq!(status.failed_courses.len(), 1);
    assert_eq!(status.failed_courses[0].course_code, "DISC201");
    assert_eq!(status.failed_courses[0].attempt_number, 1);
}

#[test]
fn specialization_track_selected_from_completed_credits() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let status = advisor.analyze_status("40110015").unwrap();
    assert_eq!(
        status.specialization_status.selected_group.as_deref(),
        Some("هوش مصنوعی")
    );
    assert_eq!(status.specialization_status.completed_specialized_credits, 3);
    assert!(status.specialization_status.selection_allowed);
}

#[test]
fn entry_year_selects_curriculum_version_and_group() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let freshman = advisor.analyze_status("40310024").unwrap();
    assert_eq!(freshman.curriculum_version, CurriculumVersion::Post1403);
    assert_eq!(freshman.group_assignment.as_deref(), Some("A"));
    assert!(freshman.group_restrictions_active());

    let senior = advisor.analyze_status("40110015").unwrap();
    assert_eq!(senior.curriculum_version, CurriculumVersion::Pre1403);
    assert_eq!(senior.group_assignment, None);
}

#[test]
fn unknown_student_surfaces_not_found() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let error = advisor.analyze_status("99999999").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AdvisorError>(),
        Some(AdvisorError::StudentNotFound(_))
    ));
}

#[test]
fn empty_history_degrades_instead_of_failing() {
    let fixture = AdvisoryFixture::new();
    let advisor = fixture.advisor(None);

    let status = advisor.analyze_status("40310024").unwrap();
    assert_eq!(status.gpa, 0.0);
    assert_eq!(status.total_credits_passed, 0);
    assert!(status.completed_courses.is_empty());
    // Every chart course with prerequisites is unmet for a blank history.
    assert_eq!(status.prerequisite_status.get("MATH201"), Some(&false));
    assert_eq!(status.prerequisite_status.get("MATH101"), Some(&true));
}
