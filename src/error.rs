use thiserror::Error;

/// Conditions that make the requested operation meaningless and must stay
/// distinguishable for the presentation layer. Everything recoverable is
/// absorbed locally with a warning instead of surfacing here.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("student {0} is not registered")]
    StudentNotFound(String),

    #[error("course {0} is unknown to the curriculum")]
    CourseNotFound(String),

    #[error("no curriculum chart available for version {0}")]
    CurriculumMissing(String),

    #[error("no offerings catalog available for semester {0}")]
    OfferingsMissing(String),

    #[error("reference data is unreadable: {0}")]
    DataIntegrity(String),
}
