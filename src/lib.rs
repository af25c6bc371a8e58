pub mod advisor;
pub mod analysis;
pub mod config;
pub mod context;
pub mod curriculum;
pub mod error;
pub mod llm;
pub mod recommend;
pub mod rules;
pub mod students;

// Re-export commonly used types for convenience.
pub use advisor::{Advisor, AdvisoryEvent, AdvisoryEventType, AdvisoryLog};
pub use analysis::{analyze_status, AcademicStanding, AcademicStatus};
pub use config::AppConfig;
pub use context::{
    assemble_context, choose_strategy, format_for_llm, RecommendationContext,
    RecommendationStrategy, UserPreferences,
};
pub use curriculum::{Curriculum, CurriculumVersion, ReferenceStore, SemesterOfferings};
pub use error::AdvisorError;
pub use llm::{CompletionClient, GradeParseResult, ParsedRecommendation};
pub use recommend::{
    generate_recommendations, CourseRecommendation, RecommendationResult, WeeklySchedule,
};
pub use rules::{validate_course, validate_selection, CourseValidationResult, CreditBand};
pub use students::{GradeAttempt, GradeStatus, StudentDirectory, StudentRecord};
