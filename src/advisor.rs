//! Facade wiring the advisory pipeline together.
//!
//! The embedding bot process constructs one [`Advisor`] at startup (store,
//! student snapshot, optional completion client) and calls its operations
//! per chat request. Every recommendation request is appended to a JSONL
//! advisory log next to the reference data.

use crate::analysis::AcademicStatus;
use crate::config::AppConfig;
use crate::context::{RecommendationContext, UserPreferences};
use crate::curriculum::{CurriculumVersion, ReferenceStore, SemesterOfferings};
use crate::error::AdvisorError;
use crate::llm::{
    fallback_grade_parsing, parse_grades_text, parse_recommendation_response, CompletionClient,
    GradeParseResult, ParsedRecommendation,
};
use crate::recommend::{generate_recommendations, RecommendationResult};
use crate::rules::CourseValidationResult;
use crate::students::{StudentDirectory, StudentRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Advisory events recorded per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryEventType {
    ContextAssembled,
    RecommendationsGenerated,
    GradesParsed,
}

/// One line of the advisory JSONL log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryEvent {
    pub event_id: Uuid,
    pub student_number: String,
    pub event_type: AdvisoryEventType,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// Append-only JSONL log of advisory activity.
pub struct AdvisoryLog {
    events_path: PathBuf,
}

impl AdvisoryLog {
    pub fn for_store(store: &ReferenceStore) -> Self {
        Self {
            events_path: store.data_dir().join("advisory_events.jsonl"),
        }
    }

    pub fn append(&self, event: &AdvisoryEvent) -> Result<()> {
        if let Some(parent) = self.events_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .with_context(|| {
                format!("Failed to open advisory log at {}", self.events_path.display())
            })?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Entry point the presentation layer talks to.
pub struct Advisor {
    store: ReferenceStore,
    students: StudentDirectory,
    client: Option<Box<dyn CompletionClient>>,
    config: AppConfig,
    log: AdvisoryLog,
}

impl Advisor {
    pub fn new(
        store: ReferenceStore,
        students: StudentDirectory,
        client: Option<Box<dyn CompletionClient>>,
        config: AppConfig,
    ) -> Self {
        let log = AdvisoryLog::for_store(&store);
        Self {
            store,
            students,
            client,
            config,
            log,
        }
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    fn student(&self, student_number: &str) -> Result<&StudentRecord> {
        self.students
            .find(student_number)
            .ok_or_else(|| AdvisorError::StudentNotFound(student_number.to_string()).into())
    }

    /// Derives the current academic snapshot for one student.
    pub fn analyze_status(&self, student_number: &str) -> Result<AcademicStatus> {
        let student = self.student(student_number)?;
        let version = CurriculumVersion::for_entry_year(student.entry_year);
        let curriculum = self.store.curriculum(version)?;
        Ok(crate::analysis::analyze_status(student, curriculum))
    }

    /// Validates one candidate course against a previously derived status.
    pub fn validate_course(
        &self,
        course_code: &str,
        status: &AcademicStatus,
        offerings: &SemesterOfferings,
        already_selected: &[String],
    ) -> Result<CourseValidationResult> {
        let curriculum = self.store.curriculum(status.curriculum_version)?;
        Ok(crate::rules::validate_course(
            course_code,
            status,
            curriculum,
            self.store.general_rules(),
            offerings,
            already_selected,
        ))
    }

    /// Validates a full proposed selection.
    pub fn validate_selection(
        &self,
        selected_courses: &[String],
        status: &AcademicStatus,
        offerings: &SemesterOfferings,
    ) -> Result<crate::rules::SelectionValidation> {
        let curriculum = self.store.curriculum(status.curriculum_version)?;
        Ok(crate::rules::validate_selection(
            selected_courses,
            status,
            curriculum,
            self.store.general_rules(),
            offerings,
        ))
    }

    /// Loads the offerings catalog for one target semester.
    pub fn offerings(&self, target_semester: &str) -> Result<SemesterOfferings> {
        self.store.offerings(target_semester)
    }

    /// Assembles the complete typed context for one request.
    pub fn assemble_context(
        &self,
        student_number: &str,
        target_semester: &str,
        preferences: UserPreferences,
    ) -> Result<RecommendationContext> {
        let student = self.student(student_number)?;
        let context =
            crate::context::assemble_context(student, &self.store, target_semester, preferences)?;
        self.record_event(
            student_number,
            AdvisoryEventType::ContextAssembled,
            serde_json::json!({
                "context_id": context.context_id,
                "target_semester": target_semester,
                "available_courses": context.available_courses.len(),
            }),
        );
        Ok(context)
    }

    /// Runs the full recommendation pipeline for one student.
    pub fn generate_recommendations(
        &self,
        student_number: &str,
        target_semester: &str,
        preferences: UserPreferences,
        use_llm: bool,
    ) -> Result<RecommendationResult> {
        let student = self.student(student_number)?;
        let result = generate_recommendations(
            student,
            &self.store,
            self.client.as_deref(),
            target_semester,
            preferences,
            use_llm,
            &self.config,
        )?;
        self.record_event(
            student_number,
            AdvisoryEventType::RecommendationsGenerated,
            serde_json::json!({
                "target_semester": target_semester,
                "strategy": result.strategy,
                "final_count": result.final_recommendations.len(),
                "total_credits": result.weekly_schedule.total_credits,
                "llm_used": result.llm_based.is_some(),
                "is_valid": result.validation.is_valid,
            }),
        );
        Ok(result)
    }

    /// Parses pasted transcript text into structured grades. Without a
    /// completion client the regex fallback runs directly.
    pub fn parse_grade_text(
        &self,
        text: &str,
        known_courses: &[(String, String)],
    ) -> GradeParseResult {
        let result = match self.client.as_deref() {
            Some(client) => parse_grades_text(
                client,
                text,
                known_courses,
                self.config.llm.grade_course_limit,
            ),
            None => fallback_grade_parsing(text),
        };
        self.record_event(
            "",
            AdvisoryEventType::GradesParsed,
            serde_json::json!({
                "grades": result.parsed_grades.len(),
                "confidence": result.confidence,
            }),
        );
        result
    }

    /// Parses a model recommendation response standalone (no catalog
    /// enrichment).
    pub fn parse_recommendation_response(&self, text: &str) -> ParsedRecommendation {
        parse_recommendation_response(text, None)
    }

    fn record_event(
        &self,
        student_number: &str,
        event_type: AdvisoryEventType,
        details: serde_json::Value,
    ) {
        let event = AdvisoryEvent {
            event_id: Uuid::new_v4(),
            student_number: student_number.to_string(),
            event_type,
            timestamp: Utc::now(),
            details,
        };
        if let Err(error) = self.log.append(&event) {
            tracing::warn!(%error, "failed to append advisory event");
        }
    }
}
