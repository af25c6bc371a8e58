//! Read-side view of the student/grade store.
//!
//! The bot's persistence layer owns writes; the advisory core only needs a
//! student's identity plus the ordered grade-attempt history. The directory
//! can be hydrated from a `students.json` snapshot in the reference data
//! directory or constructed in memory by the embedding process.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Outcome flag carried by each raw grade attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Passed,
    Failed,
    Withdrawn,
}

/// One raw grade attempt as recorded by the persistence layer.
///
/// A student may attempt the same course several times; only the attempt
/// with the highest `attempt_number` per course code is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeAttempt {
    pub course_code: String,
    /// Numeric grade on the 0–20 scale, absent for withdrawn records.
    pub grade: Option<f64>,
    pub status: GradeStatus,
    pub attempt_number: u32,
    /// Semester counter (1-based) in which the attempt was taken.
    #[serde(default)]
    pub semester_taken: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

impl GradeAttempt {
    /// An attempt passes when a grade is present and reaches 10.0.
    pub fn is_passing(&self) -> bool {
        self.grade.map(|g| g >= 10.0).unwrap_or(false)
    }
}

/// Identity and progress of a registered student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: Uuid,
    /// University student number; its last digit drives cohort assignment.
    pub student_number: String,
    /// Persian-calendar entry year, e.g. 1403.
    pub entry_year: i32,
    /// Current semester counter (1-based).
    pub current_semester: u32,
    #[serde(default)]
    pub grades: Vec<GradeAttempt>,
}

/// In-memory directory of student records.
#[derive(Debug, Clone, Default)]
pub struct StudentDirectory {
    students: Vec<StudentRecord>,
}

impl StudentDirectory {
    pub fn new(students: Vec<StudentRecord>) -> Self {
        Self { students }
    }

    /// Loads a `students.json` snapshot exported by the persistence layer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .with_context(|| format!("Failed to read student snapshot at {}", path.display()))?;
        let students: Vec<StudentRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("Malformed student snapshot at {}", path.display()))?;
        Ok(Self { students })
    }

    pub fn find(&self, student_number: &str) -> Option<&StudentRecord> {
        self.students
            .iter()
            .find(|s| s.student_number == student_number)
    }

    pub fn insert(&mut self, record: StudentRecord) {
        match self
            .students
            .iter_mut()
            .find(|s| s.student_number == record.student_number)
        {
            Some(existing) => *existing = record,
            None => self.students.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
