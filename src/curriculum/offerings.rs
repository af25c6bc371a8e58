//! Semester offerings catalog.
//!
//! One JSON document per target semester lists what is actually being
//! taught, optionally partitioned into entry-year groups plus shared
//! general/advanced catalogs. Parsed into typed structures at load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Credit units, either a flat count or split theoretical/practical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreditValue {
    Split { theoretical: u32, practical: u32 },
    Flat(u32),
}

impl CreditValue {
    pub fn total(self) -> u32 {
        match self {
            Self::Flat(credits) => credits,
            Self::Split {
                theoretical,
                practical,
            } => theoretical + practical,
        }
    }
}

impl Default for CreditValue {
    fn default() -> Self {
        Self::Flat(0)
    }
}

/// One taught course with its scheduling detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferedCourse {
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub credits: CreditValue,
    /// Lecture slots as `"<weekday> HH:MM-HH:MM"` strings.
    #[serde(default)]
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub lab_slots: Vec<String>,
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub enrolled: Option<u32>,
}

/// Courses offered specifically to one entry-year cohort group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingGroup {
    pub group_id: String,
    #[serde(default)]
    pub courses: Vec<OfferedCourse>,
}

/// Which catalog an offered course was found in. Carried through context
/// assembly so the presentation layer can explain availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "group")]
pub enum CatalogSource {
    Group(String),
    General,
    Advanced,
}

/// The per-semester offerings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterOfferings {
    pub semester: String,
    #[serde(default)]
    pub persian_name: Option<String>,
    #[serde(default)]
    pub group_based_system: bool,
    #[serde(default)]
    pub available_groups: Vec<OfferingGroup>,
    #[serde(default)]
    pub general_courses: Vec<OfferedCourse>,
    #[serde(default)]
    pub advanced_courses: Vec<OfferedCourse>,
    #[serde(default)]
    pub special_notes: Vec<String>,
}

impl SemesterOfferings {
    pub fn parse(raw_json: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw_json).context("Malformed semester offerings document")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .with_context(|| format!("Failed to read offerings at {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to load offerings at {}", path.display()))
    }

    /// Whether the course is reachable for a student: inside their cohort
    /// group when one is assigned, or in the shared catalogs.
    pub fn is_offered(&self, course_code: &str, student_group: Option<&str>) -> bool {
        if self.group_based_system {
            if let Some(group_id) = student_group {
                let in_group = self
                    .available_groups
                    .iter()
                    .filter(|group| group.group_id == group_id)
                    .flat_map(|group| group.courses.iter())
                    .any(|course| course.course_code == course_code);
                if in_group {
                    return true;
                }
            }
        }
        self.general_courses
            .iter()
            .chain(self.advanced_courses.iter())
            .any(|course| course.course_code == course_code)
    }

    /// Whether the course is offered inside one specific cohort group.
    pub fn offered_to_group(&self, course_code: &str, group_id: &str) -> bool {
        self.available_groups
            .iter()
            .filter(|group| group.group_id == group_id)
            .flat_map(|group| group.courses.iter())
            .any(|course| course.course_code == course_code)
    }

    /// Finds scheduling detail for a course, searching cohort groups first
    /// and shared catalogs second.
    pub fn find(&self, course_code: &str) -> Option<&OfferedCourse> {
        self.available_groups
            .iter()
            .flat_map(|group| group.courses.iter())
            .chain(self.general_courses.iter())
            .chain(self.advanced_courses.iter())
            .find(|course| course.course_code == course_code)
    }

    pub fn course_credits(&self, course_code: &str) -> Option<u32> {
        self.find(course_code).map(|course| course.credits.total())
    }

    /// Every offered course with the catalog it came from.
    pub fn all_courses(&self) -> impl Iterator<Item = (&OfferedCourse, CatalogSource)> {
        let grouped = self.available_groups.iter().flat_map(|group| {
            group
                .courses
                .iter()
                .map(move |course| (course, CatalogSource::Group(group.group_id.clone())))
        });
        let general = self
            .general_courses
            .iter()
            .map(|course| (course, CatalogSource::General));
        let advanced = self
            .advanced_courses
            .iter()
            .map(|course| (course, CatalogSource::Advanced));
        grouped.chain(general).chain(advanced)
    }
}
