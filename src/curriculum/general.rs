//! General-education course rules.
//!
//! Religious-studies, physical-education and language-sequence courses have
//! their own term-level constraints regardless of the chart. The source
//! document groups them by category; the typed form exposes membership
//! checks the rules engine needs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One course listed inside a general-education category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralCourse {
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub credits: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCategory {
    #[serde(default)]
    courses: Vec<GeneralCourse>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCategories {
    #[serde(default)]
    religious_courses: RawCategory,
    #[serde(default)]
    physical_education: RawCategory,
    #[serde(default)]
    language_courses: RawCategory,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGeneralRules {
    #[serde(default)]
    course_categories: RawCategories,
}

/// Typed view of the general-education rules document.
#[derive(Debug, Clone, Default)]
pub struct GeneralCourseRules {
    pub religious: Vec<GeneralCourse>,
    pub physical_education: Vec<GeneralCourse>,
    pub language: Vec<GeneralCourse>,
}

impl GeneralCourseRules {
    pub fn parse(raw_json: &[u8]) -> Result<Self> {
        let raw: RawGeneralRules =
            serde_json::from_slice(raw_json).context("Malformed general-courses document")?;
        Ok(Self {
            religious: raw.course_categories.religious_courses.courses,
            physical_education: raw.course_categories.physical_education.courses,
            language: raw.course_categories.language_courses.courses,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .with_context(|| format!("Failed to read general-courses file at {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("Failed to load general-courses file at {}", path.display()))
    }

    pub fn is_religious(&self, course_code: &str) -> bool {
        self.religious.iter().any(|c| c.course_code == course_code)
    }

    pub fn is_physical_education(&self, course_code: &str) -> bool {
        self.physical_education
            .iter()
            .any(|c| c.course_code == course_code)
    }

    pub fn language_course(&self, course_code: &str) -> Option<&GeneralCourse> {
        self.language.iter().find(|c| c.course_code == course_code)
    }
}
