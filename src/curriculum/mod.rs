//! Typed curriculum reference data.
//!
//! The curriculum chart arrives as loose JSON; everything here parses and
//! validates it into strongly-typed structures at load time so the rest of
//! the pipeline never touches untyped maps. A flat course map (code →
//! [`CourseInfo`]) is built once per chart for O(1) lookups by the analyzer,
//! the rules engine and the parser enrichment path.

mod general;
mod offerings;
mod store;

pub use general::GeneralCourseRules;
pub use offerings::{CatalogSource, CreditValue, OfferedCourse, OfferingGroup, SemesterOfferings};
pub use store::ReferenceStore;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Which curriculum chart governs a student, decided by entry year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurriculumVersion {
    Pre1403,
    Post1403,
}

impl CurriculumVersion {
    pub fn for_entry_year(entry_year: i32) -> Self {
        if entry_year >= 1403 {
            Self::Post1403
        } else {
            Self::Pre1403
        }
    }

    /// File name of the chart document inside the reference data directory.
    pub fn chart_file_name(self) -> &'static str {
        match self {
            Self::Post1403 => "curriculum_1403_onwards.json",
            Self::Pre1403 => "curriculum_before_1403.json",
        }
    }
}

impl fmt::Display for CurriculumVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre1403 => write!(f, "pre_1403"),
            Self::Post1403 => write!(f, "post_1403"),
        }
    }
}

/// Classification used for credit bookkeeping and balance analysis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    Foundation,
    Core,
    Specialized,
    #[default]
    General,
}

/// Perceived difficulty of a course, derived from its placement in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One course as defined inside a semester of the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumCourse {
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub theoretical_credits: u32,
    #[serde(default)]
    pub practical_credits: u32,
    #[serde(default)]
    pub course_type: CourseType,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
}

const fn default_mandatory() -> bool {
    true
}

impl CurriculumCourse {
    pub fn total_credits(&self) -> u32 {
        self.theoretical_credits + self.practical_credits
    }
}

/// Courses expected in one chart semester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterPlan {
    #[serde(default)]
    pub semester_name: Option<String>,
    #[serde(default)]
    pub courses: Vec<CurriculumCourse>,
}

/// A named elective concentration with its member courses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecializationTrack {
    pub track_name: String,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default = "default_track_min_credits")]
    pub min_credits: u32,
}

const fn default_track_min_credits() -> u32 {
    6
}

/// A general elective outside the semester structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectiveCourse {
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Flat lookup record for a single course, denormalized from the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInfo {
    pub course_code: String,
    pub course_name: String,
    pub theoretical_credits: u32,
    pub practical_credits: u32,
    pub course_type: CourseType,
    pub is_mandatory: bool,
    pub prerequisites: Vec<String>,
    pub recommended_semester: Option<u32>,
    pub elective_track: Option<String>,
}

impl CourseInfo {
    pub fn total_credits(&self) -> u32 {
        self.theoretical_credits + self.practical_credits
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawTracks {
    #[serde(default)]
    tracks: Vec<SpecializationTrack>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCurriculum {
    #[serde(default)]
    entry_years: Vec<i32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_total_credits")]
    total_credits_required: u32,
    #[serde(default = "default_minimum_gpa")]
    minimum_gpa: f64,
    #[serde(default)]
    semesters: BTreeMap<String, SemesterPlan>,
    #[serde(default)]
    specialization_tracks: RawTracks,
    #[serde(default)]
    general_electives: Vec<ElectiveCourse>,
}

const fn default_total_credits() -> u32 {
    140
}

const fn default_minimum_gpa() -> f64 {
    12.0
}

/// A fully validated curriculum chart.
#[derive(Debug, Clone)]
pub struct Curriculum {
    pub version: CurriculumVersion,
    pub entry_years: Vec<i32>,
    pub description: Option<String>,
    pub total_credits_required: u32,
    pub minimum_gpa: f64,
    pub semesters: BTreeMap<u32, SemesterPlan>,
    pub specialization_tracks: Vec<SpecializationTrack>,
    pub general_electives: Vec<ElectiveCourse>,
    course_map: HashMap<String, CourseInfo>,
}

impl Curriculum {
    /// Parses a chart document, rejecting structurally malformed entries and
    /// skipping (with a warning) entries that are merely incomplete.
    pub fn parse(version: CurriculumVersion, raw_json: &[u8]) -> Result<Self> {
        let raw: RawCurriculum =
            serde_json::from_slice(raw_json).context("Malformed curriculum chart document")?;

        let mut semesters = BTreeMap::new();
        for (key, plan) in raw.semesters {
            let number: u32 = key
                .parse()
                .with_context(|| format!("Curriculum semester key {key:?} is not a number"))?;
            if number == 0 {
                bail!("Curriculum semester numbering starts at 1");
            }
            semesters.insert(number, plan);
        }

        let mut curriculum = Self {
            version,
            entry_years: raw.entry_years,
            description: raw.description,
            total_credits_required: raw.total_credits_required,
            minimum_gpa: raw.minimum_gpa,
            semesters,
            specialization_tracks: raw.specialization_tracks.tracks,
            general_electives: raw.general_electives,
            course_map: HashMap::new(),
        };
        curriculum.build_course_map();
        Ok(curriculum)
    }

    pub fn load<P: AsRef<Path>>(version: CurriculumVersion, path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .with_context(|| format!("Failed to read curriculum chart at {}", path.display()))?;
        Self::parse(version, &raw)
            .with_context(|| format!("Failed to load curriculum chart at {}", path.display()))
    }

    fn build_course_map(&mut self) {
        let mut map = HashMap::new();
        for (number, plan) in &self.semesters {
            for course in &plan.courses {
                if course.course_code.trim().is_empty() {
                    warn!(semester = number, "skipping curriculum course with empty code");
                    continue;
                }
                map.insert(
                    course.course_code.clone(),
                    CourseInfo {
                        course_code: course.course_code.clone(),
                        course_name: course.course_name.clone(),
                        theoretical_credits: course.theoretical_credits,
                        practical_credits: course.practical_credits,
                        course_type: course.course_type,
                        is_mandatory: course.is_mandatory,
                        prerequisites: course.prerequisites.clone(),
                        recommended_semester: Some(*number),
                        elective_track: None,
                    },
                );
            }
        }
        // Track members do not override semester courses.
        for track in &self.specialization_tracks {
            for code in &track.courses {
                map.entry(code.clone()).or_insert_with(|| CourseInfo {
                    course_code: code.clone(),
                    course_name: code.clone(),
                    theoretical_credits: 3,
                    practical_credits: 0,
                    course_type: CourseType::Specialized,
                    is_mandatory: false,
                    prerequisites: Vec::new(),
                    recommended_semester: None,
                    elective_track: Some(track.track_name.clone()),
                });
            }
        }
        self.course_map = map;
    }

    pub fn course_info(&self, course_code: &str) -> Option<&CourseInfo> {
        self.course_map.get(course_code)
    }

    /// Name lookup used by grade parsing: exact match first, substring next.
    pub fn find_by_name(&self, course_name: &str) -> Option<&CourseInfo> {
        let needle = normalize_name(course_name);
        if needle.is_empty() {
            return None;
        }
        if let Some(info) = self
            .course_map
            .values()
            .find(|info| normalize_name(&info.course_name) == needle)
        {
            return Some(info);
        }
        self.course_map.values().find(|info| {
            let haystack = normalize_name(&info.course_name);
            haystack.contains(&needle) || needle.contains(&haystack)
        })
    }

    pub fn semester_plan(&self, semester: u32) -> Option<&SemesterPlan> {
        self.semesters.get(&semester)
    }

    pub fn recommended_semester(&self, course_code: &str) -> Option<u32> {
        self.course_info(course_code)
            .and_then(|info| info.recommended_semester)
    }

    /// True when some other chart course lists this code as a prerequisite.
    pub fn is_prerequisite_for_others(&self, course_code: &str) -> bool {
        self.semesters.values().any(|plan| {
            plan.courses
                .iter()
                .any(|course| course.prerequisites.iter().any(|p| p == course_code))
        })
    }

    pub fn track_of(&self, course_code: &str) -> Option<&SpecializationTrack> {
        self.specialization_tracks
            .iter()
            .find(|track| track.courses.iter().any(|c| c == course_code))
    }

    pub fn is_elective(&self, course_code: &str) -> bool {
        self.track_of(course_code).is_some()
            || self
                .general_electives
                .iter()
                .any(|course| course.course_code == course_code)
    }

    /// Specialization members are treated as hard; listed general electives
    /// default to easy; everything else is medium.
    pub fn difficulty_of(&self, course_code: &str) -> Difficulty {
        if self.track_of(course_code).is_some() {
            return Difficulty::Hard;
        }
        if let Some(info) = self.course_info(course_code) {
            if info.course_type == CourseType::Specialized {
                return Difficulty::Hard;
            }
        }
        if let Some(elective) = self
            .general_electives
            .iter()
            .find(|course| course.course_code == course_code)
        {
            return elective.difficulty.unwrap_or(Difficulty::Easy);
        }
        Difficulty::Medium
    }

    pub fn course_count(&self) -> usize {
        self.course_map.len()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
