//! Explicitly constructed reference-data provider.
//!
//! Charts and general-education rules are loaded once when the store is
//! opened and are read-only afterwards; offerings documents are read per
//! request (the files never change during normal operation, so either
//! policy is correct and the simpler one wins). The store is owned by the
//! caller and injected into the pipeline; there is no process-global
//! state.

use super::{Curriculum, CurriculumVersion, GeneralCourseRules, SemesterOfferings};
use crate::error::AdvisorError;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

const GENERAL_COURSES_FILE: &str = "general_courses.json";
const OFFERINGS_SUBDIR: &str = "offerings";

/// Read-only reference data for one advisory process.
pub struct ReferenceStore {
    data_dir: PathBuf,
    curricula: HashMap<CurriculumVersion, Curriculum>,
    general_rules: GeneralCourseRules,
}

impl ReferenceStore {
    /// Opens the store, eagerly loading both chart versions and the
    /// general-education rules. A missing or corrupt chart is logged and
    /// left absent; requesting it later fails with `CurriculumMissing`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let mut curricula = HashMap::new();
        for version in [CurriculumVersion::Pre1403, CurriculumVersion::Post1403] {
            let path = data_dir.join(version.chart_file_name());
            match Curriculum::load(version, &path) {
                Ok(chart) => {
                    curricula.insert(version, chart);
                }
                Err(error) => {
                    warn!(%version, %error, "curriculum chart unavailable");
                }
            }
        }

        let general_path = data_dir.join(GENERAL_COURSES_FILE);
        let general_rules = match GeneralCourseRules::load(&general_path) {
            Ok(rules) => rules,
            Err(error) => {
                warn!(%error, "general-courses rules unavailable, constraints disabled");
                GeneralCourseRules::default()
            }
        };

        Ok(Self {
            data_dir,
            curricula,
            general_rules,
        })
    }

    /// Opens the store at the platform default data directory, honoring the
    /// config override when present.
    pub fn open_default(config: &crate::config::AppConfig) -> Result<Self> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => crate::config::default_data_dir()?,
        };
        Self::open(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn curriculum(&self, version: CurriculumVersion) -> Result<&Curriculum> {
        self.curricula
            .get(&version)
            .ok_or_else(|| AdvisorError::CurriculumMissing(version.to_string()).into())
    }

    pub fn general_rules(&self) -> &GeneralCourseRules {
        &self.general_rules
    }

    /// Reads the offerings document for one target semester.
    pub fn offerings(&self, semester: &str) -> Result<SemesterOfferings> {
        let path = self
            .data_dir
            .join(OFFERINGS_SUBDIR)
            .join(format!("{semester}.json"));
        if !path.exists() {
            return Err(AdvisorError::OfferingsMissing(semester.to_string()).into());
        }
        SemesterOfferings::load(&path)
    }
}
