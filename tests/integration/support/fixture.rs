use anyhow::{anyhow, Result};
use chrono::Utc;
use coursebase::advisor::Advisor;
use coursebase::config::AppConfig;
use coursebase::curriculum::ReferenceStore;
use coursebase::llm::CompletionClient;
use coursebase::students::{GradeAttempt, GradeStatus, StudentDirectory, StudentRecord};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

/// Completion client that always returns the same canned response.
pub struct ScriptedClient {
    pub response: String,
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// Completion client that always fails, standing in for a timed-out model.
pub struct FailingClient;

impl CompletionClient for FailingClient {
    fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Err(anyhow!("completion transport unavailable"))
    }
}

/// Materializes reference data plus a student snapshot in a temp workspace
/// and hands out wired-up [`Advisor`] instances.
pub struct AdvisoryFixture {
    workspace: TempDir,
}

impl AdvisoryFixture {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        write_reference_data(workspace.path());
        Self { workspace }
    }

    pub fn data_dir(&self) -> &Path {
        self.workspace.path()
    }

    pub fn store(&self) -> ReferenceStore {
        ReferenceStore::open(self.workspace.path()).expect("failed to open reference store")
    }

    pub fn advisor(&self, client: Option<Box<dyn CompletionClient>>) -> Advisor {
        Advisor::new(self.store(), students(), client, AppConfig::default())
    }
}

fn attempt(code: &str, grade: f64, number: u32, semester: u32) -> GradeAttempt {
    GradeAttempt {
        course_code: code.to_string(),
        grade: Some(grade),
        status: if grade >= 10.0 {
            GradeStatus::Passed
        } else {
            GradeStatus::Failed
        },
        attempt_number: number,
        semester_taken: Some(semester),
        recorded_at: Utc::now(),
    }
}

fn student(number: &str, entry_year: i32, semester: u32, grades: Vec<GradeAttempt>) -> StudentRecord {
    StudentRecord {
        id: Uuid::new_v4(),
        student_number: number.to_string(),
        entry_year,
        current_semester: semester,
        grades,
    }
}

/// Snapshot used across the integration suite:
/// - 40310024: post-1403 freshman, cohort A, no grades yet.
/// - 40110015: semester-5 student with one failed course and an AI track.
/// - 40210031: probation-band student (GPA 11.0).
/// - 40130088: has both physical-education credits already.
pub fn students() -> StudentDirectory {
    StudentDirectory::new(vec![
        student("40310024", 1403, 1, vec![]),
        student(
            "40110015",
            1401,
            5,
            vec![
                attempt("MATH101", 8.0, 1, 1),
                attempt("MATH101", 15.0, 2, 2),
                attempt("PHYS101", 12.0, 1, 1),
                attempt("CS101", 17.0, 1, 1),
                attempt("CS201", 13.0, 1, 2),
                attempt("DISC201", 9.0, 1, 2),
                attempt("AI401", 16.0, 1, 4),
            ],
        ),
        student(
            "40210031",
            1402,
            3,
            vec![attempt("MATH101", 11.0, 1, 1), attempt("PHYS101", 11.0, 1, 1)],
        ),
        student(
            "40130088",
            1401,
            3,
            vec![
                attempt("PE101", 18.0, 1, 1),
                attempt("PE102", 17.0, 1, 2),
                attempt("MATH101", 15.0, 1, 1),
            ],
        ),
    ])
}

fn write_reference_data(dir: &Path) {
    let chart = serde_json::json!({
        "entry_years": [1400, 1401, 1402, 1403, 1404],
        "total_credits_required": 140,
        "semesters": {
            "1": {
                "semester_name": "نیمسال اول",
                "courses": [
                    {"course_code": "MATH101", "course_name": "ریاضی عمومی 1",
                     "theoretical_credits": 3, "course_type": "foundation"},
                    {"course_code": "PHYS101", "course_name": "فیزیک 1",
                     "theoretical_credits": 3, "course_type": "foundation"},
                    {"course_code": "CS101", "course_name": "مبانی کامپیوتر",
                     "theoretical_credits": 3, "course_type": "core"},
                    {"course_code": "PE101", "course_name": "تربیت بدنی",
                     "practical_credits": 1, "course_type": "general", "is_mandatory": false}
                ]
            },
            "2": {
                "courses": [
                    {"course_code": "MATH201", "course_name": "ریاضی عمومی 2",
                     "theoretical_credits": 3, "course_type": "foundation",
                     "prerequisites": ["MATH101"]},
                    {"course_code": "CS201", "course_name": "برنامه‌سازی پیشرفته",
                     "theoretical_credits": 3, "course_type": "core",
                     "prerequisites": ["CS101"]},
                    {"course_code": "DISC201", "course_name": "ریاضیات گسسته",
                     "theoretical_credits": 3, "course_type": "foundation",
                     "prerequisites": ["MATH101"]},
                    {"course_code": "PE102", "course_name": "ورزش 1",
                     "practical_credits": 1, "course_type": "general", "is_mandatory": false}
                ]
            },
            "3": {
                "courses": [
                    {"course_code": "DS301", "course_name": "ساختمان داده",
                     "theoretical_credits": 3, "course_type": "core",
                     "prerequisites": ["CS201", "DISC201"]},
                    {"course_code": "STAT301", "course_name": "آمار و احتمال",
                     "theoretical_credits": 3, "course_type": "foundation",
                     "prerequisites": ["MATH201"]}
                ]
            },
            "5": {
                "courses": [
                    {"course_code": "SE501", "course_name": "مهندسی نرم‌افزار",
                     "theoretical_credits": 3, "course_type": "core",
                     "prerequisites": ["CS201"]}
                ]
            },
            "6": {
                "courses": [
                    {"course_code": "CAP601", "course_name": "پروژه نرم‌افزار",
                     "theoretical_credits": 3, "course_type": "core",
                     "prerequisites": ["DS301"]}
                ]
            }
        },
        "specialization_tracks": {
            "tracks": [
                {"track_name": "هوش مصنوعی", "courses": ["AI401", "AI402"], "min_credits": 9},
                {"track_name": "شبکه", "courses": ["NET401"], "min_credits": 9}
            ]
        },
        "general_electives": [
            {"course_code": "GEN210", "course_name": "آشنایی با صنعت"}
        ]
    });
    fs::write(
        dir.join("curriculum_1403_onwards.json"),
        serde_json::to_vec_pretty(&chart).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("curriculum_before_1403.json"),
        serde_json::to_vec_pretty(&chart).unwrap(),
    )
    .unwrap();

    let general = serde_json::json!({
        "course_categories": {
            "religious_courses": {
                "courses": [{"course_code": "REL101"}, {"course_code": "REL102"}]
            },
            "physical_education": {
                "courses": [
                    {"course_code": "PE101"}, {"course_code": "PE102"}, {"course_code": "PE103"}
                ]
            },
            "language_courses": {
                "courses": [
                    {"course_code": "ENG101"},
                    {"course_code": "ENG201", "prerequisites": ["ENG101"]}
                ]
            }
        }
    });
    fs::write(
        dir.join("general_courses.json"),
        serde_json::to_vec_pretty(&general).unwrap(),
    )
    .unwrap();

    let offerings = serde_json::json!({
        "semester": "mehr_1404",
        "persian_name": "مهر ۱۴۰۴",
        "group_based_system": true,
        "available_groups": [
            {
                "group_id": "A",
                "courses": [
                    {"course_code": "MATH101", "course_name": "ریاضی عمومی 1",
                     "credits": {"theoretical": 3, "practical": 0},
                     "time_slots": ["شنبه 8:00-10:00"], "exam_date": "1404-10-01",
                     "instructor": "دکتر رضایی"},
                    {"course_code": "PHYS101", "course_name": "فیزیک 1",
                     "credits": 3, "time_slots": ["یکشنبه 8:00-10:00"],
                     "exam_date": "1404-10-02"}
                ]
            },
            {
                "group_id": "B",
                "courses": [
                    {"course_code": "MATH101", "course_name": "ریاضی عمومی 1",
                     "credits": 3, "time_slots": ["شنبه 10:00-12:00"],
                     "exam_date": "1404-10-01"},
                    {"course_code": "CS102", "course_name": "کارگاه کامپیوتر",
                     "credits": 1, "time_slots": ["دوشنبه 8:00-10:00"],
                     "exam_date": "1404-10-03"}
                ]
            }
        ],
        "general_courses": [
            {"course_code": "CS101", "course_name": "مبانی کامپیوتر", "credits": 3,
             "time_slots": ["دوشنبه 8:00-10:00"], "exam_date": "1404-10-04",
             "capacity": 40, "enrolled": 40},
            {"course_code": "MATH201", "course_name": "ریاضی عمومی 2", "credits": 3,
             "time_slots": ["شنبه 10:00-12:00"], "exam_date": "1404-10-05",
             "capacity": 40, "enrolled": 35},
            {"course_code": "DISC201", "course_name": "ریاضیات گسسته", "credits": 3,
             "time_slots": ["یکشنبه 10:00-12:00"], "exam_date": "1404-10-06"},
            {"course_code": "CS201", "course_name": "برنامه‌سازی پیشرفته", "credits": 3,
             "time_slots": ["سه‌شنبه 8:00-10:00"], "exam_date": "1404-10-07"},
            {"course_code": "DS301", "course_name": "ساختمان داده", "credits": 3,
             "time_slots": ["چهارشنبه 8:00-10:00"], "exam_date": "1404-10-08"},
            {"course_code": "STAT301", "course_name": "آمار و احتمال", "credits": 3,
             "time_slots": ["چهارشنبه 10:00-12:00"], "exam_date": "1404-10-09"},
            {"course_code": "SE501", "course_name": "مهندسی نرم‌افزار", "credits": 3,
             "time_slots": ["سه‌شنبه 10:00-12:00"], "exam_date": "1404-10-10"},
            {"course_code": "REL101", "course_name": "اندیشه اسلامی 1", "credits": 2,
             "time_slots": ["شنبه 14:00-16:00"], "exam_date": "1404-10-11"},
            {"course_code": "REL102", "course_name": "اندیشه اسلامی 2", "credits": 2,
             "time_slots": ["یکشنبه 14:00-16:00"], "exam_date": "1404-10-12"},
            {"course_code": "PE101", "course_name": "تربیت بدنی", "credits": 1,
             "time_slots": ["دوشنبه 14:00-15:00"]},
            {"course_code": "PE103", "course_name": "ورزش 2", "credits": 1,
             "time_slots": ["دوشنبه 16:00-17:00"]},
            {"course_code": "ENG201", "course_name": "انگلیسی 2", "credits": 3,
             "time_slots": ["پنج‌شنبه 8:00-10:00"], "exam_date": "1404-10-13"},
            {"course_code": "GEN210", "course_name": "آشنایی با صنعت", "credits": 2,
             "time_slots": ["پنج‌شنبه 10:00-12:00"], "exam_date": "1404-10-14"},
            {"course_code": "CONF101", "course_name": "درس آزمایشی", "credits": 3,
             "time_slots": ["شنبه 10:30-11:30"]}
        ],
        "advanced_courses": [
            {"course_code": "AI401", "course_name": "هوش مصنوعی", "credits": 3,
             "time_slots": ["دوشنبه 10:00-12:00"], "exam_date": "1404-10-15"},
            {"course_code": "AI402", "course_name": "یادگیری ماشین", "credits": 3,
             "time_slots": ["سه‌شنبه 14:00-16:00"], "exam_date": "1404-10-16"},
            {"course_code": "NET401", "course_name": "شبکه‌های کامپیوتری", "credits": 3,
             "time_slots": ["چهارشنبه 14:00-16:00"], "exam_date": "1404-10-17"},
            {"course_code": "EX401", "course_name": "مباحث ویژه 1", "credits": 3,
             "time_slots": ["جمعه 8:00-10:00"], "exam_date": "1404-10-25"},
            {"course_code": "EX402", "course_name": "مباحث ویژه 2", "credits": 3,
             "time_slots": ["جمعه 10:00-12:00"], "exam_date": "1404-10-25"}
        ],
        "special_notes": ["ثبت‌نام از ۱۵ شهریور آغاز می‌شود"]
    });
    let offerings_dir = dir.join("offerings");
    fs::create_dir_all(&offerings_dir).unwrap();
    fs::write(
        offerings_dir.join("mehr_1404.json"),
        serde_json::to_vec_pretty(&offerings).unwrap(),
    )
    .unwrap();
}
