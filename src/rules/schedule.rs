//! Time-slot parsing and conflict detection.
//!
//! Slots arrive as `"<weekday> HH:MM-HH:MM"` strings. Parsing failures are
//! treated as "no overlap" and logged as a non-fatal condition; an
//! unreadable slot must never block a course.

use crate::curriculum::OfferedCourse;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distinct kinds of scheduling collision between two courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TimeOverlap,
    LabOverlap,
    ExamConflict,
}

/// One detected collision, with a human-readable detail string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub course_code: String,
    pub other_code: String,
    pub kind: ConflictKind,
    pub details: String,
}

/// A parsed weekly slot with minute-resolution bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub weekday: String,
    pub start_minutes: u32,
    pub end_minutes: u32,
}

impl TimeSlot {
    /// Half-open interval overlap: touching endpoints never collide, and
    /// different weekdays never collide.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.weekday == other.weekday
            && self.start_minutes < other.end_minutes
            && other.start_minutes < self.end_minutes
    }
}

fn parse_clock(raw: &str) -> Option<u32> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Parses a bare `"HH:MM-HH:MM"` range into minute bounds.
pub fn parse_time_range(raw: &str) -> Option<(u32, u32)> {
    let (start, end) = raw.split_once('-')?;
    Some((parse_clock(start)?, parse_clock(end)?))
}

/// Parses a full `"<weekday> HH:MM-HH:MM"` slot.
pub fn parse_time_slot(raw: &str) -> Option<TimeSlot> {
    let (weekday, range) = raw.trim().split_once(' ')?;
    let (start_minutes, end_minutes) = parse_time_range(range)?;
    Some(TimeSlot {
        weekday: weekday.to_string(),
        start_minutes,
        end_minutes,
    })
}

/// Whether two slot strings collide. Fails open on unparseable input.
pub fn slots_overlap(a: &str, b: &str) -> bool {
    match (parse_time_slot(a), parse_time_slot(b)) {
        (Some(first), Some(second)) => first.overlaps(&second),
        _ => {
            debug!(slot_a = a, slot_b = b, "unparseable time slot, assuming no overlap");
            false
        }
    }
}

/// Whether two bare `"HH:MM-HH:MM"` ranges (same weekday implied) collide.
pub fn time_ranges_overlap(a: &str, b: &str) -> bool {
    match (parse_time_range(a), parse_time_range(b)) {
        (Some((start_a, end_a)), Some((start_b, end_b))) => start_a < end_b && start_b < end_a,
        _ => {
            debug!(range_a = a, range_b = b, "unparseable time range, assuming no overlap");
            false
        }
    }
}

fn first_collision<'a>(slots: &'a [String], others: &'a [String]) -> Option<(&'a str, &'a str)> {
    for slot in slots {
        for other in others {
            if slots_overlap(slot, other) {
                return Some((slot.as_str(), other.as_str()));
            }
        }
    }
    None
}

/// All collisions between two offered courses: lecture overlap, lab overlap
/// and exam-date equality are each reported separately.
pub fn find_conflicts(course: &OfferedCourse, other: &OfferedCourse) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    if let Some((slot, other_slot)) = first_collision(&course.time_slots, &other.time_slots) {
        conflicts.push(ScheduleConflict {
            course_code: course.course_code.clone(),
            other_code: other.course_code.clone(),
            kind: ConflictKind::TimeOverlap,
            details: format!("تداخل در {slot} و {other_slot}"),
        });
    }

    if let Some((slot, other_slot)) = first_collision(&course.lab_slots, &other.lab_slots) {
        conflicts.push(ScheduleConflict {
            course_code: course.course_code.clone(),
            other_code: other.course_code.clone(),
            kind: ConflictKind::LabOverlap,
            details: format!("تداخل در {slot} و {other_slot}"),
        });
    }

    if let (Some(exam), Some(other_exam)) = (&course.exam_date, &other.exam_date) {
        if exam == other_exam {
            conflicts.push(ScheduleConflict {
                course_code: course.course_code.clone(),
                other_code: other.course_code.clone(),
                kind: ConflictKind::ExamConflict,
                details: format!("امتحان در تاریخ {exam}"),
            });
        }
    }

    conflicts
}
