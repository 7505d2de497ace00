use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Localized weekday labels, indexed Sunday through Saturday as the portal
/// lays out its table columns.
pub const WEEKDAY_LABELS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// One lesson slot of a class's weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub grade: u32,
    #[serde(rename = "class")]
    pub class_number: u32,
    /// 0 = Monday .. 4 = Friday. Saturday and Sunday are never emitted.
    pub weekday: u32,
    pub weekday_label: String,
    /// 1-based period within the day.
    pub period: u32,
    pub subject: String,
    pub teacher: String,
}

/// One class's week: outer index is the weekday slot (Monday first), inner
/// list is ascending by period. Periods with no lesson are simply absent.
pub type ClassTimetable = Vec<Vec<ScheduleEntry>>;

/// grade -> class number -> weekly timetable.
pub type WeeklySchedule = BTreeMap<u32, BTreeMap<u32, ClassTimetable>>;
