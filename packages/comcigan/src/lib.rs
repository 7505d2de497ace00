//! Client for the Comcigan school timetable portal.
//!
//! The portal has no stable API; endpoint paths, request parameters and the
//! response formatting logic are all discovered by scraping its pages at
//! runtime. See [`Timetable`] for the staged lifecycle.

pub mod client;
pub mod error;
pub mod schedule;

mod eval;
mod extract;
mod parse;

pub use client::{SchoolMatch, Timetable, TimetableOptions};
pub use error::{Error, Identifier};
pub use schedule::{ClassTimetable, ScheduleEntry, WeeklySchedule};
