//! Walks one class's rendered table markup into schedule entries.

use scraper::{Html, Selector};

use crate::schedule::{ClassTimetable, ScheduleEntry, WEEKDAY_LABELS};

/// Number of weekday columns carried into the result (Monday..Friday).
const WEEKDAY_SLOTS: usize = 5;
/// Leading rows holding the table caption and the weekday header.
const HEADER_ROWS: usize = 2;
/// Column index of the Saturday cell, present in the markup but unused.
const SATURDAY_COLUMN: usize = 6;

pub(crate) struct Selectors {
    row: Selector,
    cell: Selector,
}

impl Selectors {
    pub(crate) fn new() -> Self {
        Self {
            row: Selector::parse("tr").unwrap(),
            cell: Selector::parse("td").unwrap(),
        }
    }
}

/// Parses the markup the formatting routine produced for one class.
///
/// Rows below the two header rows are periods, in ascending order. Within a
/// row, cell 0 is the period label and cell 6 is Saturday; both are skipped.
/// A cell's first text node is the subject and its last the teacher; a cell
/// with a single text node yields that text for both, and missing text
/// degrades to empty strings rather than aborting the table.
pub(crate) fn class_timetable(
    selectors: &Selectors,
    markup: &str,
    grade: u32,
    class_number: u32,
) -> ClassTimetable {
    let document = Html::parse_fragment(markup);
    let mut timetable: ClassTimetable = vec![Vec::new(); WEEKDAY_SLOTS];

    for (row_idx, row) in document.select(&selectors.row).enumerate() {
        if row_idx < HEADER_ROWS {
            continue;
        }
        let period = (row_idx - HEADER_ROWS + 1) as u32;

        for (cell_idx, cell) in row.select(&selectors.cell).enumerate() {
            if cell_idx == 0 || cell_idx >= SATURDAY_COLUMN {
                continue;
            }
            let texts: Vec<&str> = cell.text().collect();
            let subject = texts.first().copied().unwrap_or_default().to_string();
            let teacher = texts.last().copied().unwrap_or_default().to_string();

            timetable[cell_idx - 1].push(ScheduleEntry {
                grade,
                class_number,
                weekday: (cell_idx - 1) as u32,
                weekday_label: WEEKDAY_LABELS[cell_idx].to_string(),
                period,
                subject,
                teacher,
            });
        }
    }

    timetable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_row(period: u32) -> String {
        let cells: String = ["월", "화", "수", "목", "금"]
            .iter()
            .map(|day| format!("<td>{day}과목{period}<br>{day}교사{period}</td>"))
            .collect();
        format!("<tr><td>{period}교시</td>{cells}<td>토요일무시</td></tr>")
    }

    fn table(periods: u32) -> String {
        let rows: String = (1..=periods).map(data_row).collect();
        format!(
            "<table><tr><td>1학년 1반</td></tr>\
             <tr><td>요일</td><td>월</td><td>화</td><td>수</td><td>목</td><td>금</td><td>토</td></tr>\
             {rows}</table>"
        )
    }

    #[test]
    fn parses_all_weekdays_and_periods() {
        let selectors = Selectors::new();
        let timetable = class_timetable(&selectors, &table(3), 1, 2);

        assert_eq!(timetable.len(), 5);
        for (weekday, entries) in timetable.iter().enumerate() {
            assert_eq!(entries.len(), 3, "weekday {weekday}");
            for (i, entry) in entries.iter().enumerate() {
                assert_eq!(entry.period, i as u32 + 1);
                assert_eq!(entry.grade, 1);
                assert_eq!(entry.class_number, 2);
                assert_eq!(entry.weekday, weekday as u32);
                assert_eq!(entry.weekday_label, WEEKDAY_LABELS[weekday + 1]);
            }
        }

        let monday_first = &timetable[0][0];
        assert_eq!(monday_first.subject, "월과목1");
        assert_eq!(monday_first.teacher, "월교사1");
        let friday_last = &timetable[4][2];
        assert_eq!(friday_last.subject, "금과목3");
        assert_eq!(friday_last.teacher, "금교사3");
    }

    #[test]
    fn skips_label_and_saturday_cells() {
        let selectors = Selectors::new();
        let timetable = class_timetable(&selectors, &table(1), 1, 1);
        for entries in &timetable {
            for entry in entries {
                assert!(!entry.subject.contains("교시"));
                assert!(!entry.subject.contains("토요일"));
            }
        }
    }

    #[test]
    fn single_text_node_yields_subject_as_teacher() {
        let selectors = Selectors::new();
        let markup = "<table><tr></tr><tr></tr>\
            <tr><td>label</td><td>자습</td></tr></table>";
        let timetable = class_timetable(&selectors, markup, 3, 4);
        let entry = &timetable[0][0];
        assert_eq!(entry.subject, "자습");
        assert_eq!(entry.teacher, "자습");
        assert!(timetable[1].is_empty());
    }

    #[test]
    fn empty_cell_degrades_to_empty_strings() {
        let selectors = Selectors::new();
        let markup = "<table><tr></tr><tr></tr>\
            <tr><td>label</td><td></td><td>수학<br>김</td></tr></table>";
        let timetable = class_timetable(&selectors, markup, 1, 1);
        assert_eq!(timetable[0][0].subject, "");
        assert_eq!(timetable[0][0].teacher, "");
        assert_eq!(timetable[1][0].subject, "수학");
        assert_eq!(timetable[1][0].teacher, "김");
    }

    #[test]
    fn short_rows_leave_later_weekdays_sparse() {
        let selectors = Selectors::new();
        let markup = "<table><tr></tr><tr></tr>\
            <tr><td>1</td><td>국어<br>박</td></tr>\
            <tr><td>2</td><td>체육<br>이</td><td>음악<br>최</td></tr></table>";
        let timetable = class_timetable(&selectors, markup, 2, 3);
        assert_eq!(timetable[0].len(), 2);
        assert_eq!(timetable[0][0].period, 1);
        assert_eq!(timetable[0][1].period, 2);
        assert_eq!(timetable[1].len(), 1);
        assert_eq!(timetable[1][0].period, 2);
        assert!(timetable[2].is_empty());
    }
}
