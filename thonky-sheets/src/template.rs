//! Builders for documents laid out like the team availability template.
//!
//! The template has a "Weekly Schedule" tab, a "Team Availability" roster
//! tab, and one tab per player named after them. Week and player tabs share
//! the same grid placement: day labels in column 1 of rows 2..9, time-block
//! headers in row 1 from column 2, and the 7×6 grid starting at (2, 2).

use chrono::{DateTime, Utc};

use crate::types::{Document, Sheet};

/// Title of the shared week schedule tab.
pub const WEEK_SHEET: &str = "Weekly Schedule";

/// Title of the roster tab.
pub const ROSTER_SHEET: &str = "Team Availability";

/// First roster row that may hold a player.
pub const ROSTER_FIRST_ROW: usize = 3;

/// Default day labels, Monday first.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Activities offered by the sample week's validation rule.
pub const SAMPLE_ACTIVITIES: [&str; 6] = ["Scrim", "Practice", "Tournament", "Free", "Off", "TBD"];

/// Player responses offered by the sample player tabs.
pub const SAMPLE_RESPONSES: [&str; 3] = ["Yes", "Maybe", "No"];

/// Build a week or player tab in the template layout.
///
/// `labels[d]` goes to column 1 of row `2 + d`; the header row gets one
/// `"start-end"` label per block, and `grid[d][b]` lands at `(2 + d, 2 + b)`.
pub fn grid_sheet(
    title: &str,
    labels: &[String; 7],
    start_time: u32,
    block_length: u32,
    grid: &[[&str; 6]; 7],
) -> Sheet {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(9);
    rows.push(vec![String::new(), title.to_string()]);

    let mut header = vec![String::new(), String::new()];
    for block in 0..6 {
        let start = start_time + block * block_length;
        header.push(format!("{start}-{}", start + block_length));
    }
    rows.push(header);

    for (label, day) in labels.iter().zip(grid.iter()) {
        let mut row = vec![String::new(), label.clone()];
        row.extend(day.iter().map(|v| (*v).to_string()));
        rows.push(row);
    }
    Sheet::from_values(title, rows)
}

/// Day labels as they appear on a week tab: `"Monday, 10/14"` and so on.
pub fn dated_labels(dates: &[&str; 7]) -> [String; 7] {
    std::array::from_fn(|d| format!("{}, {}", DAY_NAMES[d], dates[d]))
}

/// Build the roster tab from `(role, name)` pairs, one per row starting at
/// [`ROSTER_FIRST_ROW`]. A blank role continues the group above it.
pub fn roster_sheet(entries: &[(&str, &str)]) -> Sheet {
    let mut rows: Vec<Vec<String>> = vec![
        vec![String::new(), ROSTER_SHEET.to_string()],
        Vec::new(),
        vec![String::new(), "Role".into(), "Name".into()],
    ];
    for (role, name) in entries {
        rows.push(vec![String::new(), (*role).to_string(), (*name).to_string()]);
    }
    Sheet::from_values(ROSTER_SHEET, rows)
}

/// A complete sample document with four players and a partly planned week.
///
/// Roles are `Tanks`, blank, `Tanks`, `DPS`: the second player inherits
/// `Tanks` from the row above.
pub fn sample_document(doc_id: &str, modified: DateTime<Utc>) -> Document {
    let week_grid: [[&str; 6]; 7] = [
        ["Scrim", "Scrim", "Practice", "Free", "Free", "Off"],
        ["Practice", "Practice", "Scrim", "Scrim", "Free", "Off"],
        ["TBD", "TBD", "TBD", "TBD", "TBD", "TBD"],
        ["Scrim", "Scrim", "Scrim", "Free", "Free", "Free"],
        ["Tournament", "Tournament", "Tournament", "Off", "Off", "Off"],
        ["Free", "Free", "Free", "Free", "Free", "Free"],
        ["Off", "Off", "Off", "Off", "Off", "Off"],
    ];
    let labels = dated_labels(&["10/14", "10/15", "10/16", "10/17", "10/18", "10/19", "10/20"]);

    let mut doc = Document::new(doc_id, modified);
    doc.upsert_sheet(grid_sheet(WEEK_SHEET, &labels, 4, 1, &week_grid));
    doc.validations.insert(
        WEEK_SHEET.to_string(),
        SAMPLE_ACTIVITIES.iter().map(|s| (*s).to_string()).collect(),
    );

    let roster = [
        ("Tanks", "Tydra"),
        ("", "Boulder"),
        ("Tanks", "Granite"),
        ("DPS", "Flick"),
    ];
    doc.upsert_sheet(roster_sheet(&roster));

    let plain_labels: [String; 7] = DAY_NAMES.map(String::from);
    for (i, (_, name)) in roster.iter().enumerate() {
        let responses: [[&str; 6]; 7] = std::array::from_fn(|d| {
            std::array::from_fn(|b| SAMPLE_RESPONSES[(i + d + b) % SAMPLE_RESPONSES.len()])
        });
        doc.upsert_sheet(grid_sheet(name, &plain_labels, 4, 1, &responses));
        doc.validations.insert(
            (*name).to_string(),
            SAMPLE_RESPONSES.iter().map(|s| (*s).to_string()).collect(),
        );
    }
    doc
}
