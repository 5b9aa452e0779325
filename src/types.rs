use serde::{Deserialize, Serialize};

/// One set slot of an exercise row. `None` fields render as empty inputs.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub count: Option<u32>,
    pub weight: Option<f64>,
}

impl SetEntry {
    pub fn empty() -> Self {
        Self { count: None, weight: None }
    }

    pub fn filled(count: u32, weight: f64) -> Self {
        Self { count: Some(count), weight: Some(weight) }
    }
}

/// One spreadsheet row under a week/group named range.
/// Rebuilt from the sheet on every navigation, written back on autosave.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExerciseEntry {
    pub exercise: String,
    pub sets: Vec<SetEntry>,
    /// Previous week's recorded sets, shown as input hints only.
    pub set_placeholders: Vec<SetEntry>,
    pub repetitions: String,
    pub rir: String,
    pub multiset: String,
    pub youtube_link: String,
}

impl ExerciseEntry {
    /// Blank card appended by the "add exercise" button.
    pub fn blank() -> Self {
        Self {
            sets: vec![SetEntry::empty(), SetEntry::empty()],
            set_placeholders: vec![SetEntry::empty(), SetEntry::empty()],
            ..Self::default()
        }
    }
}

/// Grid coordinates of a named range, zero-based and end-exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NamedRangeLocation {
    pub start_row: u32,
    pub start_column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

/// One tab of the spreadsheet, from the metadata endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetTab {
    pub title: String,
    pub sheet_id: i64,
}

/// Identity from the userinfo endpoint, display only.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GoogleUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppView {
    Auth,
    Configure,
    Program { week: u32 },
}
