use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::sheets::{ApiError, SheetsClient, Transport};
use crate::types::{ExerciseEntry, NamedRangeLocation, SetEntry};

/// Sheet layout, per row after the sentinel column is dropped:
/// name, set count, (blank), repetitions, RIR, Série 1-4, method, video link.
const NAME_CELL: usize = 0;
const SET_COUNT_CELL: usize = 1;
const REPETITIONS_CELL: usize = 3;
const RIR_CELL: usize = 4;
const MULTISET_CELL: usize = 9;
const VIDEO_CELL: usize = 10;

/// First "Série" cell and how many the sheet reserves.
const SET_CELLS_START: usize = 5;
pub const SET_SLOT_COUNT: usize = 4;

/// Columns of a named range before "Série 1": sentinel, name, set count,
/// blank, repetitions, RIR.
const SET_COLUMN_OFFSET: u32 = 6;
/// The named range includes its header row; data rows are 1-based below it.
const DATA_ROW_OFFSET: u32 = 2;

/// Header rows repeat the column label in the name cell.
const HEADER_LABEL: &str = "Exercice";

fn set_cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)/(\d+(?:\.\d+)?)kg").expect("valid regex"))
}

fn week_title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)semaine\s*(\d+)").expect("valid regex"))
}

/// Week number of a sheet tab, for titles like `semaine 3`. Tabs that do
/// not follow the convention are not selectable weeks.
pub fn week_number_from_title(title: &str) -> Option<u32> {
    week_title_pattern()
        .captures(title)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Parses a `"12/7.5kg"` cell. Anything else yields no entry, so partially
/// filled sheets load without errors.
pub fn decode_set_cell(cell: &str) -> Option<SetEntry> {
    let captures = set_cell_pattern().captures(cell)?;
    let count = captures.get(1)?.as_str().parse().ok()?;
    let weight = captures.get(2)?.as_str().parse().ok()?;
    Some(SetEntry::filled(count, weight))
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight:.1}")
    }
}

/// A set only serializes once both fields are filled in and non-zero;
/// everything else stays an empty cell.
pub fn encode_set_cell(set: &SetEntry) -> String {
    match (set.count, set.weight) {
        (Some(count), Some(weight)) if count != 0 && weight != 0.0 => {
            format!("{count}/{}kg", format_weight(weight))
        }
        _ => String::new(),
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn decode_row_sets(row: &[String]) -> Vec<SetEntry> {
    (SET_CELLS_START..SET_CELLS_START + SET_SLOT_COUNT)
        .filter_map(|index| decode_set_cell(cell(row, index)))
        .collect()
}

/// Drops the sentinel column and removes header and blank rows.
fn data_rows(grid: Vec<Vec<String>>) -> Vec<Vec<String>> {
    grid.into_iter()
        .map(|row| row.into_iter().skip(1).collect::<Vec<_>>())
        .filter(|row| {
            let name = cell(row, NAME_CELL);
            !name.is_empty() && name != HEADER_LABEL
        })
        .collect()
}

fn placeholder_at(previous_sets: Option<&Vec<SetEntry>>, index: usize) -> SetEntry {
    let recorded = previous_sets.and_then(|sets| sets.get(index));
    // Zero values from the previous week hint nothing.
    SetEntry {
        count: recorded.and_then(|s| s.count).filter(|&c| c != 0),
        weight: recorded.and_then(|s| s.weight).filter(|&w| w != 0.0),
    }
}

/// Maps raw range grids to exercise records. `previous` is the prior week's
/// grid; its decoded sets become index-aligned placeholders for rows whose
/// exercise name matches.
pub fn rows_to_entries(
    current: Vec<Vec<String>>,
    previous: Option<Vec<Vec<String>>>,
) -> Vec<ExerciseEntry> {
    let previous_sets: HashMap<String, Vec<SetEntry>> = previous
        .map(|grid| {
            data_rows(grid)
                .into_iter()
                .map(|row| (cell(&row, NAME_CELL).to_string(), decode_row_sets(&row)))
                .collect()
        })
        .unwrap_or_default();

    data_rows(current)
        .into_iter()
        .map(|row| {
            let name = cell(&row, NAME_CELL).to_string();
            let slot_count: usize = cell(&row, SET_COUNT_CELL).parse().unwrap_or(0);
            let recorded = decode_row_sets(&row);
            let hints = previous_sets.get(&name);

            ExerciseEntry {
                sets: (0..slot_count)
                    .map(|index| recorded.get(index).copied().unwrap_or_else(SetEntry::empty))
                    .collect(),
                set_placeholders: (0..slot_count)
                    .map(|index| placeholder_at(hints, index))
                    .collect(),
                repetitions: cell(&row, REPETITIONS_CELL).to_string(),
                rir: cell(&row, RIR_CELL).to_string(),
                multiset: cell(&row, MULTISET_CELL).to_string(),
                youtube_link: cell(&row, VIDEO_CELL).to_string(),
                exercise: name,
            }
        })
        .collect()
}

/// One output row per record, one cell per set slot of that record.
pub fn entries_to_rows(entries: &[ExerciseEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|entry| entry.sets.iter().map(encode_set_cell).collect())
        .collect()
}

pub fn range_name(week: u32, group: &str) -> String {
    format!("semaine{week}_{group}")
}

pub fn week_sheet_title(week: u32) -> String {
    format!("semaine {week}")
}

/// Zero-based column index to its spreadsheet letter(s).
pub fn column_letter(index: u32) -> String {
    let mut letters = Vec::new();
    let mut remaining = index;
    loop {
        letters.push(char::from(b'A' + (remaining % 26) as u8));
        if remaining < 26 {
            break;
        }
        remaining = remaining / 26 - 1;
    }
    letters.into_iter().rev().collect()
}

/// Absolute A1 target of the first set cell of the first data row.
pub fn write_target(week: u32, location: &NamedRangeLocation) -> String {
    let column = column_letter(location.start_column + SET_COLUMN_OFFSET);
    let row = location.start_row + DATA_ROW_OFFSET;
    format!("'{}'!{column}{row}", week_sheet_title(week))
}

/// Reads the week/group range (and the previous week's when there is one)
/// and maps it to exercise records.
pub async fn load_exercises<T: Transport>(
    client: &SheetsClient<T>,
    spreadsheet_id: &str,
    week: u32,
    group: &str,
) -> Result<Vec<ExerciseEntry>, ApiError> {
    let current = client.read_range(spreadsheet_id, &range_name(week, group)).await?;

    let previous = if week > 1 {
        Some(client.read_range(spreadsheet_id, &range_name(week - 1, group)).await?)
    } else {
        None
    };

    Ok(rows_to_entries(current, previous))
}

/// Writes every record's set cells back under the week/group named range.
/// A missing named range means the sheet was never provisioned for this
/// selection: the save is skipped and the condition logged.
pub async fn save_exercises<T: Transport>(
    client: &SheetsClient<T>,
    spreadsheet_id: &str,
    week: u32,
    group: &str,
    entries: &[ExerciseEntry],
) -> Result<(), ApiError> {
    let range = range_name(week, group);

    let Some(location) = client.named_range_location(spreadsheet_id, &range).await? else {
        crate::log::error(&format!("Plage nommée non trouvée: {range}"));
        return Ok(());
    };

    let rows = entries_to_rows(entries);
    client
        .write_range(spreadsheet_id, &write_target(week, &location), &rows)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::testing::FakeTransport;
    use crate::storage::Store;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn client<'a>(transport: &'a FakeTransport) -> SheetsClient<&'a FakeTransport> {
        let store = Store::in_memory();
        store.set_access_token("mock-access-token");
        SheetsClient::new(transport, store, Rc::new(|| {}))
    }

    #[test]
    fn set_cell_round_trip() {
        let set = SetEntry::filled(12, 7.5);
        let encoded = encode_set_cell(&set);
        assert_eq!(encoded, "12/7.5kg");
        assert_eq!(decode_set_cell(&encoded), Some(set));
    }

    #[test]
    fn integral_weights_encode_without_a_fraction() {
        assert_eq!(encode_set_cell(&SetEntry::filled(10, 5.0)), "10/5kg");
        assert_eq!(decode_set_cell("10/5kg"), Some(SetEntry::filled(10, 5.0)));
    }

    #[test]
    fn empty_or_zero_sets_encode_to_nothing() {
        assert_eq!(encode_set_cell(&SetEntry::empty()), "");
        assert_eq!(encode_set_cell(&SetEntry { count: Some(12), weight: None }), "");
        assert_eq!(encode_set_cell(&SetEntry::filled(0, 10.0)), "");
        assert_eq!(encode_set_cell(&SetEntry::filled(12, 0.0)), "");
        assert_eq!(decode_set_cell(""), None);
    }

    #[test]
    fn malformed_cells_are_skipped() {
        assert_eq!(decode_set_cell("beaucoup"), None);
        assert_eq!(decode_set_cell("12-7.5kg"), None);
        assert_eq!(decode_set_cell("12/7.5"), None);
    }

    #[test]
    fn maps_a_full_row_to_a_record() {
        let grid = vec![row(&[
            "",
            "Ecarté poulie basse",
            "2",
            "",
            "10-15",
            "2",
            "12/7.5kg",
            "13/7.5kg",
            "",
            "",
            "Superset",
            "https://youtube.com",
        ])];

        let entries = rows_to_entries(grid, None);

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.exercise, "Ecarté poulie basse");
        assert_eq!(entry.repetitions, "10-15");
        assert_eq!(entry.rir, "2");
        assert_eq!(entry.multiset, "Superset");
        assert_eq!(entry.youtube_link, "https://youtube.com");
        assert_eq!(
            entry.sets,
            vec![SetEntry::filled(12, 7.5), SetEntry::filled(13, 7.5)]
        );
    }

    #[test]
    fn skips_header_and_blank_rows() {
        let grid = vec![
            row(&["", "Exercice", "Séries", "", "Répétitions", "Intensité (RIR)", "Série 1"]),
            row(&["", "", "", "", "", "", ""]),
            row(&["", "Ecarté poulie basse", "2", "", "10-15", "2", "12/7.5kg", "13/7.5kg"]),
        ];

        let entries = rows_to_entries(grid, None);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].exercise, "Ecarté poulie basse");
    }

    #[test]
    fn set_slots_follow_the_declared_count() {
        // Three declared slots, one recorded set: the rest stay empty.
        let grid = vec![row(&["", "Squat", "3", "", "5-8", "1", "5/100kg"])];

        let entries = rows_to_entries(grid, None);

        assert_eq!(
            entries[0].sets,
            vec![SetEntry::filled(5, 100.0), SetEntry::empty(), SetEntry::empty()]
        );
        assert_eq!(entries[0].set_placeholders.len(), 3);
    }

    #[test]
    fn unparsable_set_count_means_no_slots() {
        let grid = vec![row(&["", "Squat", "beaucoup", "", "5-8", "1", "5/100kg"])];
        let entries = rows_to_entries(grid, None);
        assert!(entries[0].sets.is_empty());
    }

    #[test]
    fn placeholders_come_from_the_previous_week() {
        let current = vec![row(&["", "Exercice Test", "2", "", "10-12", "2", "", ""])];
        let previous = vec![row(&["", "Exercice Test", "2", "", "10-12", "2", "10/5kg", "12/5kg"])];

        let entries = rows_to_entries(current, Some(previous));

        assert_eq!(
            entries[0].set_placeholders,
            vec![SetEntry::filled(10, 5.0), SetEntry::filled(12, 5.0)]
        );
        assert_eq!(entries[0].sets, vec![SetEntry::empty(), SetEntry::empty()]);
    }

    #[test]
    fn placeholders_stay_empty_for_unknown_exercises() {
        let current = vec![row(&["", "Nouveau mouvement", "2", "", "10-12", "2", "", ""])];
        let previous = vec![row(&["", "Autre exercice", "2", "", "10-12", "2", "10/5kg", ""])];

        let entries = rows_to_entries(current, Some(previous));

        assert_eq!(
            entries[0].set_placeholders,
            vec![SetEntry::empty(), SetEntry::empty()]
        );
    }

    #[test]
    fn encodes_one_row_per_record() {
        let entries = vec![ExerciseEntry {
            exercise: "Exercice 1".to_string(),
            sets: vec![SetEntry::filled(12, 10.0), SetEntry::empty()],
            ..ExerciseEntry::default()
        }];

        assert_eq!(entries_to_rows(&entries), vec![vec!["12/10kg".to_string(), String::new()]]);
    }

    #[test]
    fn week_numbers_come_from_matching_tab_titles() {
        assert_eq!(week_number_from_title("semaine 1"), Some(1));
        assert_eq!(week_number_from_title("Semaine12"), Some(12));
        assert_eq!(week_number_from_title("SEMAINE  3"), Some(3));
        assert_eq!(week_number_from_title("récap"), None);
        assert_eq!(week_number_from_title("semaine"), None);
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(6), "G");
        assert_eq!(column_letter(8), "I");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn write_target_offsets_past_the_fixed_columns() {
        let location =
            NamedRangeLocation { start_row: 1, start_column: 2, end_row: 21, end_column: 12 };
        assert_eq!(write_target(1, &location), "'semaine 1'!I3");

        let origin = NamedRangeLocation::default();
        assert_eq!(write_target(1, &origin), "'semaine 1'!G2");
    }

    #[test]
    fn load_reads_the_week_range() {
        let transport = FakeTransport::default().respond_with(
            200,
            r#"{"values":[["","Ecarté poulie basse","2","","10-15","2","12/7.5kg","13/7.5kg","","","Superset","https://youtube.com"],["","Pec / Deck machine","2","","10-15","2","15/10kg","12/10kg","","","",""]]}"#,
        );
        let client = client(&transport);

        let entries =
            block_on(load_exercises(&client, "spreadsheet-id", 1, "HautDuCorps")).unwrap();

        assert_eq!(transport.request_count(), 1);
        assert!(transport.request(0).url.ends_with("/values/semaine1_HautDuCorps"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].exercise, "Ecarté poulie basse");
        assert_eq!(entries[1].sets[0], SetEntry::filled(15, 10.0));
    }

    #[test]
    fn load_pulls_placeholders_from_the_previous_week_range() {
        let transport = FakeTransport::default()
            .respond_with(
                200,
                r#"{"values":[["","Exercice Test","2","","10-12","2","","","","","",""]]}"#,
            )
            .respond_with(
                200,
                r#"{"values":[["","Exercice Test","2","","10-12","2","10/5kg","12/5kg","","","",""]]}"#,
            );
        let client = client(&transport);

        let entries =
            block_on(load_exercises(&client, "spreadsheet-id", 2, "HautDuCorps")).unwrap();

        assert_eq!(transport.request_count(), 2);
        assert!(transport.request(0).url.ends_with("/values/semaine2_HautDuCorps"));
        assert!(transport.request(1).url.ends_with("/values/semaine1_HautDuCorps"));
        assert_eq!(
            entries[0].set_placeholders,
            vec![SetEntry::filled(10, 5.0), SetEntry::filled(12, 5.0)]
        );
    }

    #[test]
    fn load_of_an_empty_range_yields_no_records() {
        let transport = FakeTransport::default().respond_with(200, "{}");
        let client = client(&transport);

        let entries =
            block_on(load_exercises(&client, "spreadsheet-id", 1, "HautDuCorps")).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn save_writes_at_the_resolved_location() {
        let transport = FakeTransport::default()
            .respond_with(
                200,
                r#"{"namedRanges":[{"name":"semaine1_HautDuCorps","range":{"startRowIndex":1,"startColumnIndex":2,"endRowIndex":21,"endColumnIndex":12}}]}"#,
            )
            .respond_with(200, "{}");
        let client = client(&transport);
        let entries = vec![ExerciseEntry {
            exercise: "Exercice 1".to_string(),
            sets: vec![SetEntry::filled(12, 10.0), SetEntry::filled(10, 12.5)],
            ..ExerciseEntry::default()
        }];

        block_on(save_exercises(&client, "spreadsheet-id", 1, "HautDuCorps", &entries)).unwrap();

        assert_eq!(transport.request_count(), 2);
        let write = transport.request(1);
        assert_eq!(write.method, "PUT");
        assert!(write.url.contains("/values/'semaine 1'!I3?valueInputOption=RAW"));
        assert_eq!(
            write.body.as_deref(),
            Some(r#"{"values":[["12/10kg","10/12.5kg"]]}"#)
        );
    }

    #[test]
    fn save_keeps_empty_slots_as_empty_cells() {
        let transport = FakeTransport::default()
            .respond_with(
                200,
                r#"{"namedRanges":[{"name":"semaine1_HautDuCorps","range":{"startRowIndex":1,"startColumnIndex":2,"endRowIndex":21,"endColumnIndex":12}}]}"#,
            )
            .respond_with(200, "{}");
        let client = client(&transport);
        let entries = vec![ExerciseEntry {
            exercise: "Exercice 1".to_string(),
            sets: vec![SetEntry::filled(12, 10.0), SetEntry::empty()],
            ..ExerciseEntry::default()
        }];

        block_on(save_exercises(&client, "spreadsheet-id", 1, "HautDuCorps", &entries)).unwrap();

        assert_eq!(
            transport.request(1).body.as_deref(),
            Some(r#"{"values":[["12/10kg",""]]}"#)
        );
    }

    #[test]
    fn save_without_a_named_range_is_a_silent_skip() {
        let transport = FakeTransport::default().respond_with(200, "{}");
        let client = client(&transport);
        let entries = vec![ExerciseEntry {
            exercise: "Exercice 1".to_string(),
            sets: vec![SetEntry::filled(12, 10.0)],
            ..ExerciseEntry::default()
        }];

        let result =
            block_on(save_exercises(&client, "spreadsheet-id", 1, "HautDuCorps", &entries));

        assert!(result.is_ok());
        // Only the metadata lookup went out; no write followed.
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn save_resolves_the_origin_location() {
        let transport = FakeTransport::default()
            .respond_with(
                200,
                r#"{"namedRanges":[{"name":"semaine1_HautDuCorps","range":{"startRowIndex":0,"startColumnIndex":0,"endRowIndex":20,"endColumnIndex":10}}]}"#,
            )
            .respond_with(200, "{}");
        let client = client(&transport);
        let entries = vec![ExerciseEntry {
            exercise: "Exercice 1".to_string(),
            sets: vec![SetEntry::filled(10, 5.0)],
            ..ExerciseEntry::default()
        }];

        block_on(save_exercises(&client, "spreadsheet-id", 1, "HautDuCorps", &entries)).unwrap();

        assert!(transport.request(1).url.contains("/values/'semaine 1'!G2?valueInputOption=RAW"));
        assert_eq!(transport.request(1).body.as_deref(), Some(r#"{"values":[["10/5kg"]]}"#));
    }
}
