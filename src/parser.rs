use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::error::{Result, RosterError};
use crate::roster::{StayType, Student};

/// House used when the sheet has no house column or the cell is empty
pub const UNKNOWN_HOUSE: &str = "Ukendt";
/// Room used when the sheet has no room column or the cell is empty
pub const UNKNOWN_ROOM: &str = "??";

const FIRST_NAME: [&str; 2] = ["fornavn", "first name"];
const LAST_NAME: [&str; 2] = ["efternavn", "last name"];
const ROOM: [&str; 2] = ["værelse", "room"];
const HOUSE: [&str; 3] = ["house", "gang", "hus"];
const PRESENCE: [&str; 3] = ["weekend", "til stede", "status"];

/// Finds the first header containing any of `names` (headers are lowercased already)
fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.iter().any(|n| h.contains(n)))
}

/// Keeps the part of a cell before any "," or "(" note
fn clean_value(value: &str) -> &str {
    value.split(',').next().unwrap_or("").split('(').next().unwrap_or("").trim()
}

/// Reads the weekend column: "hele weekenden", "ja", "1" and friends mean a full stay
fn parse_stay(value: &str) -> StayType {
    let lower = value.trim().to_lowercase();
    if lower.contains("hele") || matches!(lower.as_str(), "ja" | "1" | "yes" | "full" | "true") {
        StayType::Full
    } else {
        StayType::None
    }
}

/// Spreadsheet exports use ";" in some locales; pick whichever the header line uses more
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn cell<'r>(record: &'r StringRecord, column: Option<usize>) -> &'r str {
    column.and_then(|c| record.get(c)).unwrap_or("")
}

/// Parses a roster spreadsheet exported as CSV.
///
/// The first row is the header. Columns are located by case-insensitive
/// substring match, so "Fornavn", "First name (legal)" and similar all work.
/// Only the first name column is required; rows without a first name are skipped.
/// Every student gets a fresh id stamped with `batch` so a re-import never
/// collides with ids from an earlier one.
pub fn parse_students(content: &str, batch: i64) -> Result<Vec<Student>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniff_delimiter(content))
        .from_reader(content.as_bytes());

    // Lowercase headers once, dropping a UTF-8 BOM from spreadsheet exports
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    // Only the first name column is mandatory
    let first_col = find_column(&headers, &FIRST_NAME).ok_or(RosterError::MissingColumn("first name"))?;
    let last_col = find_column(&headers, &LAST_NAME);
    let room_col = find_column(&headers, &ROOM);
    let house_col = find_column(&headers, &HOUSE);
    let presence_col = find_column(&headers, &PRESENCE);

    let mut students = Vec::new();
    let mut rows = 0usize;

    for result in reader.records() {
        let record = result?;
        rows += 1;

        let first_name = cell(&record, Some(first_col)).trim();
        if first_name.is_empty() {
            continue;
        }

        // Fill in placeholders for blank house and room cells
        let house = match clean_value(cell(&record, house_col)) {
            "" => UNKNOWN_HOUSE,
            h => h,
        };
        let room = match clean_value(cell(&record, room_col)) {
            "" => UNKNOWN_ROOM,
            r => r,
        };
        let stay_type = parse_stay(cell(&record, presence_col));

        students.push(Student::new(
            format!("std-{}-{}", batch, students.len()),
            first_name,
            cell(&record, last_col).trim(),
            house,
            room,
            stay_type,
        ));
    }

    // A header with no rows is an empty export, not an empty roster
    if rows == 0 {
        return Err(RosterError::EmptySheet);
    }

    info!(rows, students = students.len(), "parsed roster spreadsheet");
    Ok(students)
}

/// Loads a roster from a CSV file on disk
pub fn load_students<P: AsRef<Path>>(csv_path: P) -> Result<Vec<Student>> {
    let content = std::fs::read_to_string(csv_path)?;
    parse_students(&content, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_danish_headers_and_cleans_cells() {
        let csv = "Fornavn,Efternavn,Værelse,Gang,Weekend status\n\
                   Anna,Berg,\"12, vindue\",Nord (gl.),Hele weekenden\n\
                   Bo,Holm,3,Syd,Nej\n";
        let students = parse_students(csv, 1).unwrap();
        assert_eq!(students.len(), 2);

        let anna = &students[0];
        assert_eq!(anna.id, "std-1-0");
        assert_eq!(anna.full_name(), "Anna Berg");
        assert_eq!(anna.room, "12");
        assert_eq!(anna.house, "Nord");
        assert_eq!(anna.stay_type, StayType::Full);
        assert!(anna.is_present);
        assert!(!anna.is_kitchen_duty);

        let bo = &students[1];
        assert_eq!(bo.stay_type, StayType::None);
        assert!(!bo.is_present);
    }

    #[test]
    fn english_headers_semicolons_and_defaults() {
        let csv = "First Name;Last Name;Status\nMaja;Lund;yes\n;Nobody;1\nEmil;;\n";
        let students = parse_students(csv, 9).unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].house, UNKNOWN_HOUSE);
        assert_eq!(students[0].room, UNKNOWN_ROOM);
        assert!(students[0].is_present);
        assert_eq!(students[1].id, "std-9-1");
        assert!(!students[1].is_present);
    }

    #[test]
    fn missing_first_name_column_is_an_error() {
        let err = parse_students("Surname,Room\nBerg,1\n", 1).unwrap_err();
        assert!(matches!(err, RosterError::MissingColumn("first name")));
    }

    #[test]
    fn header_only_sheet_is_an_error() {
        let err = parse_students("Fornavn,Efternavn\n", 1).unwrap_err();
        assert!(matches!(err, RosterError::EmptySheet));
    }

    #[test]
    fn stay_values() {
        assert_eq!(parse_stay("Hele weekenden"), StayType::Full);
        assert_eq!(parse_stay(" JA "), StayType::Full);
        assert_eq!(parse_stay("1"), StayType::Full);
        assert_eq!(parse_stay("lørdag"), StayType::None);
        assert_eq!(parse_stay(""), StayType::None);
    }
}
