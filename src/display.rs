use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::str::FromStr;

use crate::error::{Result, RosterError};
use crate::roster::{fire_roster, name_order, Day};
use crate::schedule::Catalog;
use crate::state::Roster;

/// Separates printed pages
pub const PAGE_BREAK: char = '\u{0c}';
const EMPTY_SLOT: &str = "---";

/// The printable reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Tasks per day plus the cleaning page
    Duties,
    /// Head count per house and room for one day
    Fire(Day),
    /// Every student with a box to tick
    RollCall,
}

impl FromStr for Layout {
    type Err = RosterError;

    /// "duties", "rollcall", or "fire" with an optional day ("fire:saturday")
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.split_once(':') {
            Some(("fire", day)) => Ok(Layout::Fire(day.parse()?)),
            None if lower == "fire" => Ok(Layout::Fire(Day::today())),
            None if lower == "duties" || lower == "main" => Ok(Layout::Duties),
            None if lower == "rollcall" || lower == "sunday" => Ok(Layout::RollCall),
            _ => Err(RosterError::UnknownLayout(s.to_string())),
        }
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
    out.push('\n');
}

fn slot_names(roster: &Roster, assigned: Option<&Vec<String>>, separator: &str) -> String {
    let names: Vec<String> = assigned
        .map(|ids| ids.iter().map(|id| roster.display_name(id)).collect())
        .unwrap_or_default();
    if names.is_empty() {
        EMPTY_SLOT.to_string()
    } else {
        names.join(separator)
    }
}

/// One page per day of tasks, then a cleaning page
pub fn render_duty_roster(roster: &Roster, catalog: &Catalog) -> String {
    let mut pages = Vec::new();

    for day in Day::ALL {
        let mut page = String::new();
        heading(&mut page, &format!("Duties - {} (Week {})", day, roster.weekend_num));
        for slot in catalog.tasks_on(day) {
            let names = slot_names(roster, roster.task_assignments.get(&slot.id), " & ");
            let _ = writeln!(page, "{:<24} {}", slot.short_label(), names);
        }
        pages.push(page);
    }

    let mut page = String::new();
    heading(&mut page, &format!("Cleaning (Week {})", roster.weekend_num));
    for slot in &catalog.cleaning {
        let names = slot_names(roster, roster.cleaning_assignments.get(&slot.id), ", ");
        let _ = writeln!(page, "{:<30} {}", slot.label, names);
    }
    pages.push(page);

    pages.join(&PAGE_BREAK.to_string())
}

/// One page per house with the head count and who sleeps in which room on `day`
pub fn render_fire_roster(roster: &Roster, day: Day) -> String {
    let pages: Vec<String> = fire_roster(&roster.students, day)
        .iter()
        .map(|house| {
            let mut page = String::new();
            heading(&mut page, &format!("Fire roster - {}", day));
            let _ = writeln!(page, "{}  ({})", house.house, house.count());
            for room in &house.rooms {
                let _ = writeln!(page, "\n  Room {}", room.room);
                for student in &room.students {
                    let _ = writeln!(page, "    {}", student.full_name());
                }
            }
            page
        })
        .collect();
    pages.join(&PAGE_BREAK.to_string())
}

/// Every student by first name with house, room and a check box
pub fn render_roll_call(roster: &Roster) -> String {
    let mut students: Vec<_> = roster.students.iter().collect();
    students.sort_by(|a, b| name_order(&a.first_name, &b.first_name));

    let mut page = String::new();
    heading(&mut page, &format!("Sunday list - Week {}", roster.weekend_num));
    for s in students {
        let _ = writeln!(page, "[ ] {:<30} {} - {}", s.full_name(), s.house, s.room);
    }
    page
}

pub fn render(layout: Layout, roster: &Roster, catalog: &Catalog) -> String {
    match layout {
        Layout::Duties => render_duty_roster(roster, catalog),
        Layout::Fire(day) => render_fire_roster(roster, day),
        Layout::RollCall => render_roll_call(roster),
    }
}

/// Writes a rendered report to `filename`
pub fn write_report_to_file(report: &str, filename: &str) -> Result<()> {
    let mut file = File::create(filename)?;
    file.write_all(report.as_bytes())?;
    Ok(())
}
