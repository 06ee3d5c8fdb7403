use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::types::{name_order, Student, LOCATION_DELIMITER};

/// Room bucket for locations that carry no room part (common areas, custom text)
pub const COMMON_ROOM: &str = "Common";

/// Shared sleeping areas offered for every student
pub const COMMON_SLEEPING_AREAS: [&str; 5] = ["Teltet", "Shelteret", "Gymnastiksalen", "Medie", "Biografen"];

/// Extracts the first run of digits in a room label, 0 when there is none
fn room_number(room: &str) -> u64 {
    room.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .fold(0u64, |n, c| n.saturating_mul(10).saturating_add(u64::from(c as u8 - b'0')))
}

/// Numeric-aware room ordering: "2" before "10", ties broken lexically ("1" < "1B")
pub fn room_order(a: &str, b: &str) -> Ordering {
    room_number(a).cmp(&room_number(b)).then_with(|| a.cmp(b))
}

/// Splits a location label into (house, room).
///
/// A label without the delimiter is taken as a house on its own and lands in
/// the [`COMMON_ROOM`] bucket.
pub fn split_location(label: &str) -> (&str, &str) {
    match label.split_once(LOCATION_DELIMITER) {
        Some((house, room)) => (house, room),
        None => (label, COMMON_ROOM),
    }
}

/// A (house, room) pair that appears somewhere on the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownRoom {
    pub house: String,
    pub room: String,
}

impl KnownRoom {
    pub fn label(&self) -> String {
        format!("{}{}{}", self.house, LOCATION_DELIMITER, self.room)
    }
}

/// The sleeping places a student can be moved to, in the order they are offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChoices {
    pub own_room: String,
    /// Other rooms in the student's own house
    pub house_rooms: Vec<String>,
    pub common_areas: Vec<String>,
    /// Every known room matching the search text
    pub all_rooms: Vec<KnownRoom>,
}

/// Rooms in `student`'s house other than their own, in room order
pub fn other_rooms_in_house(students: &[Student], student: &Student) -> Vec<String> {
    let rooms: BTreeSet<&str> = students
        .iter()
        .filter(|s| s.house == student.house && s.room != student.room)
        .map(|s| s.room.as_str())
        .collect();
    let mut rooms: Vec<String> = rooms.into_iter().map(str::to_string).collect();
    rooms.sort_by(|a, b| room_order(a, b));
    rooms
}

/// All distinct rooms on the roster, by house name then room order
pub fn all_rooms(students: &[Student]) -> Vec<KnownRoom> {
    let mut rooms: Vec<KnownRoom> = Vec::new();
    for s in students {
        if !rooms.iter().any(|r| r.house == s.house && r.room == s.room) {
            rooms.push(KnownRoom { house: s.house.clone(), room: s.room.clone() });
        }
    }
    rooms.sort_by(|a, b| name_order(&a.house, &b.house).then_with(|| room_order(&a.room, &b.room)));
    rooms
}

/// Builds the location choices for one student, filtering the full room list
/// by a case-insensitive search over "house room".
pub fn location_choices(students: &[Student], student: &Student, search: &str) -> LocationChoices {
    let needle = search.trim().to_lowercase();
    let all_rooms = all_rooms(students)
        .into_iter()
        .filter(|r| format!("{} {}", r.house, r.room).to_lowercase().contains(&needle))
        .collect();

    LocationChoices {
        own_room: student.own_room(),
        house_rooms: other_rooms_in_house(students, student),
        common_areas: COMMON_SLEEPING_AREAS.iter().map(|a| a.to_string()).collect(),
        all_rooms,
    }
}
