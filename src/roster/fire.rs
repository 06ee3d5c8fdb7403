use std::collections::BTreeMap;

use serde::Serialize;

use super::location::{room_order, split_location};
use super::types::{name_order, Day, Student};

/// Present students sleeping in one room on the selected day
#[derive(Debug, Clone, Serialize)]
pub struct RoomGroup<'a> {
    pub room: String,
    pub students: Vec<&'a Student>,
}

/// One house page of the fire roster
#[derive(Debug, Clone, Serialize)]
pub struct HouseGroup<'a> {
    pub house: String,
    pub rooms: Vec<RoomGroup<'a>>,
}

impl HouseGroup<'_> {
    /// Head count for the house
    pub fn count(&self) -> usize {
        self.rooms.iter().map(|r| r.students.len()).sum()
    }
}

/// Groups present students by where they sleep on `day`.
///
/// Houses come out in name order, rooms in [`room_order`], and students in a
/// room by first name. Recompute whenever the roster or the day changes.
pub fn fire_roster(students: &[Student], day: Day) -> Vec<HouseGroup<'_>> {
    let mut houses: BTreeMap<String, BTreeMap<String, Vec<&Student>>> = BTreeMap::new();

    for student in students.iter().filter(|s| s.is_present) {
        let (house, room) = split_location(student.location(day));
        houses
            .entry(house.to_string())
            .or_default()
            .entry(room.to_string())
            .or_default()
            .push(student);
    }

    let mut groups: Vec<HouseGroup> = houses
        .into_iter()
        .map(|(house, rooms)| {
            let mut rooms: Vec<RoomGroup> = rooms
                .into_iter()
                .map(|(room, mut students)| {
                    students.sort_by(|a, b| name_order(&a.first_name, &b.first_name));
                    RoomGroup { room, students }
                })
                .collect();
            rooms.sort_by(|a, b| room_order(&a.room, &b.room));
            HouseGroup { house, rooms }
        })
        .collect();
    groups.sort_by(|a, b| name_order(&a.house, &b.house));
    groups
}

/// Present students grouped by their registered house, ordered by room then
/// first name. This is the house overview, independent of sleeping locations.
pub fn house_overview(students: &[Student]) -> Vec<(String, Vec<&Student>)> {
    let mut houses: BTreeMap<&str, Vec<&Student>> = BTreeMap::new();
    for s in students.iter().filter(|s| s.is_present) {
        houses.entry(s.house.as_str()).or_default().push(s);
    }
    let mut overview: Vec<(String, Vec<&Student>)> = houses
        .into_iter()
        .map(|(house, mut members)| {
            members.sort_by(|a, b| room_order(&a.room, &b.room).then_with(|| name_order(&a.first_name, &b.first_name)));
            (house.to_string(), members)
        })
        .collect();
    overview.sort_by(|a, b| name_order(&a.0, &b.0));
    overview
}
