pub mod types;
pub mod location;
pub mod fire;

pub use types::{name_order, Day, StayType, Student, LOCATION_DELIMITER};
pub use location::{location_choices, room_order, split_location, LocationChoices, COMMON_ROOM};
pub use fire::{fire_roster, house_overview, HouseGroup, RoomGroup};

/// Students whose full name contains `search` (case-insensitive), sorted by
/// first name. Absent students are only listed when `include_absent` is set.
pub fn search_students<'a>(students: &'a [Student], search: &str, include_absent: bool) -> Vec<&'a Student> {
    let needle = search.to_lowercase();
    let mut found: Vec<&Student> = students
        .iter()
        .filter(|s| include_absent || s.is_present)
        .filter(|s| s.full_name().to_lowercase().contains(&needle))
        .collect();
    found.sort_by(|a, b| name_order(&a.first_name, &b.first_name));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_full_name_and_hides_absent() {
        let mut absent = Student::new("2", "Bo", "Holm", "Nord", "1", StayType::Full);
        absent.is_present = false;
        let students = vec![
            Student::new("1", "Maja", "Holm", "Nord", "2", StayType::Full),
            absent,
            Student::new("3", "Aske", "Holmgaard", "Syd", "4", StayType::Full),
        ];

        let present: Vec<&str> = search_students(&students, "HOLM", false).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(present, vec!["3", "1"]);

        let all = search_students(&students, "holm", true);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].first_name, "Aske");

        assert_eq!(search_students(&students, "maja holm", false).len(), 1);
    }
}
