use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// Separator between house and room in a sleeping location label
pub const LOCATION_DELIMITER: &str = " - ";

/// A day of the weekend. Serialized with the Danish names used by existing backups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    #[serde(rename = "Fredag", alias = "Friday")]
    Friday,
    #[serde(rename = "Lørdag", alias = "Saturday")]
    Saturday,
    #[serde(rename = "Søndag", alias = "Sunday")]
    Sunday,
}

impl Day {
    pub const ALL: [Day; 3] = [Day::Friday, Day::Saturday, Day::Sunday];

    /// The weekend day matching the local date; weekdays count as Friday.
    pub fn today() -> Self {
        Self::for_weekday(Local::now().weekday())
    }

    pub fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
            _ => Day::Friday,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friday" | "fri" | "fredag" => Ok(Day::Friday),
            "saturday" | "sat" | "lørdag" | "lordag" => Ok(Day::Saturday),
            "sunday" | "sun" | "søndag" | "sondag" => Ok(Day::Sunday),
            _ => Err(RosterError::UnknownDay(s.to_string())),
        }
    }
}

/// Whether a student stays for the whole weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StayType {
    Full,
    #[default]
    None,
}

/// One student on the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub house: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub is_present: bool,
    #[serde(default)]
    pub stay_type: StayType,
    /// Kitchen duty students are left out of both distribution pools
    #[serde(default)]
    pub is_kitchen_duty: bool,
    /// Ticked off on the evening head count
    #[serde(default)]
    pub is_marked: bool,
    #[serde(default)]
    pub sleeping_locations: BTreeMap<Day, String>,
}

impl Student {
    /// Builds a student sleeping in their own room every day.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        house: impl Into<String>,
        room: impl Into<String>,
        stay_type: StayType,
    ) -> Self {
        let mut student = Student {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            house: house.into(),
            room: room.into(),
            is_present: stay_type != StayType::None,
            stay_type,
            is_kitchen_duty: false,
            is_marked: false,
            sleeping_locations: BTreeMap::new(),
        };
        let own = student.own_room();
        for day in Day::ALL {
            student.sleeping_locations.insert(day, own.clone());
        }
        student
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Location label of the student's own room
    pub fn own_room(&self) -> String {
        format!("{}{}{}", self.house, LOCATION_DELIMITER, self.room)
    }

    /// Where the student sleeps on `day`; empty when never set.
    pub fn location(&self, day: Day) -> &str {
        self.sleeping_locations.get(&day).map(String::as_str).unwrap_or("")
    }
}

/// Sort weight of a letter: Danish Æ, Ø, Å come after Z, in that order
fn collation_weight(c: char) -> u32 {
    match c {
        'æ' | 'ä' => 'z' as u32 + 1,
        'ø' | 'ö' => 'z' as u32 + 2,
        'å' => 'z' as u32 + 3,
        c => c as u32,
    }
}

/// Case-insensitive name ordering with the Danish alphabet's tail (… Z, Æ, Ø, Å)
pub fn name_order(a: &str, b: &str) -> Ordering {
    let key = |s: &str| s.chars().flat_map(char::to_lowercase).map(collation_weight).collect::<Vec<_>>();
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}
