use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RosterError;
use crate::roster::{Day, StayType, Student};

/// Slot id -> assigned student ids, in assignment order
pub type Assignments = BTreeMap<String, Vec<String>>;

/// A labeled unit of work needing a fixed number of people
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub label: String,
    pub capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Day>,
}

impl Slot {
    pub fn new(id: impl Into<String>, label: impl Into<String>, capacity: usize) -> Self {
        Slot { id: id.into(), label: label.into(), capacity, day: None }
    }

    pub fn on(mut self, day: Day) -> Self {
        self.day = Some(day);
        self
    }

    /// Label without its "Day: " prefix, as printed under a day heading
    pub fn short_label(&self) -> &str {
        self.label.split_once(": ").map(|(_, rest)| rest).unwrap_or(&self.label)
    }
}

/// The two slot catalogs a roster distributes over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Task,
    Cleaning,
}

impl SlotKind {
    /// Pool predicate: present and not on kitchen duty; cleaning also needs a full-weekend stay.
    pub fn is_eligible(&self, student: &Student) -> bool {
        let base = student.is_present && !student.is_kitchen_duty;
        match self {
            SlotKind::Task => base,
            SlotKind::Cleaning => base && student.stay_type == StayType::Full,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Task => f.write_str("task"),
            SlotKind::Cleaning => f.write_str("cleaning"),
        }
    }
}

impl FromStr for SlotKind {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "task" | "tasks" => Ok(SlotKind::Task),
            "cleaning" | "clean" => Ok(SlotKind::Cleaning),
            _ => Err(RosterError::UnknownKind(s.to_string())),
        }
    }
}

/// Slots frozen against automatic distribution.
///
/// Stored on disk as `{ "<slot id>": true }`; `false` entries are dropped on read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSet(BTreeSet<String>);

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.0.contains(slot)
    }

    pub fn lock(&mut self, slot: impl Into<String>) {
        self.0.insert(slot.into());
    }

    /// Flips the lock on `slot` and returns whether it is now locked
    pub fn toggle(&mut self, slot: &str) -> bool {
        if self.0.remove(slot) {
            false
        } else {
            self.0.insert(slot.to_string());
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LockSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        LockSet(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for LockSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|slot| (slot, true)))
    }
}

impl<'de> Deserialize<'de> for LockSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = BTreeMap::<String, bool>::deserialize(deserializer)?;
        Ok(flags.into_iter().filter(|(_, locked)| *locked).map(|(slot, _)| slot).collect())
    }
}
