use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};
use crate::roster::Day;
use super::types::{Slot, SlotKind};

/// Students per task slot
pub const TASK_CAPACITY: usize = 2;

const TASKS: [(&str, Day, &str); 15] = [
    ("f1", Day::Friday, "Before dinner"),
    ("f2", Day::Friday, "After dinner"),
    ("f3", Day::Friday, "Evening serving"),
    ("l1", Day::Saturday, "Before brunch"),
    ("l2", Day::Saturday, "After brunch"),
    ("l6", Day::Saturday, "Afternoon serving"),
    ("l3", Day::Saturday, "Before dinner"),
    ("l4", Day::Saturday, "After dinner"),
    ("l5", Day::Saturday, "Evening serving"),
    ("s1", Day::Sunday, "Before brunch"),
    ("s2", Day::Sunday, "After brunch"),
    ("s3", Day::Sunday, "Afternoon serving"),
    ("s4", Day::Sunday, "Before dinner"),
    ("s5", Day::Sunday, "After dinner"),
    ("s6", Day::Sunday, "Evening serving"),
];

const CLEANING_AREAS: [(&str, usize); 10] = [
    ("Arken", 2),
    ("Den lange gang", 3),
    ("Gangene i treenigheden", 2),
    ("Biografen", 1),
    ("Kunst", 1),
    ("Klassefløjen + toiletter", 4),
    ("Toiletter i hallen", 3),
    ("Toiletter på den lange gang", 2),
    ("Gymnastiksalen", 2),
    ("Hallen", 2),
];

/// The fixed, ordered slot lists distribution walks through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub tasks: Vec<Slot>,
    pub cleaning: Vec<Slot>,
}

impl Default for Catalog {
    fn default() -> Self {
        let tasks = TASKS
            .iter()
            .map(|(id, day, what)| Slot::new(*id, format!("{}: {}", day, what), TASK_CAPACITY).on(*day))
            .collect();
        let cleaning = CLEANING_AREAS
            .iter()
            .map(|(name, count)| Slot::new(*name, *name, *count))
            .collect();
        Catalog { tasks, cleaning }
    }
}

impl Catalog {
    /// Reads a catalog from a JSON file shaped like `{ "tasks": [...], "cleaning": [...] }`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Slot ids key the assignment maps and share one lock namespace, so an
    /// id may appear only once across both lists.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in self.tasks.iter().chain(&self.cleaning) {
            if !seen.insert(slot.id.as_str()) {
                return Err(RosterError::DuplicateSlot(slot.id.clone()));
            }
        }
        Ok(())
    }

    pub fn slots(&self, kind: SlotKind) -> &[Slot] {
        match kind {
            SlotKind::Task => &self.tasks,
            SlotKind::Cleaning => &self.cleaning,
        }
    }

    pub fn find(&self, kind: SlotKind, id: &str) -> Option<&Slot> {
        self.slots(kind).iter().find(|s| s.id == id)
    }

    /// Task slots belonging to `day`, in catalog order
    pub fn tasks_on(&self, day: Day) -> impl Iterator<Item = &Slot> {
        self.tasks.iter().filter(move |s| s.day == Some(day))
    }
}
