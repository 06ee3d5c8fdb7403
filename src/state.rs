use chrono::{Datelike, Local};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::{Result, RosterError};
use crate::roster::{Day, Student};
use crate::schedule::{self, Assignments, Catalog, LockSet, SlotKind};

/// Placeholder shown for an assignment pointing at a student who no longer exists
pub const MISSING_NAME: &str = "??";

/// Current ISO week, the default weekend number
pub fn current_week() -> u32 {
    Local::now().iso_week().week()
}

/// Older backups store the week as a string
fn week_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Week {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<Week>::deserialize(deserializer)? {
        Some(Week::Number(n)) => Some(n),
        Some(Week::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// The whole application state. Every edit goes through a method here so the
/// snapshot written after it is always complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub students: Vec<Student>,
    pub weekend_num: u32,
    pub task_assignments: Assignments,
    pub cleaning_assignments: Assignments,
    pub locked_slots: LockSet,
}

/// A roster as read from a backup or snapshot, with every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    #[serde(default)]
    pub students: Option<Vec<Student>>,
    #[serde(default, deserialize_with = "week_from_any")]
    pub weekend_num: Option<u32>,
    #[serde(default)]
    pub task_assignments: Option<Assignments>,
    #[serde(default)]
    pub cleaning_assignments: Option<Assignments>,
    #[serde(default)]
    pub locked_slots: Option<LockSet>,
}

impl RosterSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RosterError::Backup(e.to_string()))
    }
}

impl Default for Roster {
    fn default() -> Self {
        Roster {
            students: Vec::new(),
            weekend_num: current_week(),
            task_assignments: Assignments::new(),
            cleaning_assignments: Assignments::new(),
            locked_slots: LockSet::new(),
        }
    }
}

impl Roster {
    /// Replaces the student set wholesale.
    ///
    /// Imported students get fresh ids, so existing assignments keep pointing
    /// at the old ones and show up as [`MISSING_NAME`] until redistributed.
    pub fn import_students(&mut self, students: Vec<Student>) {
        info!(count = students.len(), present = students.iter().filter(|s| s.is_present).count(), "imported students");
        self.students = students;
    }

    /// Applies a backup. Students and week are kept when the backup lacks
    /// them; assignments and locks fall back to empty.
    pub fn restore(&mut self, snapshot: RosterSnapshot) {
        if let Some(students) = snapshot.students {
            self.students = students;
        }
        if let Some(week) = snapshot.weekend_num {
            self.weekend_num = week;
        }
        self.task_assignments = snapshot.task_assignments.unwrap_or_default();
        self.cleaning_assignments = snapshot.cleaning_assignments.unwrap_or_default();
        self.locked_slots = snapshot.locked_slots.unwrap_or_default();
        info!(students = self.students.len(), week = self.weekend_num, "restored roster");
    }

    pub fn assignments(&self, kind: SlotKind) -> &Assignments {
        match kind {
            SlotKind::Task => &self.task_assignments,
            SlotKind::Cleaning => &self.cleaning_assignments,
        }
    }

    fn assignments_mut(&mut self, kind: SlotKind) -> &mut Assignments {
        match kind {
            SlotKind::Task => &mut self.task_assignments,
            SlotKind::Cleaning => &mut self.cleaning_assignments,
        }
    }

    /// Runs one distribution pass over the `kind` catalog
    pub fn distribute<R: Rng + ?Sized>(&mut self, catalog: &Catalog, kind: SlotKind, rng: &mut R) {
        let next = schedule::distribute(
            &self.students,
            kind,
            catalog.slots(kind),
            self.assignments(kind),
            &self.locked_slots,
            rng,
        );
        let assigned: usize = catalog.slots(kind).iter().map(|s| next.get(&s.id).map_or(0, Vec::len)).sum();
        let capacity: usize = catalog.slots(kind).iter().map(|s| s.capacity).sum();
        info!(%kind, assigned, capacity, "distributed slots");
        *self.assignments_mut(kind) = next;
    }

    fn check_slot(catalog: &Catalog, kind: SlotKind, slot: &str) -> Result<()> {
        match catalog.find(kind, slot) {
            Some(_) => Ok(()),
            None => Err(RosterError::UnknownSlot { kind, slot: slot.to_string() }),
        }
    }

    /// Manually puts a student on a slot, beyond capacity if need be
    pub fn add_to_slot(&mut self, catalog: &Catalog, kind: SlotKind, slot: &str, student: &str) -> Result<bool> {
        Self::check_slot(catalog, kind, slot)?;
        self.student(student)?;
        Ok(schedule::add_to_slot(self.assignments_mut(kind), slot, student))
    }

    pub fn remove_from_slot(&mut self, catalog: &Catalog, kind: SlotKind, slot: &str, student: &str) -> Result<bool> {
        Self::check_slot(catalog, kind, slot)?;
        Ok(schedule::remove_from_slot(self.assignments_mut(kind), slot, student))
    }

    /// Returns whether the slot is locked afterwards
    pub fn toggle_lock(&mut self, catalog: &Catalog, kind: SlotKind, slot: &str) -> Result<bool> {
        Self::check_slot(catalog, kind, slot)?;
        Ok(self.locked_slots.toggle(slot))
    }

    pub fn is_locked(&self, slot: &str) -> bool {
        self.locked_slots.contains(slot)
    }

    pub fn student(&self, id: &str) -> Result<&Student> {
        self.students.iter().find(|s| s.id == id).ok_or_else(|| RosterError::UnknownStudent(id.to_string()))
    }

    fn student_mut(&mut self, id: &str) -> Result<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id).ok_or_else(|| RosterError::UnknownStudent(id.to_string()))
    }

    /// Returns the new presence flag
    pub fn toggle_presence(&mut self, id: &str) -> Result<bool> {
        let student = self.student_mut(id)?;
        student.is_present = !student.is_present;
        Ok(student.is_present)
    }

    /// Returns the new kitchen duty flag
    pub fn toggle_kitchen_duty(&mut self, id: &str) -> Result<bool> {
        let student = self.student_mut(id)?;
        student.is_kitchen_duty = !student.is_kitchen_duty;
        Ok(student.is_kitchen_duty)
    }

    /// Returns the new head-count mark
    pub fn toggle_marked(&mut self, id: &str) -> Result<bool> {
        let student = self.student_mut(id)?;
        student.is_marked = !student.is_marked;
        Ok(student.is_marked)
    }

    /// Moves a student for one day. A blank label would put them under a
    /// nameless house on the fire roster, so it is refused.
    pub fn set_sleeping_location(&mut self, id: &str, day: Day, location: &str) -> Result<()> {
        let location = location.trim();
        if location.is_empty() {
            return Err(RosterError::BlankLocation);
        }
        let student = self.student_mut(id)?;
        student.sleeping_locations.insert(day, location.to_string());
        Ok(())
    }

    pub fn set_weekend_num(&mut self, week: u32) {
        self.weekend_num = week;
    }

    /// "First Last" for an id, or [`MISSING_NAME`] when the id is unknown
    pub fn display_name(&self, id: &str) -> String {
        self.student(id).map(Student::full_name).unwrap_or_else(|_| MISSING_NAME.to_string())
    }

    pub fn present_count(&self) -> usize {
        self.students.iter().filter(|s| s.is_present).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::StayType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster() -> Roster {
        let mut roster = Roster::default();
        roster.import_students(vec![
            Student::new("a", "Anna", "Berg", "Nord", "1", StayType::Full),
            Student::new("b", "Bo", "Holm", "Syd", "2", StayType::Full),
        ]);
        roster
    }

    #[test]
    fn toggles_flip_flags() {
        let mut r = roster();
        assert!(!r.toggle_presence("a").unwrap());
        assert!(r.toggle_presence("a").unwrap());
        assert!(r.toggle_kitchen_duty("b").unwrap());
        assert!(r.toggle_marked("b").unwrap());
        assert!(!r.toggle_marked("b").unwrap());
        assert!(matches!(r.toggle_presence("zz"), Err(RosterError::UnknownStudent(_))));
        assert!(r.toggle_marked("zz").is_err());
    }

    #[test]
    fn manual_edits_check_slot_and_student() {
        let catalog = Catalog::default();
        let mut r = roster();
        assert!(r.add_to_slot(&catalog, SlotKind::Task, "f1", "a").unwrap());
        assert!(!r.add_to_slot(&catalog, SlotKind::Task, "f1", "a").unwrap());
        assert!(matches!(
            r.add_to_slot(&catalog, SlotKind::Cleaning, "f1", "a"),
            Err(RosterError::UnknownSlot { .. })
        ));
        assert!(r.add_to_slot(&catalog, SlotKind::Task, "f1", "nobody").is_err());
        assert!(r.remove_from_slot(&catalog, SlotKind::Task, "f1", "a").unwrap());
        assert!(!r.remove_from_slot(&catalog, SlotKind::Task, "f1", "a").unwrap());
    }

    #[test]
    fn display_name_falls_back_for_orphans() {
        let r = roster();
        assert_eq!(r.display_name("a"), "Anna Berg");
        assert_eq!(r.display_name("gone"), MISSING_NAME);
    }

    #[test]
    fn restore_defaults_missing_containers() {
        let catalog = Catalog::default();
        let mut r = roster();
        r.add_to_slot(&catalog, SlotKind::Task, "f1", "a").unwrap();
        r.toggle_lock(&catalog, SlotKind::Task, "f1").unwrap();
        r.set_weekend_num(12);

        let snapshot = RosterSnapshot::from_json(r#"{"weekendNum": "40"}"#).unwrap();
        r.restore(snapshot);
        assert_eq!(r.students.len(), 2);
        assert_eq!(r.weekend_num, 40);
        assert!(r.task_assignments.is_empty());
        assert!(r.locked_slots.is_empty());
    }

    #[test]
    fn malformed_backup_is_reported() {
        assert!(matches!(RosterSnapshot::from_json("{not json"), Err(RosterError::Backup(_))));
    }

    #[test]
    fn distribute_replaces_only_the_chosen_kind() {
        let catalog = Catalog::default();
        let mut r = roster();
        r.cleaning_assignments.insert("Arken".to_string(), vec!["x".to_string()]);
        r.distribute(&catalog, SlotKind::Task, &mut StdRng::seed_from_u64(2));

        assert_eq!(r.cleaning_assignments["Arken"], vec!["x".to_string()]);
        assert_eq!(r.task_assignments.len(), catalog.tasks.len());
        let assigned: usize = r.task_assignments.values().map(Vec::len).sum();
        assert_eq!(assigned, 2);
    }

    #[test]
    fn set_location_trims_label() {
        let mut r = roster();
        r.set_sleeping_location("a", Day::Sunday, "  Teltet ").unwrap();
        assert_eq!(r.student("a").unwrap().location(Day::Sunday), "Teltet");
        assert_eq!(r.student("a").unwrap().location(Day::Friday), "Nord - 1");
    }

    #[test]
    fn blank_location_is_refused() {
        let mut r = roster();
        assert!(matches!(r.set_sleeping_location("a", Day::Friday, "   "), Err(RosterError::BlankLocation)));
        assert!(matches!(r.set_sleeping_location("a", Day::Friday, ""), Err(RosterError::BlankLocation)));
        assert_eq!(r.student("a").unwrap().location(Day::Friday), "Nord - 1");

        let houses: Vec<String> = crate::roster::fire_roster(&r.students, Day::Friday)
            .into_iter()
            .map(|h| h.house)
            .collect();
        assert_eq!(houses, vec!["Nord".to_string(), "Syd".to_string()]);
    }
}
