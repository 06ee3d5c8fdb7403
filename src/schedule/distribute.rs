use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::roster::Student;
use super::types::{Assignments, LockSet, Slot, SlotKind};

/// Randomly fills the unlocked slots of a catalog from the eligible students.
///
/// Eligible students (see [`SlotKind::is_eligible`]) are shuffled once, then
/// handed out in catalog order: each unlocked slot is emptied and takes the
/// next `capacity` students nobody has used yet in this pass. Locked slots
/// keep their current list and consume nobody. Running out of students just
/// leaves later slots short. Entries for slots outside `slots` are carried over.
pub fn distribute<R: Rng + ?Sized>(
    students: &[Student],
    kind: SlotKind,
    slots: &[Slot],
    current: &Assignments,
    locked: &LockSet,
    rng: &mut R,
) -> Assignments {
    // shuffle the eligible pool once, up front
    let mut pool: Vec<&Student> = students.iter().filter(|s| kind.is_eligible(s)).collect();
    pool.shuffle(rng);

    // start from the current map so locked and foreign slots carry over
    let mut result = current.clone();
    let mut used: HashSet<&str> = HashSet::new();
    let mut remaining = pool.into_iter();

    for slot in slots {
        if locked.contains(&slot.id) {
            debug!(slot = %slot.id, "slot locked, keeping current assignment");
            continue;
        }

        // unlocked slots start empty and take the next unused students
        let mut assigned = Vec::with_capacity(slot.capacity);
        while assigned.len() < slot.capacity {
            match remaining.next() {
                Some(student) => {
                    // duplicate ids in the roster must not land twice
                    if used.insert(student.id.as_str()) {
                        assigned.push(student.id.clone());
                    }
                }
                None => break,
            }
        }

        debug!(slot = %slot.id, filled = assigned.len(), capacity = slot.capacity, "slot filled");
        result.insert(slot.id.clone(), assigned);
    }

    result
}
