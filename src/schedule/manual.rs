use super::types::Assignments;

/// Puts `student` on `slot` unless already there. Capacity and eligibility are
/// not checked. Returns whether anything changed.
pub fn add_to_slot(assignments: &mut Assignments, slot: &str, student: &str) -> bool {
    let members = assignments.entry(slot.to_string()).or_default();
    if members.iter().any(|id| id == student) {
        return false;
    }
    members.push(student.to_string());
    true
}

/// Takes `student` off `slot`. Returns whether anything changed.
pub fn remove_from_slot(assignments: &mut Assignments, slot: &str, student: &str) -> bool {
    match assignments.get_mut(slot) {
        Some(members) => {
            let before = members.len();
            members.retain(|id| id != student);
            members.len() != before
        }
        None => false,
    }
}
