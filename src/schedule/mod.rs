pub mod types;
pub mod catalog;
pub mod distribute;
pub mod manual;

pub use types::{Assignments, LockSet, Slot, SlotKind};
pub use catalog::{Catalog, TASK_CAPACITY};
pub use distribute::distribute;
pub use manual::{add_to_slot, remove_from_slot};
