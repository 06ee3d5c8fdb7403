pub mod error;
pub mod roster;
pub mod schedule;
pub mod parser;
pub mod state;
pub mod store;
pub mod display;
pub mod config;
pub mod web;

pub use error::{Result, RosterError};
pub use roster::{Day, StayType, Student};
pub use schedule::{Assignments, Catalog, LockSet, Slot, SlotKind};
pub use state::Roster;
