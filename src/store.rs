use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::state::{Roster, RosterSnapshot};

/// Snapshot file that keeps the roster between runs.
///
/// Writes are best effort: a failed save is logged and otherwise ignored,
/// and a missing or unreadable snapshot just means starting from scratch.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot once at startup
    pub fn load(&self) -> Roster {
        let mut roster = Roster::default();
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no snapshot, starting empty");
                return roster;
            }
        };
        match RosterSnapshot::from_json(&contents) {
            Ok(snapshot) => roster.restore(snapshot),
            Err(e) => warn!(path = %self.path.display(), error = %e, "discarding malformed snapshot"),
        }
        roster
    }

    /// Writes a full snapshot, swallowing failures
    pub fn save(&self, roster: &Roster) {
        if let Err(e) = self.try_save(roster) {
            warn!(path = %self.path.display(), error = %e, "could not save snapshot");
        }
    }

    fn try_save(&self, roster: &Roster) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string(roster)?)?;
        Ok(())
    }

    /// Forgets the saved roster
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File name a backup is offered under
pub fn backup_file_name(roster: &Roster) -> String {
    format!("weekend_backup_week{}.json", roster.weekend_num)
}

/// Serializes the full roster for download
pub fn export_backup(roster: &Roster) -> Result<String> {
    Ok(serde_json::to_string_pretty(roster)?)
}

/// Applies a backup blob. The roster is untouched when the blob does not parse.
pub fn restore_backup(roster: &mut Roster, json: &str) -> Result<()> {
    let snapshot = RosterSnapshot::from_json(json)?;
    roster.restore(snapshot);
    Ok(())
}

/// Writes a backup into `dir` and returns its path
pub fn write_backup(roster: &Roster, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(backup_file_name(roster));
    fs::write(&path, export_backup(roster)?)?;
    info!(path = %path.display(), "wrote backup");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{StayType, Student};
    use crate::schedule::{Catalog, SlotKind};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("weekend-store-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> Roster {
        let catalog = Catalog::default();
        let mut roster = Roster::default();
        roster.import_students(vec![Student::new("a", "Anna", "Berg", "Nord", "1", StayType::Full)]);
        roster.add_to_slot(&catalog, SlotKind::Cleaning, "Arken", "a").unwrap();
        roster.toggle_lock(&catalog, SlotKind::Cleaning, "Arken").unwrap();
        roster.set_weekend_num(7);
        roster
    }

    #[test]
    fn snapshot_survives_a_restart() {
        let dir = temp_dir("restart");
        let store = Store::new(dir.join("nested").join("state.json"));
        let roster = sample();
        store.save(&roster);
        assert_eq!(store.load(), roster);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_snapshot_is_discarded() {
        let dir = temp_dir("malformed");
        let path = dir.join("state.json");
        fs::write(&path, "{\"students\": [oops").unwrap();
        let roster = Store::new(&path).load();
        assert!(roster.students.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reset_is_fine_without_a_snapshot() {
        let dir = temp_dir("reset");
        let store = Store::new(dir.join("state.json"));
        assert!(store.reset().is_ok());
        store.save(&sample());
        assert!(store.reset().is_ok());
        assert!(!store.path().exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_restore_leaves_roster_alone() {
        let mut roster = sample();
        let before = roster.clone();
        assert!(restore_backup(&mut roster, "[1, 2").is_err());
        assert_eq!(roster, before);
    }

    #[test]
    fn backup_round_trip_and_name() {
        let roster = sample();
        assert_eq!(backup_file_name(&roster), "weekend_backup_week7.json");
        let blob = export_backup(&roster).unwrap();
        let mut restored = Roster::default();
        restore_backup(&mut restored, &blob).unwrap();
        assert_eq!(restored, roster);
    }

    #[test]
    fn reads_backups_from_the_browser_app() {
        let blob = r#"{
            "students": [{
                "id": "std-1-0", "firstName": "Anna", "lastName": "Berg", "room": "1", "house": "Nord",
                "isPresent": true, "stayType": "full", "isKitchenDuty": false, "isMarked": false,
                "sleepingLocations": {"Fredag": "Nord - 1", "Lørdag": "Teltet", "Søndag": "Nord - 1"}
            }],
            "weekendNum": "14",
            "taskAssignments": {"f1": ["std-1-0"]},
            "cleaningAssignments": {},
            "lockedSlots": {"f1": true, "f2": false}
        }"#;
        let mut roster = Roster::default();
        restore_backup(&mut roster, blob).unwrap();
        assert_eq!(roster.weekend_num, 14);
        assert_eq!(roster.students[0].location(crate::roster::Day::Saturday), "Teltet");
        assert!(roster.is_locked("f1"));
        assert!(!roster.is_locked("f2"));
        assert_eq!(roster.display_name("std-1-0"), "Anna Berg");
    }

    #[test]
    fn head_count_marks_survive_a_backup() {
        let blob = r#"{
            "students": [{
                "id": "std-1-0", "firstName": "Anna", "lastName": "Berg", "room": "1", "house": "Nord",
                "isPresent": true, "stayType": "full", "isKitchenDuty": false, "isMarked": true,
                "sleepingLocations": {"Fredag": "Nord - 1"}
            }]
        }"#;
        let mut roster = Roster::default();
        restore_backup(&mut roster, blob).unwrap();
        assert!(roster.students[0].is_marked);

        let exported: serde_json::Value = serde_json::from_str(&export_backup(&roster).unwrap()).unwrap();
        assert_eq!(exported["students"][0]["isMarked"], true);
    }
}
