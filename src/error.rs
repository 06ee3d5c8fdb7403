use thiserror::Error;

use crate::schedule::SlotKind;

/// Everything that can go wrong while editing a roster.
///
/// Import and restore failures are reported before any state is touched, so
/// a caller can surface the message and carry on with the roster it had.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("could not read spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("the spreadsheet has no data rows")]
    EmptySheet,

    #[error("no column found for {0}")]
    MissingColumn(&'static str),

    #[error("could not read backup: {0}")]
    Backup(String),

    #[error("unknown {kind} slot: {slot}")]
    UnknownSlot { kind: SlotKind, slot: String },

    #[error("unknown student: {0}")]
    UnknownStudent(String),

    #[error("unknown day: {0}")]
    UnknownDay(String),

    #[error("unknown slot kind: {0}")]
    UnknownKind(String),

    #[error("unknown print layout: {0}")]
    UnknownLayout(String),

    #[error("a sleeping location cannot be blank")]
    BlankLocation,

    #[error("slot id {0} is used more than once in the catalog")]
    DuplicateSlot(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
