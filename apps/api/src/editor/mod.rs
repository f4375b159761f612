// Path-addressed editor.
// Applies one field-level edit to a ResumeDocument and returns the new version.
// Unresolvable addresses are a safe no-op; the editor itself holds no state.

pub mod address;
pub mod apply;
pub mod formatting;

use thiserror::Error;

pub use apply::{edit, read_field, try_edit};
pub use formatting::{strip_markers, FormattedText, Formatting};

/// Why an edit could not be applied. Callers of `edit` never see this; `try_edit`
/// exposes it for surfaces that want to report a warning.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit address is empty")]
    EmptyAddress,

    #[error("edit address has an empty segment at position {position}")]
    EmptySegment { position: usize },

    #[error("no value at '{segment}'")]
    MissingSegment { segment: String },

    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{segment}' cannot be descended into")]
    NotAContainer { segment: String },

    #[error("'{address}' holds a list or object and cannot be replaced by text")]
    WouldReplaceContainer { address: String },

    #[error("'{0}' is not a basics field")]
    UnknownBasicsField(String),

    #[error("'{0}' must stay a list")]
    SequenceField(String),
}
