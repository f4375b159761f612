// Résumé document model and the normalizer that produces it.
// The canonical document is the single source of truth for a session;
// section order and page layout are views recomputed from it.

pub mod handlers;
pub mod model;
pub mod normalize;

pub use model::{default_title, placeholder_entry, ResumeDocument, SectionValue};
pub use normalize::normalize;
