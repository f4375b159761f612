// Section layout: the ordered section list and how it is split into pages.
// Both are views recomputed from the document; nothing here is stored.

pub mod pagination;
pub mod sections;

pub use pagination::{PageAssignment, PaginationPolicy};
pub use sections::{MoveDirection, SectionDescriptor};
