//! Section order: which sections are shown and in what order.
//!
//! The order is a view over the document's keys. Every function here returns a new
//! `Vec` and never touches section data; the session applies the matching data change.

use serde::{Deserialize, Serialize};

use crate::document::{default_title, ResumeDocument};

/// Display order used when deriving an order from a freshly normalized document.
/// `achievements` and `awards` share a slot; the former wins when both have content.
const DISPLAY_ORDER: [&str; 11] = [
    "summary",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "languages",
    "achievements",
    "interests",
    "publications",
    "volunteer",
];

/// Keys a section can never use: they name document fields outside the section map.
const RESERVED_SECTION_IDS: [&str; 1] = ["basics"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub id: String,
    pub title: String,
}

impl SectionDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Descriptor with the default title for `id`.
    pub fn for_id(id: &str) -> Self {
        Self::new(id, default_title(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Builds the initial section order from the sections that carry content.
pub fn derive_section_order(document: &ResumeDocument) -> Vec<SectionDescriptor> {
    DISPLAY_ORDER
        .iter()
        .filter_map(|id| match *id {
            "achievements" if document.has_content("achievements") => Some("achievements"),
            "achievements" if document.has_content("awards") => Some("awards"),
            "achievements" => None,
            other => document.has_content(other).then_some(other),
        })
        .map(SectionDescriptor::for_id)
        .collect()
}

/// Appends `descriptor` unless a section with the same id is already listed.
pub fn add_section(order: &[SectionDescriptor], descriptor: SectionDescriptor) -> Vec<SectionDescriptor> {
    let mut next = order.to_vec();
    if !contains(order, &descriptor.id) {
        next.push(descriptor);
    }
    next
}

pub fn delete_section(order: &[SectionDescriptor], id: &str) -> Vec<SectionDescriptor> {
    order.iter().filter(|s| s.id != id).cloned().collect()
}

/// Swaps the section with its neighbour. Unknown ids and moves past either end are no-ops.
pub fn move_section(order: &[SectionDescriptor], id: &str, direction: MoveDirection) -> Vec<SectionDescriptor> {
    let mut next = order.to_vec();
    let Some(pos) = order.iter().position(|s| s.id == id) else {
        return next;
    };
    let target = match direction {
        MoveDirection::Up if pos > 0 => pos - 1,
        MoveDirection::Down if pos + 1 < order.len() => pos + 1,
        _ => return next,
    };
    next.swap(pos, target);
    next
}

/// Reorders to `ids`. Returns `None` unless `ids` is a permutation of the current ids.
pub fn rearrange(order: &[SectionDescriptor], ids: &[String]) -> Option<Vec<SectionDescriptor>> {
    if ids.len() != order.len() {
        return None;
    }
    let mut remaining = order.to_vec();
    let mut next = Vec::with_capacity(order.len());
    for id in ids {
        let pos = remaining.iter().position(|s| &s.id == id)?;
        next.push(remaining.swap_remove(pos));
    }
    Some(next)
}

/// Section id for a user-supplied section name: lowercase, runs of whitespace and
/// dots as `_`.
///
/// Ids must stay addressable by the dotted editor and must not shadow `basics`, so a
/// name that would produce `basics` or an all-digit id gets a `_section` suffix.
pub fn section_id_from_name(name: &str) -> String {
    let id = name
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    if id.is_empty() {
        return "custom".to_string();
    }
    if RESERVED_SECTION_IDS.contains(&id.as_str()) || id.bytes().all(|b| b.is_ascii_digit()) {
        return format!("{id}_section");
    }
    id
}

fn contains(order: &[SectionDescriptor], id: &str) -> bool {
    order.iter().any(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize;
    use serde_json::json;

    fn ids(order: &[SectionDescriptor]) -> Vec<&str> {
        order.iter().map(|s| s.id.as_str()).collect()
    }

    fn order_of(list: &[&str]) -> Vec<SectionDescriptor> {
        list.iter().map(|id| SectionDescriptor::for_id(id)).collect()
    }

    #[test]
    fn test_derived_order_follows_display_order() {
        let doc = normalize(&json!({
            "volunteer": [{ "organization": "Shelter" }],
            "skills": ["Rust"],
            "summary": "Hi",
            "experience": [{ "title": "Eng" }]
        }));
        let order = derive_section_order(&doc);
        assert_eq!(ids(&order), vec!["summary", "experience", "skills", "volunteer"]);
        assert_eq!(order[3].title, "Volunteer Experience");
    }

    #[test]
    fn test_awards_listed_through_backfilled_achievements() {
        let doc = normalize(&json!({ "awards": [{ "title": "Best" }] }));
        assert_eq!(ids(&derive_section_order(&doc)), vec!["achievements"]);
    }

    #[test]
    fn test_awards_listed_when_achievements_missing() {
        let mut doc = normalize(&json!({ "awards": [{ "title": "Best" }] }));
        doc.sections.remove("achievements");
        assert_eq!(ids(&derive_section_order(&doc)), vec!["awards"]);
    }

    #[test]
    fn test_add_is_idempotent_per_id() {
        let order = order_of(&["summary"]);
        let once = add_section(&order, SectionDescriptor::for_id("skills"));
        let twice = add_section(&once, SectionDescriptor::for_id("skills"));
        assert_eq!(ids(&twice), vec!["summary", "skills"]);
    }

    #[test]
    fn test_delete_section() {
        let order = order_of(&["summary", "skills", "projects"]);
        assert_eq!(ids(&delete_section(&order, "skills")), vec!["summary", "projects"]);
        assert_eq!(delete_section(&order, "nope"), order);
    }

    #[test]
    fn test_move_section_swaps_neighbours() {
        let order = order_of(&["a", "b", "c"]);
        assert_eq!(ids(&move_section(&order, "b", MoveDirection::Up)), vec!["b", "a", "c"]);
        assert_eq!(ids(&move_section(&order, "b", MoveDirection::Down)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_move_at_boundaries_is_a_no_op() {
        let order = order_of(&["a", "b"]);
        assert_eq!(move_section(&order, "a", MoveDirection::Up), order);
        assert_eq!(move_section(&order, "b", MoveDirection::Down), order);
        assert_eq!(move_section(&order, "zzz", MoveDirection::Up), order);
    }

    #[test]
    fn test_rearrange_requires_permutation() {
        let order = order_of(&["a", "b", "c"]);
        let wanted = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(ids(&rearrange(&order, &wanted).unwrap()), vec!["c", "a", "b"]);

        assert!(rearrange(&order, &["a".to_string(), "b".to_string()]).is_none());
        assert!(rearrange(&order, &["a".to_string(), "a".to_string(), "b".to_string()]).is_none());
        assert!(rearrange(&order, &["a".to_string(), "b".to_string(), "x".to_string()]).is_none());
    }

    #[test]
    fn test_rearrange_keeps_titles() {
        let order = vec![SectionDescriptor::new("custom_x", "My Custom")];
        let next = rearrange(&order, &["custom_x".to_string()]).unwrap();
        assert_eq!(next[0].title, "My Custom");
    }

    #[test]
    fn test_section_id_from_name() {
        assert_eq!(section_id_from_name("Open  Source Work"), "open_source_work");
        assert_eq!(section_id_from_name(" Talks "), "talks");
    }

    #[test]
    fn test_reserved_and_numeric_names_are_suffixed() {
        assert_eq!(section_id_from_name("Basics"), "basics_section");
        assert_eq!(section_id_from_name("2024"), "2024_section");
        assert_eq!(section_id_from_name("2024 Talks"), "2024_talks");
    }

    #[test]
    fn test_dots_never_reach_the_id() {
        assert_eq!(section_id_from_name("Web 2.0 Work"), "web_2_0_work");
        assert_eq!(section_id_from_name(" . "), "custom");
    }
}
