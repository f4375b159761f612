// Editing sessions.
// A session exclusively owns one ResumeDocument and its section order. All mutation
// goes through EditingSession so the document and the order never drift apart.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::document::model::SUMMARY_PLACEHOLDER;
use crate::document::{normalize, placeholder_entry, ResumeDocument, SectionValue};
use crate::editor::{read_field, try_edit, EditError, FormattedText, Formatting};
use crate::layout::pagination::{PageAssignment, PaginationPolicy};
use crate::layout::sections::{self, section_id_from_name, MoveDirection, SectionDescriptor};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingSession {
    pub id: Uuid,
    pub document: ResumeDocument,
    pub section_order: Vec<SectionDescriptor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EditingSession {
    /// Normalizes `raw` and derives the initial section order from it.
    pub fn from_raw(raw: &Value) -> Self {
        let document = normalize(raw);
        let section_order = sections::derive_section_order(&document);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            document,
            section_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies one edit. On error the document is left untouched.
    pub fn edit(&mut self, address: &str, value: &str, formatting: Formatting) -> Result<(), EditError> {
        let updated = try_edit(&self.document, address, value, formatting).inspect_err(|e| {
            debug!(session_id = %self.id, "edit at '{address}' ignored: {e}");
        })?;
        self.document = updated;
        self.touch();
        Ok(())
    }

    /// Stored text at `address` split into plain text and formatting, for re-editing.
    pub fn field_text(&self, address: &str) -> Option<FormattedText> {
        read_field(&self.document, address).map(|stored| FormattedText::parse(&stored))
    }

    /// Adds a section of `section_type`, named `custom_name` when given, and seeds it
    /// with a placeholder entry. Returns the descriptor of the section.
    pub fn add_section(&mut self, section_type: &str, custom_name: Option<&str>) -> SectionDescriptor {
        let custom_name = custom_name.map(str::trim).filter(|n| !n.is_empty());
        let descriptor = match custom_name {
            Some(name) => SectionDescriptor::new(section_id_from_name(name), name),
            None => SectionDescriptor::for_id(&section_id_from_name(section_type)),
        };

        let sections = &mut self.document.sections;
        if descriptor.id == "summary" {
            sections
                .entry(descriptor.id.clone())
                .or_insert_with(|| SectionValue::Text(SUMMARY_PLACEHOLDER.to_string()));
        } else {
            let entry = placeholder_entry(section_type);
            let next = match sections.remove(&descriptor.id) {
                Some(SectionValue::Entries(mut entries)) => {
                    entries.push(entry);
                    entries
                }
                Some(SectionValue::Text(text)) => vec![Value::String(text), entry],
                None => vec![entry],
            };
            sections.insert(descriptor.id.clone(), SectionValue::Entries(next));
        }

        self.section_order = sections::add_section(&self.section_order, descriptor.clone());
        self.touch();
        self.section_order
            .iter()
            .find(|s| s.id == descriptor.id)
            .cloned()
            .unwrap_or(descriptor)
    }

    /// Removes the section from the order and drops its data. Returns whether it existed.
    pub fn delete_section(&mut self, id: &str) -> bool {
        let listed = self.section_order.iter().any(|s| s.id == id);
        let stored = self.document.sections.remove(id).is_some();
        self.section_order = sections::delete_section(&self.section_order, id);
        if listed || stored {
            self.touch();
        }
        listed || stored
    }

    pub fn move_section(&mut self, id: &str, direction: MoveDirection) {
        self.section_order = sections::move_section(&self.section_order, id, direction);
        self.touch();
    }

    /// Returns `false`, leaving the order unchanged, unless `ids` is a permutation of it.
    pub fn rearrange(&mut self, ids: &[String]) -> bool {
        match sections::rearrange(&self.section_order, ids) {
            Some(next) => {
                self.section_order = next;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn page(&self, policy: &dyn PaginationPolicy, page_index: usize) -> PageAssignment {
        policy.sections_for_page(&self.section_order, &self.document, page_index)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// In-memory session store. The write lock serializes mutations of each session.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, EditingSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: EditingSession) -> Uuid {
        let id = session.id;
        self.sessions.write().await.insert(id, session);
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<EditingSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Returns whether the session existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops sessions not touched since `cutoff`. Returns how many were dropped.
    pub async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at >= cutoff);
        before - sessions.len()
    }

    /// Runs `f` against the session under the write lock.
    pub async fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut EditingSession) -> T) -> Option<T> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(&id).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pagination::SinglePage;
    use serde_json::json;

    fn session() -> EditingSession {
        EditingSession::from_raw(&json!({
            "name": "Jane",
            "summary": "Engineer",
            "experience": [{ "title": "Eng", "company": "Acme" }]
        }))
    }

    fn ids(session: &EditingSession) -> Vec<&str> {
        session.section_order.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_from_raw_derives_order() {
        let s = session();
        assert_eq!(ids(&s), vec!["summary", "experience"]);
        assert_eq!(s.document.basics.name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_failed_edit_leaves_document_untouched() {
        let mut s = session();
        let before = s.document.clone();
        assert!(s.edit("experience.4.title", "x", Formatting::default()).is_err());
        assert_eq!(s.document, before);
    }

    #[test]
    fn test_edit_then_read_back_formatting() {
        let mut s = session();
        let bold = Formatting {
            bold: true,
            ..Formatting::default()
        };
        s.edit("experience.0.title", "Lead", bold).unwrap();

        let field = s.field_text("experience.0.title").unwrap();
        assert_eq!(field.text, "Lead");
        assert_eq!(field.formatting, bold);
    }

    #[test]
    fn test_add_known_section_seeds_placeholder() {
        let mut s = session();
        let descriptor = s.add_section("projects", None);
        assert_eq!(descriptor, SectionDescriptor::new("projects", "Projects"));
        assert_eq!(ids(&s), vec!["summary", "experience", "projects"]);
        assert_eq!(s.document.entries("projects").unwrap()[0]["name"], "Project Name");
    }

    #[test]
    fn test_add_existing_section_appends_entry_once_in_order() {
        let mut s = session();
        s.add_section("experience", None);
        assert_eq!(s.document.entries("experience").unwrap().len(), 2);
        assert_eq!(ids(&s), vec!["summary", "experience"]);
    }

    #[test]
    fn test_add_custom_section_uses_name_as_id() {
        let mut s = session();
        let descriptor = s.add_section("custom", Some("Open Source Work"));
        assert_eq!(descriptor.id, "open_source_work");
        assert_eq!(descriptor.title, "Open Source Work");
        assert_eq!(
            s.document.entries("open_source_work").unwrap(),
            &[json!("Custom content")]
        );
    }

    #[test]
    fn test_custom_section_named_basics_keeps_contact_block() {
        let mut s = session();
        let descriptor = s.add_section("custom", Some("Basics"));
        assert_eq!(descriptor.id, "basics_section");
        assert_eq!(descriptor.title, "Basics");

        let value = serde_json::to_value(&s.document).unwrap();
        assert_eq!(value["basics"]["name"], "Jane");
        assert_eq!(value["basics_section"], json!(["Custom content"]));

        s.edit("basics_section.0", "Talks", Formatting::default()).unwrap();
        assert_eq!(s.document.entries("basics_section").unwrap()[0], "Talks");
    }

    #[test]
    fn test_section_type_basics_is_not_a_section_id() {
        let mut s = session();
        let descriptor = s.add_section("basics", None);
        assert_eq!(descriptor.id, "basics_section");
        assert_eq!(s.document.basics.name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_dotted_custom_name_stays_editable() {
        let mut s = session();
        let descriptor = s.add_section("custom", Some("Web 2.0"));
        assert_eq!(descriptor.id, "web_2_0");
        assert!(s.edit("web_2_0.0", "Sites", Formatting::default()).is_ok());
    }

    #[test]
    fn test_add_summary_keeps_existing_text() {
        let mut s = session();
        s.add_section("summary", None);
        assert_eq!(s.document.text("summary"), Some("Engineer"));

        let mut empty = EditingSession::from_raw(&json!({}));
        empty.add_section("summary", None);
        assert_eq!(empty.document.text("summary"), Some(SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn test_delete_section_drops_data_and_order() {
        let mut s = session();
        assert!(s.delete_section("experience"));
        assert_eq!(ids(&s), vec!["summary"]);
        assert!(s.document.section("experience").is_none());
        assert!(!s.delete_section("experience"));
    }

    #[test]
    fn test_rearrange_rejects_non_permutation() {
        let mut s = session();
        assert!(!s.rearrange(&["experience".to_string()]));
        assert_eq!(ids(&s), vec!["summary", "experience"]);
        assert!(s.rearrange(&["experience".to_string(), "summary".to_string()]));
        assert_eq!(ids(&s), vec!["experience", "summary"]);
    }

    #[test]
    fn test_move_then_page_reflects_new_order() {
        let mut s = session();
        s.move_section("experience", MoveDirection::Up);
        let page = s.page(&SinglePage, 0);
        assert_eq!(page.sections[0].section.id, "experience");
    }

    #[tokio::test]
    async fn test_store_update_and_get() {
        let store = SessionStore::new();
        let id = store.insert(session()).await;

        let applied = store
            .update(id, |s| s.edit("basics.email", "j@x.io", Formatting::default()).is_ok())
            .await;
        assert_eq!(applied, Some(true));
        assert_eq!(
            store.get(id).await.unwrap().document.basics.email.as_deref(),
            Some("j@x.io")
        );
        assert!(store.update(Uuid::new_v4(), |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_and_evict_idle() {
        let store = SessionStore::new();
        let mut idle = session();
        idle.updated_at = Utc::now() - chrono::Duration::days(2);
        let idle_id = store.insert(idle).await;
        let active_id = store.insert(session()).await;
        let gone_id = store.insert(session()).await;

        assert!(store.remove(gone_id).await);
        assert!(!store.remove(gone_id).await);

        let cutoff = Utc::now() - chrono::Duration::days(1);
        assert_eq!(store.evict_idle(cutoff).await, 1);
        assert!(store.get(idle_id).await.is_none());
        assert!(store.get(active_id).await.is_some());
    }
}
