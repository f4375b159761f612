use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Section ids the normalizer recognizes, in canonical display order.
pub const KNOWN_SECTION_IDS: [&str; 12] = [
    "summary",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "languages",
    "achievements",
    "awards",
    "interests",
    "publications",
    "volunteer",
];

/// Entry sub-fields that must always hold a sequence.
pub const SEQUENCE_FIELDS: [&str; 4] = ["highlights", "items", "technologies", "keywords"];

/// Contact block of a résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Basics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Basics {
    pub const FIELDS: [&'static str; 7] =
        ["name", "title", "email", "phone", "location", "url", "summary"];

    pub fn is_empty(&self) -> bool {
        Self::FIELDS.iter().all(|f| self.field(f).is_none())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        let slot = match name {
            "name" => &self.name,
            "title" => &self.title,
            "email" => &self.email,
            "phone" => &self.phone,
            "location" => &self.location,
            "url" => &self.url,
            "summary" => &self.summary,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Mutable slot for a known basics field; `None` for anything else.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "name" => Some(&mut self.name),
            "title" => Some(&mut self.title),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "location" => Some(&mut self.location),
            "url" => Some(&mut self.url),
            "summary" => Some(&mut self.summary),
            _ => None,
        }
    }
}

/// A section is either free text or an ordered list of entries. Never a bare object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Text(String),
    Entries(Vec<Value>),
}

impl SectionValue {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionValue::Text(text) => text.trim().is_empty(),
            SectionValue::Entries(entries) => entries.is_empty(),
        }
    }
}

/// Canonical in-memory résumé.
///
/// Serializes as one JSON object: `basics` (omitted when empty) followed by one key
/// per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default, skip_serializing_if = "Basics::is_empty")]
    pub basics: Basics,
    #[serde(flatten)]
    pub sections: BTreeMap<String, SectionValue>,
}

impl ResumeDocument {
    pub fn section(&self, id: &str) -> Option<&SectionValue> {
        self.sections.get(id)
    }

    pub fn entries(&self, id: &str) -> Option<&[Value]> {
        match self.sections.get(id) {
            Some(SectionValue::Entries(entries)) => Some(entries),
            _ => None,
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.sections.get(id) {
            Some(SectionValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn has_content(&self, id: &str) -> bool {
        self.sections.get(id).is_some_and(|s| !s.is_empty())
    }
}

/// Display title for a section id. Unknown ids are title-cased from their snake_case form.
pub fn default_title(id: &str) -> String {
    let known = match id {
        "summary" => "Summary",
        "experience" => "Experience",
        "education" => "Education",
        "skills" => "Skills",
        "projects" => "Projects",
        "certifications" => "Certifications",
        "languages" => "Languages",
        "achievements" => "Achievements",
        "awards" => "Awards",
        "interests" => "Interests",
        "publications" => "Publications",
        "volunteer" => "Volunteer Experience",
        "references" => "References",
        "custom" => "Custom Section",
        _ => "",
    };
    if !known.is_empty() {
        return known.to_string();
    }

    id.replace('_', " ")
        .split_whitespace()
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Starter entry appended when a user adds a section of the given type.
pub fn placeholder_entry(section_type: &str) -> Value {
    match section_type {
        "experience" => json!({
            "title": "New Position",
            "company": "Company Name",
            "location": "Location",
            "startDate": "Start",
            "endDate": "End",
            "highlights": ["Responsibility or achievement"],
        }),
        "education" => json!({
            "degree": "Degree Name",
            "school": "School Name",
            "location": "Location",
            "year": "Graduation Year",
        }),
        "skills" => json!("New Skill"),
        "projects" => json!({
            "name": "Project Name",
            "description": "Project Description",
            "technologies": ["Technology 1", "Technology 2"],
            "link": "https://project-link.com",
        }),
        "certifications" => json!({
            "name": "Certification Name",
            "issuer": "Issuing Organization",
            "date": "Issue Date",
            "link": "https://certification-link.com",
        }),
        "languages" => json!({
            "language": "Language Name",
            "proficiency": "Proficiency Level",
        }),
        "interests" => json!("New Interest"),
        "references" => json!({
            "name": "Reference Name",
            "position": "Position",
            "company": "Company",
            "contact": "Contact Information",
        }),
        "publications" => json!({
            "title": "Publication Title",
            "publisher": "Publisher",
            "date": "Publication Date",
            "link": "https://publication-link.com",
        }),
        "volunteer" => json!({
            "organization": "Organization Name",
            "role": "Volunteer Role",
            "startDate": "Start",
            "endDate": "End",
            "description": "Description of volunteer work",
        }),
        "achievements" | "awards" => json!({
            "title": "Achievement Title",
            "organization": "Organization",
            "date": "Date",
            "description": "Description of achievement",
        }),
        "custom" => json!("Custom content"),
        _ => json!("New Item"),
    }
}

/// Placeholder text used when a summary section is added to a document without one.
pub const SUMMARY_PLACEHOLDER: &str = "Write a short professional summary";
