//! Plain-text résumé rendering.
//!
//! Layout: name and title, a contact block, then every section in the session's order
//! under an uppercase heading underlined with dashes. Inline emphasis markers are
//! stripped; `YYYY-MM` dates are written out as `Month YYYY`.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::document::{ResumeDocument, SectionValue};
use crate::editor::strip_markers;
use crate::layout::SectionDescriptor;

pub fn render_plain_text(document: &ResumeDocument, order: &[SectionDescriptor]) -> String {
    let mut out = String::new();
    let basics = &document.basics;

    if let Some(name) = &basics.name {
        push_line(&mut out, name);
    }
    if let Some(title) = &basics.title {
        push_line(&mut out, title);
    }
    if !out.is_empty() {
        out.push('\n');
    }

    let contact: Vec<(&str, &Option<String>)> = vec![
        ("Email", &basics.email),
        ("Phone", &basics.phone),
        ("Location", &basics.location),
        ("Website", &basics.url),
    ];
    if contact.iter().any(|(_, v)| v.is_some()) {
        push_heading(&mut out, "Contact Information");
        for (label, value) in contact {
            if let Some(value) = value {
                push_line(&mut out, &format!("{label}: {value}"));
            }
        }
        out.push('\n');
    }

    for descriptor in order {
        let Some(section) = document.section(&descriptor.id) else {
            continue;
        };
        if section.is_empty() {
            continue;
        }
        push_heading(&mut out, &descriptor.title);
        match section {
            SectionValue::Text(text) => {
                push_line(&mut out, text);
                out.push('\n');
            }
            SectionValue::Entries(entries) => render_entries(&mut out, &descriptor.id, entries),
        }
    }

    out
}

/// `2021-03` → `March 2021`; `present` → `Present`; anything else unchanged.
pub fn format_display_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("present") {
        return "Present".to_string();
    }

    let mut parts = raw.splitn(3, '-');
    let year = parts.next().and_then(|y| y.parse::<i32>().ok());
    let month = parts.next().and_then(|m| m.parse::<u32>().ok());
    match (year, month) {
        (Some(year), Some(month)) => NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

fn render_entries(out: &mut String, section_id: &str, entries: &[Value]) {
    let list_style = matches!(section_id, "skills" | "languages" | "interests");

    for entry in entries {
        match entry {
            Value::String(s) => push_bullet(out, s),
            Value::Object(map) if list_style => push_bullet(out, &list_item(section_id, map)),
            Value::Object(map) => {
                render_object_entry(out, section_id, map);
                out.push('\n');
            }
            other => push_bullet(out, &other.to_string()),
        }
    }
    if list_style || entries.iter().all(Value::is_string) {
        out.push('\n');
    }
}

fn list_item(section_id: &str, map: &Map<String, Value>) -> String {
    match section_id {
        "skills" => {
            let label = field(map, "category").or_else(|| field(map, "name")).unwrap_or_default();
            match joined(map, "items").or_else(|| joined(map, "keywords")) {
                Some(items) if !label.is_empty() => format!("{label}: {items}"),
                Some(items) => items,
                None => label.to_string(),
            }
        }
        "languages" => {
            let language = field(map, "language").unwrap_or("Language");
            match field(map, "proficiency") {
                Some(level) => format!("{language}: {level}"),
                None => language.to_string(),
            }
        }
        _ => field(map, "name").unwrap_or_default().to_string(),
    }
}

fn render_object_entry(out: &mut String, section_id: &str, map: &Map<String, Value>) {
    match section_id {
        "experience" | "volunteer" => {
            let role = field(map, "title")
                .or_else(|| field(map, "position"))
                .or_else(|| field(map, "role"));
            let place = field(map, "company").or_else(|| field(map, "organization"));
            match (role, place) {
                (Some(role), Some(place)) => push_line(out, &format!("{role} at {place}")),
                (Some(one), None) | (None, Some(one)) => push_line(out, one),
                (None, None) => {}
            }
            push_date_range(out, map);
            if let Some(location) = field(map, "location") {
                push_line(out, &format!("Location: {location}"));
            }
        }
        "education" => {
            if let Some(degree) = field(map, "degree") {
                match field(map, "area") {
                    Some(area) => push_line(out, &format!("{degree} in {area}")),
                    None => push_line(out, degree),
                }
            }
            if let Some(school) = field(map, "school") {
                push_line(out, school);
            }
            if !push_date_range(out, map) {
                if let Some(year) = field(map, "year") {
                    push_line(out, year);
                }
            }
            if let Some(gpa) = field(map, "gpa") {
                push_line(out, &format!("GPA: {gpa}"));
            }
        }
        _ => {
            if let Some(headline) = field(map, "title").or_else(|| field(map, "name")) {
                push_line(out, headline);
            }
            push_date_range(out, map);
            for (key, label) in [
                ("issuer", "Issuer"),
                ("organization", "Organization"),
                ("publisher", "Publisher"),
            ] {
                if let Some(value) = field(map, key) {
                    push_line(out, &format!("{label}: {value}"));
                }
            }
            if let Some(date) = field(map, "date") {
                push_line(out, &format!("Date: {}", format_display_date(date)));
            }
            if let Some(link) = field(map, "link").or_else(|| field(map, "url")) {
                push_line(out, &format!("URL: {link}"));
            }
        }
    }

    if let Some(description) = field(map, "description").or_else(|| field(map, "summary")) {
        let seeded = matches!(
            map.get("highlights").and_then(Value::as_array).map(Vec::as_slice),
            Some([only]) if only.as_str() == Some(description)
        );
        if !seeded {
            push_line(out, description);
        }
    }
    if let Some(list) = joined(map, "technologies") {
        push_line(out, &format!("Technologies: {list}"));
    }
    if let Some(highlights) = map.get("highlights").and_then(Value::as_array) {
        for item in highlights.iter().filter_map(Value::as_str) {
            push_bullet(out, item);
        }
    }
}

/// Writes `start - end` when the entry has either date; a missing end date reads
/// `Present`. Returns whether a line was written.
fn push_date_range(out: &mut String, map: &Map<String, Value>) -> bool {
    let start = field(map, "startDate").map(format_display_date);
    let end = field(map, "endDate").map(format_display_date);
    if start.is_none() && end.is_none() {
        return false;
    }
    let end = end.unwrap_or_else(|| "Present".to_string());
    push_line(out, &format!("{} - {end}", start.unwrap_or_default()));
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn joined(map: &Map<String, Value>, key: &str) -> Option<String> {
    let items: Vec<String> = map
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(strip_markers)
        .collect();
    (!items.is_empty()).then(|| items.join(", "))
}

fn push_heading(out: &mut String, title: &str) {
    let heading = title.to_uppercase();
    let rule = "-".repeat(heading.chars().count());
    out.push_str(&heading);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(&strip_markers(text));
    out.push('\n');
}

fn push_bullet(out: &mut String, text: &str) {
    out.push_str("• ");
    push_line(out, text);
}
