//! Document normalizer: maps loosely-shaped résumé JSON onto `ResumeDocument`.
//!
//! Producers disagree on field names (`studyType` vs `degree`, `fluency` vs
//! `proficiency`, ...) and on where contact fields live (top level or nested under
//! `basics`). A single synonym table drives one generic pass over every entry, so the
//! mapping rules live in one place.
//!
//! The pass is total and idempotent: malformed input degrades to absent fields, and
//! normalizing an already-normalized document returns it unchanged.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::model::{Basics, ResumeDocument, SectionValue, KNOWN_SECTION_IDS, SEQUENCE_FIELDS};

// ────────────────────────────────────────────────────────────────────────────
// Synonym tables
// ────────────────────────────────────────────────────────────────────────────

/// `(canonical basics field, accepted source names in priority order)`.
const BASICS_SYNONYMS: &[(&str, &[&str])] = &[
    ("name", &["name"]),
    ("title", &["title", "label"]),
    ("email", &["email"]),
    ("phone", &["phone"]),
    ("location", &["location"]),
    ("url", &["url", "website"]),
    ("summary", &["summary"]),
];

/// Reshaping rule for the object entries of one section.
struct EntryRule {
    section: &'static str,
    /// `(canonical, sources)`: the canonical field is copied from the first present source.
    synonyms: &'static [(&'static str, &'static [&'static str])],
    /// `(sequence field, scalar field)`: seeds a one-element sequence when the sequence is absent.
    seed_from_scalar: Option<(&'static str, &'static str)>,
    /// Sequence fields defaulted to `[]` when still absent.
    required_sequences: &'static [&'static str],
    /// Fields whose numeric values are rendered as strings.
    stringify: &'static [&'static str],
}

const ENTRY_RULES: &[EntryRule] = &[
    EntryRule {
        section: "experience",
        synonyms: &[("highlights", &["bullets"])],
        seed_from_scalar: Some(("highlights", "description")),
        required_sequences: &["highlights"],
        stringify: &["startDate", "endDate"],
    },
    EntryRule {
        section: "education",
        synonyms: &[("degree", &["studyType"]), ("school", &["institution"])],
        seed_from_scalar: None,
        required_sequences: &[],
        stringify: &["startDate", "endDate", "year"],
    },
    EntryRule {
        section: "projects",
        synonyms: &[("technologies", &["keywords"])],
        seed_from_scalar: None,
        required_sequences: &[],
        stringify: &["startDate", "endDate"],
    },
    EntryRule {
        section: "languages",
        synonyms: &[("proficiency", &["fluency"])],
        seed_from_scalar: None,
        required_sequences: &[],
        stringify: &[],
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes arbitrary parsed JSON into a canonical `ResumeDocument`.
///
/// `null` and non-object input produce an empty document.
pub fn normalize(raw: &Value) -> ResumeDocument {
    let Some(root) = raw.as_object() else {
        debug!("normalize called with non-object input; returning empty document");
        return ResumeDocument::default();
    };
    let nested = root.get("basics").and_then(Value::as_object);

    let basics = normalize_basics(root, nested);

    let mut sections = BTreeMap::new();
    for id in KNOWN_SECTION_IDS {
        let section = match id {
            "summary" => summary_section(root, nested),
            _ => root.get(id).and_then(normalize_section_value),
        };
        if let Some(section) = section {
            sections.insert(id.to_string(), reshape_section(id, section));
        }
    }

    backfill_achievements(&mut sections);

    ResumeDocument { basics, sections }
}

// ────────────────────────────────────────────────────────────────────────────
// Basics
// ────────────────────────────────────────────────────────────────────────────

fn normalize_basics(root: &Map<String, Value>, nested: Option<&Map<String, Value>>) -> Basics {
    let mut basics = Basics::default();
    for (field, sources) in BASICS_SYNONYMS {
        let value = nested
            .and_then(|b| first_scalar(b, sources))
            .or_else(|| first_scalar(root, sources));
        if let Some(slot) = basics.field_mut(field) {
            *slot = value;
        }
    }
    basics
}

/// First source field holding a usable scalar, rendered as a string.
fn first_scalar(map: &Map<String, Value>, sources: &[&str]) -> Option<String> {
    sources.iter().find_map(|key| map.get(*key).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => location_text(map),
        _ => None,
    }
}

/// `{city, region}` location objects become `"city, region"`.
fn location_text(map: &Map<String, Value>) -> Option<String> {
    let city = map.get("city").and_then(Value::as_str).filter(|s| !s.is_empty())?;
    match map.get("region").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        Some(region) => Some(format!("{city}, {region}")),
        None => Some(city.to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// The summary section reads its scalar sources the same way `basics.summary` does,
/// so a summary that only survives in basics is rebuilt identically on the next pass.
fn summary_section(root: &Map<String, Value>, nested: Option<&Map<String, Value>>) -> Option<SectionValue> {
    let top_level = root.get("summary").filter(|v| is_present(v));
    if let Some(section) = top_level.and_then(normalize_section_value) {
        return Some(section);
    }
    top_level
        .and_then(scalar_text)
        .or_else(|| nested.and_then(|b| b.get("summary")).and_then(scalar_text))
        .map(SectionValue::Text)
}

/// Coerces a raw section value into text or entries. Bare objects become a
/// one-element list; empty values and other kinds are dropped.
fn normalize_section_value(value: &Value) -> Option<SectionValue> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(SectionValue::Text(s.clone())),
        Value::Array(items) => {
            let entries: Vec<Value> = items.iter().filter(|v| !v.is_null()).cloned().collect();
            (!entries.is_empty()).then_some(SectionValue::Entries(entries))
        }
        Value::Object(map) if !map.is_empty() => Some(SectionValue::Entries(vec![value.clone()])),
        _ => None,
    }
}

fn reshape_section(id: &str, section: SectionValue) -> SectionValue {
    let SectionValue::Entries(entries) = section else {
        return section;
    };
    let rule = ENTRY_RULES.iter().find(|r| r.section == id);

    let entries = entries
        .into_iter()
        .map(|entry| {
            let entry = if id == "skills" { reshape_skill(entry) } else { entry };
            match entry {
                Value::Object(mut map) => {
                    if let Some(rule) = rule {
                        apply_rule(rule, &mut map);
                    }
                    coerce_sequences(&mut map);
                    if let Some(rule) = rule {
                        for field in rule.required_sequences {
                            map.entry(field.to_string())
                                .or_insert_with(|| Value::Array(Vec::new()));
                        }
                    }
                    Value::Object(map)
                }
                other => other,
            }
        })
        .collect();

    SectionValue::Entries(entries)
}

fn apply_rule(rule: &EntryRule, map: &mut Map<String, Value>) {
    for (canonical, sources) in rule.synonyms {
        if map.get(*canonical).is_some_and(is_present) {
            continue;
        }
        if let Some(found) = sources
            .iter()
            .find_map(|s| map.get(*s).filter(|v| is_present(v)).cloned())
        {
            map.insert(canonical.to_string(), found);
        }
    }

    if let Some((sequence, scalar)) = rule.seed_from_scalar {
        if !map.get(sequence).is_some_and(is_present) {
            if let Some(seed) = map.get(scalar).filter(|v| is_present(v)).cloned() {
                map.insert(sequence.to_string(), Value::Array(vec![seed]));
            }
        }
    }

    for field in rule.stringify {
        if let Some(Value::Number(n)) = map.get(*field) {
            let text = n.to_string();
            map.insert(field.to_string(), Value::String(text));
        }
    }
}

/// Single values in sequence fields become one-element sequences; empty ones are removed.
fn coerce_sequences(map: &mut Map<String, Value>) {
    for field in SEQUENCE_FIELDS {
        match map.get(field) {
            None | Some(Value::Array(_)) => {}
            Some(v) if !is_present(v) => {
                map.remove(field);
            }
            Some(v) => {
                let single = v.clone();
                map.insert(field.to_string(), Value::Array(vec![single]));
            }
        }
    }
}

/// `{name, keywords}` → `{category, items}`; a lone `{name}` collapses to its name.
fn reshape_skill(entry: Value) -> Value {
    let Value::Object(map) = &entry else {
        return entry;
    };
    if map.get("category").is_some_and(is_present) {
        return entry;
    }
    let Some(name) = map.get("name").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return entry;
    };

    match map.get("keywords").filter(|v| is_present(v)) {
        Some(keywords) => {
            let items = match keywords {
                Value::Array(items) => items.clone(),
                single => vec![single.clone()],
            };
            let mut reshaped = Map::new();
            reshaped.insert("category".to_string(), Value::String(name.to_string()));
            reshaped.insert("items".to_string(), Value::Array(items));
            Value::Object(reshaped)
        }
        None => Value::String(name.to_string()),
    }
}

/// Synthesizes `achievements` from `awards` when only the latter exists.
fn backfill_achievements(sections: &mut BTreeMap<String, SectionValue>) {
    if sections.contains_key("achievements") {
        return;
    }
    let Some(SectionValue::Entries(awards)) = sections.get("awards") else {
        return;
    };

    let achievements: Vec<Value> = awards
        .iter()
        .map(|award| match award {
            Value::Object(a) => {
                let mut out = Map::new();
                for (from, to) in [
                    ("title", "title"),
                    ("date", "date"),
                    ("awarder", "organization"),
                    ("summary", "description"),
                ] {
                    if let Some(v) = a.get(from).filter(|v| !v.is_null()) {
                        out.insert(to.to_string(), v.clone());
                    }
                }
                Value::Object(out)
            }
            other => {
                let mut out = Map::new();
                out.insert("title".to_string(), other.clone());
                Value::Object(out)
            }
        })
        .collect();

    sections.insert("achievements".to_string(), SectionValue::Entries(achievements));
}
