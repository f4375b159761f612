//! Address resolution and leaf assignment.
//!
//! The first step selects `basics` or a section; remaining steps walk the section's
//! entries as plain JSON. Walking stops one step short so the final step can be assigned.

use serde_json::Value;
use tracing::debug;

use crate::document::model::{Basics, ResumeDocument, SectionValue, SEQUENCE_FIELDS};
use crate::editor::address::{EditAddress, PathStep};
use crate::editor::formatting::Formatting;
use crate::editor::EditError;

/// Applies one edit, returning the original document unchanged when the address
/// cannot be resolved.
pub fn edit(
    document: &ResumeDocument,
    address: &str,
    new_value: &str,
    formatting: Formatting,
) -> ResumeDocument {
    match try_edit(document, address, new_value, formatting) {
        Ok(updated) => updated,
        Err(e) => {
            debug!("edit at '{address}' ignored: {e}");
            document.clone()
        }
    }
}

/// Like `edit`, but reports why an address could not be resolved.
pub fn try_edit(
    document: &ResumeDocument,
    address: &str,
    new_value: &str,
    formatting: Formatting,
) -> Result<ResumeDocument, EditError> {
    let address: EditAddress = address.parse()?;
    let stored = formatting.apply(new_value);

    let mut updated = document.clone();
    assign(&mut updated, &address, stored)?;
    Ok(updated)
}

/// Reads the string stored at `address`, if the address resolves to text.
pub fn read_field(document: &ResumeDocument, address: &str) -> Option<String> {
    let address: EditAddress = address.parse().ok()?;
    let (first, rest) = address.steps().split_first()?;

    match (first, document.sections.get(&first.as_key())) {
        (PathStep::Key(k), _) if k == "basics" => match rest {
            [field] => document.basics.field(&field.as_key()).map(String::from),
            _ => None,
        },
        (_, Some(SectionValue::Text(text))) if rest.is_empty() => Some(text.clone()),
        (_, Some(SectionValue::Entries(entries))) => {
            let (head, tail) = rest.split_first()?;
            let PathStep::Index(i) = head else {
                return None;
            };
            let mut node = entries.get(*i)?;
            for step in tail {
                node = descend(node, step)?;
            }
            node.as_str().map(String::from)
        }
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn assign(document: &mut ResumeDocument, address: &EditAddress, value: String) -> Result<(), EditError> {
    let (first, rest) = address
        .steps()
        .split_first()
        .ok_or(EditError::EmptyAddress)?;

    if let PathStep::Key(key) = first {
        if key == "basics" {
            return assign_basics(&mut document.basics, rest, value);
        }
    }
    let PathStep::Key(section_id) = first else {
        return Err(EditError::NotAContainer {
            segment: first.to_string(),
        });
    };

    if rest.is_empty() {
        return match document.sections.get(section_id) {
            Some(SectionValue::Entries(_)) => Err(EditError::WouldReplaceContainer {
                address: address.to_string(),
            }),
            _ => {
                document
                    .sections
                    .insert(section_id.clone(), SectionValue::Text(value));
                Ok(())
            }
        };
    }

    match document.sections.get_mut(section_id) {
        Some(SectionValue::Entries(entries)) => {
            let mut node = Value::Array(std::mem::take(entries));
            let result = assign_in_value(&mut node, rest, value, address);
            if let Value::Array(items) = node {
                *entries = items;
            }
            result
        }
        Some(SectionValue::Text(_)) => Err(EditError::NotAContainer {
            segment: section_id.clone(),
        }),
        None => Err(EditError::MissingSegment {
            segment: section_id.clone(),
        }),
    }
}

fn assign_basics(basics: &mut Basics, rest: &[PathStep], value: String) -> Result<(), EditError> {
    match rest {
        [] => Err(EditError::WouldReplaceContainer {
            address: "basics".to_string(),
        }),
        [field] => {
            let name = field.as_key();
            let slot = basics
                .field_mut(&name)
                .ok_or(EditError::UnknownBasicsField(name))?;
            *slot = Some(value);
            Ok(())
        }
        [field, ..] => Err(EditError::NotAContainer {
            segment: format!("basics.{field}"),
        }),
    }
}

fn assign_in_value(
    root: &mut Value,
    steps: &[PathStep],
    value: String,
    address: &EditAddress,
) -> Result<(), EditError> {
    let (last, parents) = steps.split_last().ok_or(EditError::EmptyAddress)?;

    let mut current = root;
    for step in parents {
        current = descend_mut(current, step)?;
    }

    match current {
        Value::Object(map) => {
            let key = last.as_key();
            if SEQUENCE_FIELDS.contains(&key.as_str()) {
                return Err(EditError::SequenceField(key));
            }
            if map.get(&key).is_some_and(is_container) {
                return Err(EditError::WouldReplaceContainer {
                    address: address.to_string(),
                });
            }
            map.insert(key, Value::String(value));
            Ok(())
        }
        Value::Array(items) => {
            let PathStep::Index(index) = last else {
                return Err(EditError::MissingSegment {
                    segment: last.to_string(),
                });
            };
            let len = items.len();
            let slot = items
                .get_mut(*index)
                .ok_or(EditError::IndexOutOfRange { index: *index, len })?;
            if is_container(slot) {
                return Err(EditError::WouldReplaceContainer {
                    address: address.to_string(),
                });
            }
            *slot = Value::String(value);
            Ok(())
        }
        _ => Err(EditError::NotAContainer {
            segment: last.to_string(),
        }),
    }
}

fn descend_mut<'a>(node: &'a mut Value, step: &PathStep) -> Result<&'a mut Value, EditError> {
    match node {
        Value::Array(items) => match step {
            PathStep::Index(i) => {
                let len = items.len();
                items
                    .get_mut(*i)
                    .ok_or(EditError::IndexOutOfRange { index: *i, len })
            }
            PathStep::Key(k) => Err(EditError::MissingSegment { segment: k.clone() }),
        },
        Value::Object(map) => map
            .get_mut(&step.as_key())
            .ok_or_else(|| EditError::MissingSegment {
                segment: step.to_string(),
            }),
        _ => Err(EditError::NotAContainer {
            segment: step.to_string(),
        }),
    }
}

fn descend<'a>(node: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match (node, step) {
        (Value::Array(items), PathStep::Index(i)) => items.get(*i),
        (Value::Object(map), step) => map.get(&step.as_key()),
        _ => None,
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}
