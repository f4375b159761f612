use serde::{Deserialize, Serialize};

const BOLD_MARKERS: [&str; 4] = ["<strong>", "</strong>", "<b>", "</b>"];
const ITALIC_MARKERS: [&str; 4] = ["<em>", "</em>", "<i>", "</i>"];
const UNDERLINE_MARKERS: [&str; 2] = ["<u>", "</u>"];

/// Inline emphasis applied to an edited value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Formatting {
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }

    /// Wraps `text` in markup. Nesting is fixed: bold outermost, underline innermost.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        if self.is_plain() {
            return out;
        }
        if self.underline {
            out = format!("<u>{out}</u>");
        }
        if self.italic {
            out = format!("<em>{out}</em>");
        }
        if self.bold {
            out = format!("<strong>{out}</strong>");
        }
        out
    }
}

/// A stored value split back into plain text and the formatting it carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedText {
    pub text: String,
    pub formatting: Formatting,
}

impl FormattedText {
    /// Only the markers `Formatting::apply` emits (plus their `<b>`/`<i>` aliases)
    /// are recognized; any other markup is left in the text.
    pub fn parse(stored: &str) -> Self {
        let formatting = Formatting {
            bold: stored.contains("<strong>") || stored.contains("<b>"),
            italic: stored.contains("<em>") || stored.contains("<i>"),
            underline: stored.contains("<u>"),
        };
        Self {
            text: strip_markers(stored),
            formatting,
        }
    }
}

/// Removes every emphasis marker from `stored`.
pub fn strip_markers(stored: &str) -> String {
    if !stored.contains('<') {
        return stored.to_string();
    }
    BOLD_MARKERS
        .iter()
        .chain(ITALIC_MARKERS.iter())
        .chain(UNDERLINE_MARKERS.iter())
        .fold(stored.to_string(), |acc, marker| acc.replace(marker, ""))
}
