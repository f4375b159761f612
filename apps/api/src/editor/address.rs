use std::fmt;
use std::str::FromStr;

use crate::editor::EditError;

/// One segment of an edit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// The segment as an object key. Index steps render as their decimal form,
    /// which keeps numeric-looking field names addressable.
    pub fn as_key(&self) -> String {
        match self {
            PathStep::Key(key) => key.clone(),
            PathStep::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => f.write_str(key),
            PathStep::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed dotted address such as `experience.2.highlights.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAddress {
    steps: Vec<PathStep>,
}

impl EditAddress {
    pub fn from_steps(steps: Vec<PathStep>) -> Result<Self, EditError> {
        if steps.is_empty() {
            return Err(EditError::EmptyAddress);
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
}

impl FromStr for EditAddress {
    type Err = EditError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EditError::EmptyAddress);
        }

        let steps = raw
            .split('.')
            .enumerate()
            .map(|(position, segment)| {
                if segment.is_empty() {
                    return Err(EditError::EmptySegment { position });
                }
                if segment.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(index) = segment.parse::<usize>() {
                        return Ok(PathStep::Index(index));
                    }
                }
                Ok(PathStep::Key(segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_steps(steps)
    }
}

impl fmt::Display for EditAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
