use crate::MAX_JOIN_DEPTH;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// AttributeIdError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AttributeIdError {
    #[error("attribute identifier is empty")]
    Empty,

    #[error("attribute identifier '{id}' has unbalanced brackets")]
    Unbalanced { id: String },

    #[error("attribute identifier '{id}' has an empty or invalid segment")]
    InvalidSegment { id: String },

    #[error("attribute identifier '{id}' has text after its closing bracket")]
    TrailingText { id: String },

    #[error("attribute identifier '{id}' traverses {depth} relations (max {max})")]
    TooDeep { id: String, depth: usize, max: usize },

    #[error("attribute '{id}' is declared as a join but names no relation")]
    NotAJoinPath { id: String },
}

///
/// AttributeId
///
/// Parsed attribute identifier: the relation tables traversed (outermost
/// first) and the leaf column read from the innermost one.
///
/// `title` has no relations; `actors(name)` reads `name` from `actors`;
/// `actors(agency(name))` reads `name` from `agency` via `actors`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeId {
    relations: Vec<String>,
    column: String,
}

impl AttributeId {
    /// Parse the bracket-nested syntax.
    pub fn parse(text: &str) -> Result<Self, AttributeIdError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AttributeIdError::Empty);
        }

        let mut relations = Vec::new();
        let mut rest = text;

        // Peel one `segment(` per level until the leaf column remains.
        while let Some(open) = rest.find('(') {
            let segment = rest[..open].trim();
            if segment.is_empty() || segment.contains(')') {
                return Err(AttributeIdError::InvalidSegment {
                    id: text.to_string(),
                });
            }
            let Some(inner) = rest[open + 1..].strip_suffix(')') else {
                return Err(if rest.contains(')') {
                    AttributeIdError::TrailingText {
                        id: text.to_string(),
                    }
                } else {
                    AttributeIdError::Unbalanced {
                        id: text.to_string(),
                    }
                });
            };

            relations.push(segment.to_string());
            rest = inner;
        }

        let column = rest.trim();
        if column.contains(')') {
            return Err(AttributeIdError::Unbalanced {
                id: text.to_string(),
            });
        }
        if column.is_empty() || column.contains(',') {
            return Err(AttributeIdError::InvalidSegment {
                id: text.to_string(),
            });
        }
        if relations.len() > MAX_JOIN_DEPTH {
            return Err(AttributeIdError::TooDeep {
                id: text.to_string(),
                depth: relations.len(),
                max: MAX_JOIN_DEPTH,
            });
        }

        Ok(Self {
            relations,
            column: column.to_string(),
        })
    }

    /// Identifier for a plain column of the page table.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            relations: Vec::new(),
            column: name.into(),
        }
    }

    /// Identifier from already-validated parts.
    #[must_use]
    pub fn new(relations: Vec<String>, column: impl Into<String>) -> Self {
        Self {
            relations,
            column: column.into(),
        }
    }

    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub const fn is_nested(&self) -> bool {
        !self.relations.is_empty()
    }

    /// Table the leaf column is read from, if the identifier is nested.
    #[must_use]
    pub fn innermost_table(&self) -> Option<&str> {
        self.relations.last().map(String::as_str)
    }

    /// First relation hop away from the page table.
    #[must_use]
    pub fn outermost_relation(&self) -> Option<&str> {
        self.relations.first().map(String::as_str)
    }

    /// Table owning the leaf column, given the page table as the root.
    #[must_use]
    pub fn owning_table<'a>(&'a self, root: &'a str) -> &'a str {
        self.innermost_table().unwrap_or(root)
    }

    /// Same path, different leaf column.
    #[must_use]
    pub fn with_column(&self, column: impl Into<String>) -> Self {
        Self {
            relations: self.relations.clone(),
            column: column.into(),
        }
    }

    /// Re-root the identifier at its outermost relation table.
    ///
    /// `actors(agency(name))` becomes `agency(name)`; plain columns yield `None`.
    #[must_use]
    pub fn strip_outer(&self) -> Option<Self> {
        let (_, rest) = self.relations.split_first()?;

        Some(Self {
            relations: rest.to_vec(),
            column: self.column.clone(),
        })
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for relation in &self.relations {
            write!(f, "{relation}(")?;
        }
        write!(f, "{}", self.column)?;
        for _ in &self.relations {
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl FromStr for AttributeId {
    type Err = AttributeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AttributeId {
    type Error = AttributeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AttributeId> for String {
    fn from(id: AttributeId) -> Self {
        id.to_string()
    }
}
