use crate::attribute::{AttributeId, AttributeIdError};
use relboard_config::{AttributeConfig, AttributeType};

///
/// AttributeKind
///
/// Logical type of an attribute; drives defaults and UI input choice.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    Text,
    LongText,
    Date,
    Bool,
    Enum { options: Vec<String> },
    Join,
}

///
/// AttributeDescriptor
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeDescriptor {
    pub id: AttributeId,
    pub label: String,
    pub required: bool,
    pub readonly: bool,
    pub hidden: bool,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    /// Key column appended during resolution; never shown, never required.
    #[must_use]
    pub fn synthetic_key(id: AttributeId) -> Self {
        Self {
            label: id.to_string(),
            id,
            required: false,
            readonly: false,
            hidden: true,
            kind: AttributeKind::Text,
        }
    }

    #[must_use]
    pub const fn is_join(&self) -> bool {
        matches!(self.kind, AttributeKind::Join)
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !self.readonly
    }
}

impl TryFrom<&AttributeConfig> for AttributeDescriptor {
    type Error = AttributeIdError;

    fn try_from(config: &AttributeConfig) -> Result<Self, Self::Error> {
        let id = AttributeId::parse(&config.id)?;

        // nested identifiers are always joins, whatever the declared type
        let kind = match config.kind {
            _ if id.is_nested() => AttributeKind::Join,
            AttributeType::Join => {
                return Err(AttributeIdError::NotAJoinPath {
                    id: config.id.clone(),
                });
            }
            AttributeType::Text => AttributeKind::Text,
            AttributeType::LongText => AttributeKind::LongText,
            AttributeType::Date => AttributeKind::Date,
            AttributeType::Bool => AttributeKind::Bool,
            AttributeType::Enum => AttributeKind::Enum {
                options: config.enum_options.clone(),
            },
        };

        Ok(Self {
            label: config.display_label().to_string(),
            id,
            required: config.required,
            readonly: config.readonly,
            hidden: config.hidden,
            kind,
        })
    }
}
