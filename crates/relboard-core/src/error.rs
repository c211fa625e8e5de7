use crate::{
    attribute::AttributeIdError,
    mutation::{PartialWriteError, ValidationError},
    schema::SchemaInferenceError,
    service::TransportError,
    value::DocumentError,
};
use relboard_config::ConfigError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// ErrorClass
///
/// Coarse, stable classification used by the session warning surface.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Validation,
    Transport,
    PartialWrite,
    SchemaInference,
    Input,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::PartialWrite => "partial_write",
            Self::SchemaInference => "schema_inference",
            Self::Input => "input",
        };
        write!(f, "{label}")
    }
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    PartialWrite(#[from] PartialWriteError),

    #[error(transparent)]
    SchemaInference(#[from] SchemaInferenceError),

    #[error(transparent)]
    Attribute(#[from] AttributeIdError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no page with id '{page_id}'")]
    UnknownPage { page_id: String },
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Transport(_) => ErrorClass::Transport,
            Self::PartialWrite(_) => ErrorClass::PartialWrite,
            Self::SchemaInference(_) => ErrorClass::SchemaInference,
            Self::Attribute(_) | Self::Document(_) | Self::Config(_) | Self::UnknownPage { .. } => {
                ErrorClass::Input
            }
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}
