use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format '{extension}' (expected toml or json)")]
    UnsupportedFormat { extension: String },

    #[error("duplicate page id '{page_id}'")]
    DuplicatePageId { page_id: String },

    #[error("page '{page_id}' declares no attributes")]
    EmptyAttributes { page_id: String },

    #[error("enum attribute '{attribute}' on page '{page_id}' has no options")]
    EmptyEnumOptions { page_id: String, attribute: String },

    #[error("page '{page}' has an empty {what}")]
    EmptyIdentifier { page: String, what: &'static str },
}
