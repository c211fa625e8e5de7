//! Deployment-time configuration for relboard dashboards.
//!
//! A dashboard is an ordered list of pages, each bound to one relational
//! table and a declared attribute list. This crate only owns the serde
//! surface and structural validation; attribute identifiers are parsed and
//! resolved against the live schema by `relboard-core`.

mod error;
mod model;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use model::{
    AttributeConfig, AttributeType, DashboardConfig, DisplayMode, PageConfig, ScopeConfig,
};

use std::{fs, path::Path};

impl DashboardConfig {
    /// Parse and validate a dashboard configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate a dashboard configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Load a configuration file, dispatching on its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.unwrap_or_default().to_string(),
            }),
        }
    }

    /// Look up a page by its page id.
    #[must_use]
    pub fn page(&self, page_id: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|page| page.page_id() == page_id)
    }

    /// Check structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::BTreeSet::new();

        for page in &self.pages {
            if page.table_id.trim().is_empty() {
                return Err(ConfigError::EmptyIdentifier {
                    page: page.name.clone(),
                    what: "table_id",
                });
            }
            if !seen.insert(page.page_id()) {
                return Err(ConfigError::DuplicatePageId {
                    page_id: page.page_id().to_string(),
                });
            }
            if page.attributes.is_empty() {
                return Err(ConfigError::EmptyAttributes {
                    page_id: page.page_id().to_string(),
                });
            }

            for attribute in &page.attributes {
                if attribute.id.trim().is_empty() {
                    return Err(ConfigError::EmptyIdentifier {
                        page: page.name.clone(),
                        what: "attribute id",
                    });
                }
                if attribute.kind == AttributeType::Enum && attribute.enum_options.is_empty() {
                    return Err(ConfigError::EmptyEnumOptions {
                        page_id: page.page_id().to_string(),
                        attribute: attribute.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
