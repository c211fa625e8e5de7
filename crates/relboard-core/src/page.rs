use crate::attribute::{AttributeDescriptor, AttributeIdError};
use relboard_config::{DisplayMode, PageConfig};

///
/// Page
///
/// Runtime form of one configured page: attribute identifiers are parsed,
/// everything else is carried over from configuration unchanged.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page {
    pub page_id: String,
    pub name: String,
    pub table_id: String,
    pub mode: DisplayMode,
    pub readonly: bool,
    pub attributes: Vec<AttributeDescriptor>,
    pub triggers: Vec<String>,
}

impl Page {
    /// Fixed row window for this page's display mode.
    #[must_use]
    pub const fn window_size(&self) -> u64 {
        self.mode.window_size()
    }

    #[must_use]
    pub fn attribute(&self, id: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|attr| attr.id.to_string() == id)
    }
}

impl TryFrom<&PageConfig> for Page {
    type Error = AttributeIdError;

    fn try_from(config: &PageConfig) -> Result<Self, Self::Error> {
        let attributes = config
            .attributes
            .iter()
            .map(AttributeDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            page_id: config.page_id().to_string(),
            name: config.name.clone(),
            table_id: config.table_id.clone(),
            mode: config.mode,
            readonly: config.readonly,
            attributes,
            triggers: config.triggers.clone(),
        })
    }
}
