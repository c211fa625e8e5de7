use serde::{Deserialize, Serialize};

///
/// DashboardConfig
///
/// Top-level configuration: one dashboard, many pages.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub scope: Option<ScopeConfig>,

    #[serde(default, alias = "views")]
    pub pages: Vec<PageConfig>,
}

///
/// ScopeConfig
///
/// Row scope applied to every page: reads filter on `column = value`,
/// main-table writes stamp the same pair.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScopeConfig {
    pub column: String,
    pub value: String,
}

///
/// PageConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PageConfig {
    #[serde(alias = "label")]
    pub name: String,

    #[serde(default, alias = "view_id")]
    pub page_id: Option<String>,

    pub table_id: String,

    #[serde(default)]
    pub mode: DisplayMode,

    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,

    /// Named UI triggers; passed through untouched.
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl PageConfig {
    /// Page id used for routing and caching; falls back to the table id.
    #[must_use]
    pub fn page_id(&self) -> &str {
        self.page_id.as_deref().unwrap_or(&self.table_id)
    }
}

///
/// AttributeConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AttributeConfig {
    pub id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default, rename = "type")]
    pub kind: AttributeType,

    #[serde(default, alias = "enumOptions")]
    pub enum_options: Vec<String>,
}

impl AttributeConfig {
    /// Label shown to users; the id when no label was configured.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

///
/// AttributeType
///
/// Unrecognised type strings decode as `Text`.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "String", rename_all = "UPPERCASE")]
pub enum AttributeType {
    #[default]
    Text,
    LongText,
    Date,
    Bool,
    Enum,
    Join,
}

impl From<String> for AttributeType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "LONGTEXT" => Self::LongText,
            "DATE" => Self::Date,
            "BOOL" => Self::Bool,
            "ENUM" => Self::Enum,
            "JOIN" => Self::Join,
            _ => Self::Text,
        }
    }
}

///
/// DisplayMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Single,
    Card,
    #[default]
    List,
}

impl DisplayMode {
    /// Fixed pagination window for this mode.
    #[must_use]
    pub const fn window_size(self) -> u64 {
        match self {
            Self::Single => 1,
            Self::Card => 10,
            Self::List => 20,
        }
    }
}
