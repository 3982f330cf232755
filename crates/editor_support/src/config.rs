//! DOM vocabulary shared by the page and the authoring tool.
//!
//! Defaults match the attribute and class names the authoring tool and the
//! page's block library agree on. Every table is `#[serde(default)]`, so a
//! config file only needs the names it overrides.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    pub attributes: AttributeNames,
    pub classes: ClassNames,
    pub filters: FilterValues,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributeNames {
    pub resource: String,
    pub richtext_resource: String,
    pub filter: String,
    pub model: String,
    pub tab_id: String,
    pub template: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            resource: "data-aue-resource".to_string(),
            richtext_resource: "data-richtext-resource".to_string(),
            filter: "data-aue-filter".to_string(),
            model: "data-aue-model".to_string(),
            tab_id: "data-tab-id".to_string(),
            template: "data-aem-template".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub block: String,
    pub section: String,
    pub tabs: String,
    pub tabpanel: String,
    pub carousel: String,
    pub panel_container: String,
    pub template_banner: String,
    /// Body `class` attribute prefix marking article pages.
    pub article_prefix: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            block: "block".to_string(),
            section: "section".to_string(),
            tabs: "tabs".to_string(),
            tabpanel: "tabpanel".to_string(),
            carousel: "carousel".to_string(),
            panel_container: "panel-container".to_string(),
            template_banner: "template-banner".to_string(),
            article_prefix: "article".to_string(),
        }
    }
}

/// Values written into the editor annotation attributes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterValues {
    pub page: String,
    pub article_section: String,
    pub template_model: String,
}

impl Default for FilterValues {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            article_section: "article-section".to_string(),
            template_model: "page-metadata".to_string(),
        }
    }
}
