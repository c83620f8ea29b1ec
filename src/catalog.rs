//! Read-only colour palette and template registry.

use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::menu;
use crate::models::session::Rgb;

/// A palette colour offered in the colour menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorOption {
    /// Menu label.
    pub label: String,
    /// Fill colour.
    pub rgb: Rgb,
}

/// A preset template offered in the template menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOption {
    /// Menu label.
    pub label: String,
    /// Absolute or templates-root-relative image path.
    pub path: PathBuf,
}

/// The fixed set of colours and templates, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackgroundCatalog {
    colors: Vec<ColorOption>,
    templates: Vec<TemplateOption>,
}

impl BackgroundCatalog {
    /// Build a catalog from explicit option lists.
    #[must_use]
    pub fn new(colors: Vec<ColorOption>, templates: Vec<TemplateOption>) -> Self {
        Self { colors, templates }
    }

    /// Build the catalog from configuration, resolving template files
    /// against `templates_root`.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        let colors = config
            .colors
            .iter()
            .map(|entry| ColorOption {
                label: entry.label.clone(),
                rgb: entry.rgb,
            })
            .collect();
        let templates = config
            .templates
            .iter()
            .map(|entry| TemplateOption {
                label: entry.label.clone(),
                path: config.templates_root.join(&entry.file),
            })
            .collect();
        Self { colors, templates }
    }

    /// Palette colours in menu order.
    #[must_use]
    pub fn colors(&self) -> &[ColorOption] {
        &self.colors
    }

    /// Templates in menu order.
    #[must_use]
    pub fn templates(&self) -> &[TemplateOption] {
        &self.templates
    }

    /// Look up a colour by label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_color(&self, label: &str) -> Option<&ColorOption> {
        let key = menu::normalize(label);
        self.colors
            .iter()
            .find(|option| menu::normalize(&option.label) == key)
    }

    /// Look up a template by label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_template(&self, label: &str) -> Option<&TemplateOption> {
        let key = menu::normalize(label);
        self.templates
            .iter()
            .find(|option| menu::normalize(&option.label) == key)
    }
}
