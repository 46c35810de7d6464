//! Designer metadata for generated properties.

use super::property_flags::matches;
use super::CodeModifier;
use crate::code_model::{AttributeDecl, CodeNamespace, Literal, Member, Property};
use crate::error::AppResult;
use serde::Deserialize;

/// One configured property: a qualified name, `Type.Property` or `Type.*`,
/// plus the designer metadata to attach to it.
#[derive(Debug, Deserialize)]
struct Entry {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// `"TypeName,BaseTypeName"` pair for a custom editor attribute.
    #[serde(default)]
    editor: Option<String>,
    #[serde(default)]
    browsable: Option<bool>,
    #[serde(default)]
    read_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Options {
    #[serde(default)]
    properties: Vec<Entry>,
}

/// Decorates matching properties with property-grid attributes:
/// `DisplayName`, `Category`, `Description`, `Editor`, `Browsable(false)`
/// and `ReadOnly(true)`. Attributes are only added for the entry fields
/// actually set, and `browsable` / `read_only` only in their restricting
/// direction.
#[derive(Debug, Default)]
pub struct PropertyGridProperties {
    options: Options,
}

impl PropertyGridProperties {
    fn apply(entry: &Entry, property: &mut Property) {
        if let Some(display_name) = &entry.display_name {
            property.attributes.push(
                AttributeDecl::new("DisplayName")
                    .with_positional(Literal::Str(display_name.clone())),
            );
        }
        if let Some(category) = &entry.category {
            property.attributes.push(
                AttributeDecl::new("Category").with_positional(Literal::Str(category.clone())),
            );
        }
        if let Some(description) = &entry.description {
            property.attributes.push(
                AttributeDecl::new("Description")
                    .with_positional(Literal::Str(description.clone())),
            );
        }
        if let Some(editor) = &entry.editor {
            let parts: Vec<&str> = editor.split(',').collect();
            if let [editor_type, base_type] = parts[..] {
                property.attributes.push(
                    AttributeDecl::new("Editor")
                        .with_positional(Literal::Str(editor_type.trim().to_string()))
                        .with_positional(Literal::Str(base_type.trim().to_string())),
                );
            }
        }
        if entry.browsable == Some(false) {
            property
                .attributes
                .push(AttributeDecl::new("Browsable").with_positional(Literal::Bool(false)));
        }
        if entry.read_only == Some(true) {
            property
                .attributes
                .push(AttributeDecl::new("ReadOnly").with_positional(Literal::Bool(true)));
        }
    }
}

impl CodeModifier for PropertyGridProperties {
    fn name(&self) -> &str {
        "property_grid_properties"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options = serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        if self.options.properties.is_empty() {
            return;
        }
        for decl in &mut namespace.types {
            let type_name = decl.name.clone();
            for member in &mut decl.members {
                let Member::Property(property) = member else {
                    continue;
                };
                for entry in &self.options.properties {
                    if matches(&entry.name, &type_name, &property.name) {
                        Self::apply(entry, property);
                    }
                }
            }
        }
    }
}
