//! Import rewriting steps.

use super::CodeModifier;
use crate::code_model::CodeNamespace;
use crate::error::AppResult;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct NamespacePair {
    /// XML namespace the replaced types were generated from.
    xml_namespace: String,
    /// Code namespace that already provides those types.
    code_namespace: String,
}

#[derive(Debug, Default, Deserialize)]
struct FixerOptions {
    #[serde(default)]
    pairs: Vec<NamespacePair>,
}

/// Swaps locally generated types for shared ones.
///
/// For each configured pair, every declaration whose XML-type namespace
/// matches the pair's XML namespace is dropped, and an import of the pair's
/// code namespace is added so references keep resolving against the shared
/// definitions.
#[derive(Debug, Default)]
pub struct ImportFixer {
    options: FixerOptions,
}

impl CodeModifier for ImportFixer {
    fn name(&self) -> &str {
        "import_fixer"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options =
                serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for pair in &self.options.pairs {
            namespace
                .types
                .retain(|decl| decl.xml_namespace() != Some(pair.xml_namespace.as_str()));
            namespace.add_import_once(&pair.code_namespace);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModifyOptions {
    #[serde(default)]
    add: Vec<String>,
    #[serde(default)]
    remove: Vec<String>,
}

/// Adds and removes import directives from an explicit list.
#[derive(Debug, Default)]
pub struct ModifyImports {
    options: ModifyOptions,
}

impl CodeModifier for ModifyImports {
    fn name(&self) -> &str {
        "modify_imports"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options =
                serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        namespace
            .imports
            .retain(|i| !self.options.remove.contains(i));
        for import in &self.options.add {
            namespace.add_import_once(import);
        }
    }
}
