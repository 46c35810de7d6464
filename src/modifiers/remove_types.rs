//! Block-list type removal.

use super::CodeModifier;
use crate::code_model::CodeNamespace;
use crate::error::AppResult;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct Options {
    #[serde(default)]
    types: Vec<String>,
}

/// Removes declarations named on a block list.
///
/// Entries are plain type names, or namespace-qualified as
/// `namespace.TypeName`; qualified entries only match when the owning
/// namespace name matches too.
#[derive(Debug, Default)]
pub struct RemoveSpecifiedTypes {
    options: Options,
}

impl CodeModifier for RemoveSpecifiedTypes {
    fn name(&self) -> &str {
        "remove_specified_types"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options =
                serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        let ns_name = namespace.name.clone();
        namespace.types.retain(|decl| {
            !self.options.types.iter().any(|entry| {
                match entry.rsplit_once('.') {
                    Some((ns, ty)) => ns == ns_name && ty == decl.name,
                    None => entry == &decl.name,
                }
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::TypeDeclaration;
    use serde_json::json;

    fn sample() -> CodeNamespace {
        let mut ns = CodeNamespace::new("generated");
        ns.types.push(TypeDeclaration::class("Keep"));
        ns.types.push(TypeDeclaration::class("Drop"));
        ns.types.push(TypeDeclaration::class("Qualified"));
        ns
    }

    #[test]
    fn test_plain_and_qualified_matching() {
        let mut step = RemoveSpecifiedTypes::default();
        step.set_options(json!({
            "types": ["Drop", "generated.Qualified", "other.Keep"]
        }))
        .unwrap();

        let mut ns = sample();
        step.execute(&mut ns);

        let names: Vec<_> = ns.types.iter().map(|t| t.name.as_str()).collect();
        // "other.Keep" is qualified for a different namespace, so Keep stays.
        assert_eq!(names, vec!["Keep"]);
    }

    #[test]
    fn test_no_options_removes_nothing() {
        let step = RemoveSpecifiedTypes::default();
        let mut ns = sample();
        step.execute(&mut ns);
        assert_eq!(ns.types.len(), 3);
    }
}
