//! Explicit object-base removal.

use super::CodeModifier;
use crate::code_model::CodeNamespace;

/// Strips the explicit `Object` base reference the importer records on
/// every generated class, leaving real extension bases intact.
#[derive(Debug, Default)]
pub struct RemoveObjectBase;

impl CodeModifier for RemoveObjectBase {
    fn name(&self) -> &str {
        "remove_object_base"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in &mut namespace.types {
            decl.base_types.retain(|b| b.base != "Object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{TypeDeclaration, TypeRef};

    #[test]
    fn test_removes_object_keeps_real_base() {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Employee");
        decl.base_types.push(TypeRef::new("Object"));
        decl.base_types.push(TypeRef::new("Person"));
        ns.types.push(decl);

        RemoveObjectBase.execute(&mut ns);

        assert_eq!(ns.types[0].base_types.len(), 1);
        assert_eq!(ns.types[0].base_types[0].base, "Person");
    }
}
