//! Attribute-stripping steps.

use super::CodeModifier;
use crate::code_model::CodeNamespace;

/// Removes the generated `DebuggerStepThrough` attribute from every
/// declaration, so stepping through generated code works again.
#[derive(Debug, Default)]
pub struct RemoveDebuggerAttribute;

impl CodeModifier for RemoveDebuggerAttribute {
    fn name(&self) -> &str {
        "remove_debugger_attribute"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in &mut namespace.types {
            decl.attributes.retain(|a| a.name != "DebuggerStepThrough");
        }
    }
}

/// Removes the XML-type attribute from every declaration. Useful when the
/// generated types are serialized by something other than the XML stack.
#[derive(Debug, Default)]
pub struct RemoveXmlTypeAttribute;

impl CodeModifier for RemoveXmlTypeAttribute {
    fn name(&self) -> &str {
        "remove_xml_type_attribute"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in &mut namespace.types {
            decl.attributes.retain(|a| a.name != "XmlType");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{AttributeDecl, TypeDeclaration};

    fn sample() -> CodeNamespace {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Person");
        decl.attributes.push(AttributeDecl::new("DebuggerStepThrough"));
        decl.attributes
            .push(AttributeDecl::new("XmlType").with_named_str("Namespace", "urn:p"));
        decl.attributes.push(AttributeDecl::new("Serializable"));
        ns.types.push(decl);
        ns
    }

    #[test]
    fn test_remove_debugger_attribute() {
        let mut ns = sample();
        RemoveDebuggerAttribute.execute(&mut ns);
        let names: Vec<_> = ns.types[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["XmlType", "Serializable"]);
    }

    #[test]
    fn test_remove_xml_type_attribute() {
        let mut ns = sample();
        RemoveXmlTypeAttribute.execute(&mut ns);
        let names: Vec<_> = ns.types[0].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["DebuggerStepThrough", "Serializable"]);
    }
}
