//! Serialization-exclusion attributes.

use super::CodeModifier;
use crate::code_model::{AttributeDecl, CodeNamespace, Member};

const NON_SERIALIZED: &str = "NonSerialized";

fn mark(attributes: &mut Vec<AttributeDecl>) {
    if !attributes.iter().any(|a| a.name == NON_SERIALIZED) {
        attributes.push(AttributeDecl::new(NON_SERIALIZED));
    }
}

/// Marks raw-XML fields as excluded from serialization.
///
/// Fields typed as `XmlElement` carry arbitrary markup that the standard
/// serializers cannot re-emit faithfully; enums are skipped entirely since
/// they have no fields of their own.
#[derive(Debug, Default)]
pub struct AddNonSerialized;

impl CodeModifier for AddNonSerialized {
    fn name(&self) -> &str {
        "add_non_serialized"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in namespace.types.iter_mut().filter(|t| !t.is_enum) {
            for member in &mut decl.members {
                if let Member::Field(field) = member {
                    if field.ty.base == "XmlElement" {
                        mark(&mut field.attributes);
                    }
                }
            }
        }
    }
}

/// Marks every event member as excluded from serialization.
#[derive(Debug, Default)]
pub struct AddNonSerializedEvents;

impl CodeModifier for AddNonSerializedEvents {
    fn name(&self) -> &str {
        "add_non_serialized_events"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in namespace.types.iter_mut().filter(|t| !t.is_enum) {
            for member in &mut decl.members {
                if let Member::Event(event) = member {
                    mark(&mut event.attributes);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{Event, Field, MemberModifiers, TypeDeclaration, TypeRef};

    #[test]
    fn test_xml_element_field_marked() {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Envelope");
        decl.members.push(Member::Field(Field {
            name: "raw".into(),
            ty: TypeRef::new("XmlElement"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));
        decl.members.push(Member::Field(Field {
            name: "name".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));
        ns.types.push(decl);

        AddNonSerialized.execute(&mut ns);
        AddNonSerialized.execute(&mut ns); // attribute added only once

        let fields: Vec<_> = ns.types[0].fields().collect();
        assert_eq!(fields[0].attributes.len(), 1);
        assert_eq!(fields[0].attributes[0].name, "NonSerialized");
        assert!(fields[1].attributes.is_empty());
    }

    #[test]
    fn test_enums_skipped() {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::enumeration("Color");
        decl.members.push(Member::Field(Field {
            name: "raw".into(),
            ty: TypeRef::new("XmlElement"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));
        ns.types.push(decl);

        AddNonSerialized.execute(&mut ns);
        assert!(ns.types[0].fields().next().unwrap().attributes.is_empty());
    }

    #[test]
    fn test_events_marked() {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Notifier");
        decl.members.push(Member::Event(Event {
            name: "changed".into(),
            ty: TypeRef::new("ChangedArgs"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));
        ns.types.push(decl);

        AddNonSerializedEvents.execute(&mut ns);
        match &ns.types[0].members[0] {
            Member::Event(e) => assert_eq!(e.attributes[0].name, "NonSerialized"),
            _ => panic!("expected event"),
        }
    }
}
