//! Protocol-buffer attribute decoration.

use super::CodeModifier;
use crate::code_model::{AttributeDecl, CodeNamespace, Literal, Member};
use crate::error::AppResult;
use serde::Deserialize;

fn default_stop() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Options {
    /// When true, the first raw-XML property of a type ends numbering for
    /// that type; the remaining properties stay unnumbered. When false the
    /// raw-XML property itself is skipped and numbering continues with the
    /// next property.
    #[serde(default = "default_stop")]
    stop_at_xml_element: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stop_at_xml_element: default_stop(),
        }
    }
}

/// Decorates types for protocol-buffer serialization.
///
/// Every non-enum declaration receives a `ProtoContract` attribute and its
/// properties receive `ProtoMember(N)` with `N` counting from one in
/// declaration order. Raw `XmlElement` properties have no protobuf mapping;
/// see [`Options::stop_at_xml_element`] for how they interact with
/// numbering.
#[derive(Debug, Default)]
pub struct Protobuf {
    options: Options,
}

impl CodeModifier for Protobuf {
    fn name(&self) -> &str {
        "protobuf"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options =
                serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        for decl in namespace.types.iter_mut().filter(|t| !t.is_enum) {
            if decl.attribute("ProtoContract").is_none() {
                decl.attributes.push(AttributeDecl::new("ProtoContract"));
            }

            let mut number = 0i64;
            for member in &mut decl.members {
                let Member::Property(property) = member else {
                    continue;
                };
                if property.ty.base == "XmlElement" {
                    if self.options.stop_at_xml_element {
                        break;
                    }
                    continue;
                }
                number += 1;
                if !property.attributes.iter().any(|a| a.name == "ProtoMember") {
                    property.attributes.push(
                        AttributeDecl::new("ProtoMember")
                            .with_positional(Literal::Int(number)),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{MemberModifiers, Property, TypeDeclaration, TypeRef};
    use serde_json::json;

    fn property(name: &str, ty: &str) -> Member {
        Member::Property(Property {
            name: name.into(),
            ty: TypeRef::new(ty),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: Vec::new(),
            backing_field: None,
            set_statements: Vec::new(),
        })
    }

    fn sample() -> CodeNamespace {
        let mut ns = CodeNamespace::new("generated");
        let mut decl = TypeDeclaration::class("Record");
        decl.members.push(property("A", "String"));
        decl.members.push(property("Raw", "XmlElement"));
        decl.members.push(property("B", "i64"));
        ns.types.push(decl);
        ns
    }

    fn member_number(member: &Member) -> Option<i64> {
        let Member::Property(p) = member else {
            return None;
        };
        p.attributes
            .iter()
            .find(|a| a.name == "ProtoMember")
            .and_then(|a| match a.arguments[0].value {
                Literal::Int(n) => Some(n),
                _ => None,
            })
    }

    #[test]
    fn test_stops_at_first_xml_element_by_default() {
        let mut ns = sample();
        Protobuf::default().execute(&mut ns);

        assert!(ns.types[0].attribute("ProtoContract").is_some());
        assert_eq!(member_number(&ns.types[0].members[0]), Some(1));
        assert_eq!(member_number(&ns.types[0].members[1]), None);
        // Numbering ended with the raw-XML property.
        assert_eq!(member_number(&ns.types[0].members[2]), None);
    }

    #[test]
    fn test_flag_off_skips_and_continues() {
        let mut step = Protobuf::default();
        step.set_options(json!({ "stop_at_xml_element": false }))
            .unwrap();

        let mut ns = sample();
        step.execute(&mut ns);

        assert_eq!(member_number(&ns.types[0].members[0]), Some(1));
        assert_eq!(member_number(&ns.types[0].members[1]), None);
        assert_eq!(member_number(&ns.types[0].members[2]), Some(2));
    }

    #[test]
    fn test_enums_untouched() {
        let mut ns = CodeNamespace::new("generated");
        ns.types.push(TypeDeclaration::enumeration("Color"));
        Protobuf::default().execute(&mut ns);
        assert!(ns.types[0].attribute("ProtoContract").is_none());
    }
}
