//! Array-to-collection-class conversion.

use super::CodeModifier;
use crate::code_model::{AttributeDecl, CodeNamespace, Member, TypeDeclaration, TypeRef};
use heck::ToUpperCamelCase;
use std::collections::HashSet;

/// Replaces array-typed fields and properties with named collection classes.
///
/// A field of type `[T]` becomes a field of type `{T}Collection`; the
/// collection class is generated once per element name, carries the
/// serializable marker and the XML namespace of the declaring type, and
/// wraps a `Vec<T>`. Arrays of primitive element types are left alone, so
/// a repeated string element stays a `Vec<String>`. Properties are retyped
/// only when the collection class already exists; they never cause one to
/// be generated. `Option<T>` element types unwrap to `T` for naming.
#[derive(Debug, Default)]
pub struct ConvertArraysToCollections;

fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "String"
            | "char"
            | "i8"
            | "i16"
            | "i32"
            | "i64"
            | "u8"
            | "u16"
            | "u32"
            | "u64"
            | "f32"
            | "f64"
            | "bool"
            | "Vec<u8>"
            | "XmlElement"
            | "Object"
    )
}

impl ConvertArraysToCollections {
    fn element_name(ty: &TypeRef) -> Option<String> {
        let element = ty.array_element.as_deref()?;
        let base = element.nullable_inner().unwrap_or(&element.base);
        if is_primitive(base) {
            return None;
        }
        Some(base.to_string())
    }

    fn collection_name(element: &str) -> String {
        format!("{}Collection", element.to_upper_camel_case())
    }

    fn collection_class(element: &str, xml_namespace: Option<&str>) -> TypeDeclaration {
        let mut decl = TypeDeclaration::class(&Self::collection_name(element));
        decl.base_types.push(TypeRef::new(&format!("Vec<{}>", element)));
        decl.attributes.push(AttributeDecl::new("Serializable"));
        if let Some(ns) = xml_namespace {
            decl.attributes
                .push(AttributeDecl::new("XmlType").with_named_str("Namespace", ns));
        }
        decl
    }
}

impl CodeModifier for ConvertArraysToCollections {
    fn name(&self) -> &str {
        "convert_arrays_to_collections"
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        let mut existing: HashSet<String> = namespace
            .types
            .iter()
            .filter(|t| t.name.ends_with("Collection"))
            .map(|t| t.name.clone())
            .collect();
        let mut created: Vec<TypeDeclaration> = Vec::new();

        // Fields first: they are what drives class generation.
        for decl in &mut namespace.types {
            let xml_ns = decl.xml_namespace().map(str::to_string);
            for member in &mut decl.members {
                if let Member::Field(field) = member {
                    if let Some(element) = Self::element_name(&field.ty) {
                        let name = Self::collection_name(&element);
                        if existing.insert(name.clone()) {
                            created.push(Self::collection_class(&element, xml_ns.as_deref()));
                        }
                        field.ty = TypeRef::new(&name);
                    }
                }
            }
        }

        // Properties reuse classes that exist, whether pre-existing or just
        // generated; they never create one.
        for decl in &mut namespace.types {
            for member in &mut decl.members {
                if let Member::Property(property) = member {
                    if let Some(element) = Self::element_name(&property.ty) {
                        let name = Self::collection_name(&element);
                        if existing.contains(&name) {
                            property.ty = TypeRef::new(&name);
                        }
                    }
                }
            }
        }

        namespace.types.extend(created);
    }
}
