//! Transformation pipeline identity and idempotence properties.

use pretty_assertions::assert_eq;
use serde_json::json;
use xsd_codegen::{
    CodeModifier, ModifierConfig, ModifierPipeline, ModifierRegistry, Schema, XsdClassGenerator,
};

const CATALOG_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:tns="urn:catalog" targetNamespace="urn:catalog">
  <xs:complexType name="Catalog">
    <xs:sequence>
      <xs:element name="Products" type="tns:Product" maxOccurs="unbounded" />
      <xs:element name="Featured" type="tns:Product" maxOccurs="unbounded" />
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Product">
    <xs:sequence>
      <xs:element name="Name" type="xs:string" />
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

fn generated() -> xsd_codegen::code_model::CodeNamespace {
    let schema = Schema::parse(CATALOG_XSD).unwrap();
    XsdClassGenerator::new(schema).unwrap().generate().unwrap()
}

#[test]
fn test_collection_generated_once_across_classes() {
    let namespace = generated();

    // Two array fields of the same element type across two classes share a
    // single collection class.
    let collections: Vec<_> = namespace
        .types
        .iter()
        .filter(|t| t.name == "ProductCollection")
        .collect();
    assert_eq!(collections.len(), 1);
}

#[test]
fn test_repeated_string_element_stays_a_vector() {
    let xsd = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:tns="urn:catalog" targetNamespace="urn:catalog">
  <xs:complexType name="Product">
    <xs:sequence>
      <xs:element name="Name" type="xs:string" />
      <xs:element name="Tags" type="xs:string" maxOccurs="unbounded" />
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let schema = Schema::parse(xsd).unwrap();
    let namespace = XsdClassGenerator::new(schema).unwrap().generate().unwrap();

    assert!(namespace.find_type("StringCollection").is_none());
    let product = namespace.find_type("Product").unwrap();
    let tags = product.fields().find(|f| f.name == "tags").unwrap();
    assert!(tags.ty.is_array());
}

#[test]
fn test_doc_comments_idempotent() {
    let registry = ModifierRegistry::with_defaults();
    let step = || {
        registry
            .build_pipeline(&[ModifierConfig {
                name: "add_doc_comments".into(),
                options: serde_json::Value::Null,
            }])
            .unwrap()
    };

    let mut namespace = generated();
    step().run(&mut namespace);
    let once = namespace.clone();
    step().run(&mut namespace);
    assert_eq!(namespace, once);
}

#[test]
fn test_add_then_add_is_identity() {
    let registry = ModifierRegistry::with_defaults();
    let mut pipeline = ModifierPipeline::new();
    pipeline.add(registry.create("add_doc_comments").unwrap());
    pipeline.add(registry.create("remove_object_base").unwrap());
    pipeline.add(registry.create("add_doc_comments").unwrap());

    assert_eq!(
        pipeline.names(),
        vec!["add_doc_comments", "remove_object_base"]
    );
}

#[test]
fn test_replace_moves_step_to_end() {
    let registry = ModifierRegistry::with_defaults();
    let mut pipeline = ModifierPipeline::new();
    pipeline.add(registry.create("add_doc_comments").unwrap());
    pipeline.add(registry.create("remove_object_base").unwrap());

    let mut replacement = registry.create("add_doc_comments").unwrap();
    replacement.set_options(serde_json::Value::Null).unwrap();
    pipeline.replace(replacement);

    assert_eq!(
        pipeline.names(),
        vec!["remove_object_base", "add_doc_comments"]
    );
}

#[test]
fn test_remove_specified_types_via_options() {
    let registry = ModifierRegistry::with_defaults();
    let pipeline = registry
        .build_pipeline(&[ModifierConfig {
            name: "remove_specified_types".into(),
            options: json!({ "types": ["Product"] }),
        }])
        .unwrap();

    let mut namespace = generated();
    pipeline.run(&mut namespace);
    assert!(namespace.find_type("Product").is_none());
    assert!(namespace.find_type("Catalog").is_some());
}

#[test]
fn test_protobuf_numbers_survive_rerun() {
    let registry = ModifierRegistry::with_defaults();
    let pipeline = registry
        .build_pipeline(&[ModifierConfig {
            name: "protobuf".into(),
            options: serde_json::Value::Null,
        }])
        .unwrap();

    let mut namespace = generated();
    pipeline.run(&mut namespace);
    let once = namespace.clone();
    pipeline.run(&mut namespace);
    // Contracts and member numbers are assigned at most once.
    assert_eq!(namespace, once);
}
