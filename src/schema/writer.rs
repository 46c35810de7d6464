//! Schema model back to XSD text.

use super::{ComplexType, Facet, QName, Schema, XSD_NAMESPACE};
use crate::xml::{Document, Element};

/// Renders a schema document as XSD text.
pub fn write(schema: &Schema) -> String {
    let mut root = Element::new("xs:schema");
    root.set_attr("xmlns:xs", XSD_NAMESPACE);
    if !schema.target_namespace.is_empty() {
        root.set_attr("xmlns:tns", &schema.target_namespace);
        root.set_attr("targetNamespace", &schema.target_namespace);
        root.set_attr("elementFormDefault", "qualified");
    }
    if let Some(id) = &schema.id {
        root.set_attr("id", id);
    }

    for import in &schema.imports {
        let mut e = Element::new("xs:import");
        e.set_attr("namespace", &import.namespace);
        if let Some(loc) = &import.schema_location {
            e.set_attr("schemaLocation", loc);
        }
        root.children.push(e);
    }

    for element in &schema.elements {
        let mut e = Element::new("xs:element");
        e.set_attr("name", &element.name);
        if let Some(ty) = &element.ty {
            e.set_attr("type", &type_ref(ty, schema));
        }
        root.children.push(e);
    }

    for ct in &schema.complex_types {
        root.children.push(complex_type(ct, schema));
    }

    for st in &schema.simple_types {
        let mut e = Element::new("xs:simpleType");
        e.set_attr("name", &st.name);

        let mut restriction = Element::new("xs:restriction");
        restriction.set_attr("base", &type_ref(&st.base, schema));
        for facet in &st.facets {
            let mut f = Element::new(&format!("xs:{}", facet.name()));
            f.set_attr("value", &facet_value(facet));
            restriction.children.push(f);
        }
        e.children.push(restriction);
        root.children.push(e);
    }

    Document::new(root).to_xml_string()
}

fn complex_type(ct: &ComplexType, schema: &Schema) -> Element {
    let mut e = Element::new("xs:complexType");
    e.set_attr("name", &ct.name);
    if ct.is_abstract {
        e.set_attr("abstract", "true");
    }

    let mut sequence = Element::new("xs:sequence");
    for el in &ct.elements {
        let mut item = Element::new("xs:element");
        item.set_attr("name", &el.name);
        item.set_attr("type", &type_ref(&el.ty, schema));
        if el.is_array {
            item.set_attr("minOccurs", "0");
            item.set_attr("maxOccurs", "unbounded");
        }
        if el.nillable {
            item.set_attr("nillable", "true");
        }
        sequence.children.push(item);
    }
    if ct.has_wildcard {
        let mut any = Element::new("xs:any");
        any.set_attr("processContents", "lax");
        sequence.children.push(any);
    }

    match &ct.base {
        Some(base) => {
            let mut content = Element::new("xs:complexContent");
            let mut extension = Element::new("xs:extension");
            extension.set_attr("base", &type_ref(base, schema));
            extension.children.push(sequence);
            content.children.push(extension);
            e.children.push(content);
        }
        None => e.children.push(sequence),
    }

    e
}

fn type_ref(ty: &QName, schema: &Schema) -> String {
    if ty.is_xsd() {
        format!("xs:{}", ty.name)
    } else if ty.namespace == schema.target_namespace && !ty.namespace.is_empty() {
        format!("tns:{}", ty.name)
    } else {
        // Cross-namespace references keep the bare name; the import link
        // carries the namespace.
        ty.name.clone()
    }
}

fn facet_value(facet: &Facet) -> String {
    match facet {
        Facet::Length(n) | Facet::MinLength(n) | Facet::MaxLength(n) => n.to_string(),
        Facet::Pattern(p) | Facet::Enumeration(p) => p.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parser;

    #[test]
    fn test_write_then_reparse_preserves_shape() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:t" targetNamespace="urn:t">
  <xs:element name="Order" type="tns:Order" />
  <xs:complexType name="Order">
    <xs:sequence>
      <xs:element name="Id" type="xs:int" />
      <xs:element name="Lines" type="tns:Line" maxOccurs="unbounded" />
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Line">
    <xs:sequence>
      <xs:element name="Sku" type="xs:string" />
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="Sku">
    <xs:restriction base="xs:string">
      <xs:minLength value="2" />
      <xs:maxLength value="12" />
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

        let schema = parser::parse(text).unwrap();
        let rendered = write(&schema);
        let reparsed = parser::parse(&rendered).unwrap();

        assert_eq!(reparsed.target_namespace, schema.target_namespace);
        assert_eq!(reparsed.elements, schema.elements);
        assert_eq!(reparsed.complex_types, schema.complex_types);
        // uids are freshly assigned on parse; compare everything else.
        assert_eq!(
            reparsed.simple_types[0].facets,
            schema.simple_types[0].facets
        );
    }
}
