//! XSD text to schema model, built on `roxmltree`.
//!
//! Only the subset of XML Schema the generators consume is mapped: imports,
//! top-level elements, complex types with sequence/all content (including
//! extension bases and `xs:any` wildcards), and restricted simple types with
//! their facets in declaration order. Anything else is skipped with a
//! warning rather than failing the parse.

use super::{
    next_uid, ComplexType, ElementDef, Facet, QName, Schema, SchemaImport, SimpleType,
    TopLevelElement, XSD_NAMESPACE,
};
use crate::error::{AppError, AppResult};
use roxmltree::Node;
use tracing::warn;

/// Parses one schema document.
pub fn parse(text: &str) -> AppResult<Schema> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    if root.tag_name().name() != "schema" || root.tag_name().namespace() != Some(XSD_NAMESPACE) {
        return Err(AppError::Validation(format!(
            "document element is '{}', expected an xs:schema",
            root.tag_name().name()
        )));
    }

    let mut schema = Schema {
        target_namespace: root.attribute("targetNamespace").unwrap_or("").to_string(),
        id: root.attribute("id").map(str::to_string),
        ..Default::default()
    };

    for child in root.children().filter(Node::is_element) {
        if child.tag_name().namespace() != Some(XSD_NAMESPACE) {
            continue;
        }
        match child.tag_name().name() {
            "import" => schema.imports.push(SchemaImport {
                namespace: child.attribute("namespace").unwrap_or("").to_string(),
                schema_location: child.attribute("schemaLocation").map(str::to_string),
                resolved: None,
            }),
            "element" => parse_top_level_element(child, &mut schema),
            "complexType" => {
                if let Some(ct) = parse_complex_type(child, None, &schema.target_namespace) {
                    schema.complex_types.push(ct);
                }
            }
            "simpleType" => {
                if let Some(st) = parse_simple_type(child) {
                    schema.simple_types.push(st);
                }
            }
            "annotation" | "include" => {}
            other => warn!("skipping unsupported top-level construct 'xs:{}'", other),
        }
    }

    Ok(schema)
}

fn parse_top_level_element(node: Node<'_, '_>, schema: &mut Schema) {
    let Some(name) = node.attribute("name") else {
        warn!("skipping top-level element with no name");
        return;
    };

    let mut ty = node
        .attribute("type")
        .and_then(|t| resolve_qname(node, t, &schema.target_namespace));

    // Inline anonymous complex types are hoisted out and named after the
    // element, matching how the importer addresses them later.
    if ty.is_none() {
        if let Some(inline) = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == "complexType")
        {
            if let Some(ct) = parse_complex_type(inline, Some(name), &schema.target_namespace) {
                ty = Some(QName::new(&ct.name, &schema.target_namespace));
                schema.complex_types.push(ct);
            }
        }
    }

    schema.elements.push(TopLevelElement {
        name: name.to_string(),
        ty,
    });
}

fn parse_complex_type(
    node: Node<'_, '_>,
    fallback_name: Option<&str>,
    target_ns: &str,
) -> Option<ComplexType> {
    let name = match node.attribute("name").or(fallback_name) {
        Some(n) => n.to_string(),
        None => {
            warn!("skipping anonymous complex type with no owning element");
            return None;
        }
    };

    let mut ct = ComplexType {
        name,
        base: None,
        elements: Vec::new(),
        has_wildcard: false,
        is_abstract: node.attribute("abstract") == Some("true"),
    };

    // Either direct sequence/all content, or complexContent > extension.
    let mut content = node;
    if let Some(cc) = child_element(node, "complexContent") {
        if let Some(ext) = child_element(cc, "extension") {
            ct.base = ext
                .attribute("base")
                .and_then(|b| resolve_qname(ext, b, target_ns));
            content = ext;
        }
    }

    for group_name in ["sequence", "all", "choice"] {
        if let Some(group) = child_element(content, group_name) {
            for item in group.children().filter(Node::is_element) {
                match item.tag_name().name() {
                    "element" => {
                        if let Some(def) = parse_element_def(item, target_ns) {
                            ct.elements.push(def);
                        }
                    }
                    "any" => ct.has_wildcard = true,
                    _ => {}
                }
            }
        }
    }

    Some(ct)
}

fn parse_element_def(node: Node<'_, '_>, target_ns: &str) -> Option<ElementDef> {
    let name = node.attribute("name")?;
    let ty = node
        .attribute("type")
        .and_then(|t| resolve_qname(node, t, target_ns))?;

    let is_array = match node.attribute("maxOccurs") {
        Some("unbounded") => true,
        Some(n) => n.parse::<u32>().map(|n| n > 1).unwrap_or(false),
        None => false,
    };

    Some(ElementDef {
        name: name.to_string(),
        ty,
        is_array,
        nillable: node.attribute("nillable") == Some("true"),
    })
}

fn parse_simple_type(node: Node<'_, '_>) -> Option<SimpleType> {
    let name = node.attribute("name")?;
    let restriction = child_element(node, "restriction")?;
    let base = restriction
        .attribute("base")
        .and_then(|b| resolve_qname(restriction, b, ""))?;

    let mut facets = Vec::new();
    for facet in restriction.children().filter(Node::is_element) {
        let value = facet.attribute("value").unwrap_or("");
        match facet.tag_name().name() {
            // Unparseable numeric facet values are dropped, not fatal.
            "length" => push_numeric(&mut facets, value, Facet::Length),
            "minLength" => push_numeric(&mut facets, value, Facet::MinLength),
            "maxLength" => push_numeric(&mut facets, value, Facet::MaxLength),
            "pattern" => facets.push(Facet::Pattern(value.to_string())),
            "enumeration" => facets.push(Facet::Enumeration(value.to_string())),
            other => warn!(
                "skipping unsupported facet 'xs:{}' on simple type '{}'",
                other, name
            ),
        }
    }

    Some(SimpleType {
        name: name.to_string(),
        base,
        facets,
        uid: next_uid(),
    })
}

fn push_numeric(facets: &mut Vec<Facet>, value: &str, make: fn(u32) -> Facet) {
    match value.parse::<u32>() {
        Ok(n) => facets.push(make(n)),
        Err(_) => warn!("ignoring non-numeric facet value '{}'", value),
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Resolves a prefixed type reference (`xs:string`, `tns:Person`) against
/// the in-scope namespace declarations. Unprefixed names fall back to the
/// default namespace, then to the schema's own target namespace.
fn resolve_qname(node: Node<'_, '_>, value: &str, target_ns: &str) -> Option<QName> {
    let (prefix, local) = match value.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, value),
    };

    let ns = node
        .lookup_namespace_uri(prefix)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if prefix.is_some() {
                warn!("unbound namespace prefix in type reference '{}'", value);
            }
            target_ns.to_string()
        });

    Some(QName::new(local, &ns))
}
