//! Importer extension registry.
//!
//! Extensions get the first look at every schema type reference the
//! importer needs to map. Returning `None` means "not applicable, let the
//! next extension (or the importer itself) handle it" and is never an
//! error; returning a name means the reference is mapped, possibly after
//! the extension synthesized supporting declarations into the target
//! namespace.

use crate::code_model::{
    AttributeDecl, CodeNamespace, Field, Member, MemberModifiers, Method, Property, Statement,
    TypeDeclaration, TypeRef,
};
use crate::schema::{Facet, QName, SchemaSet, SimpleType, XSD_NAMESPACE};
use std::collections::HashMap;
use tracing::debug;

/// A pluggable schema-type mapper consulted before default importing.
pub trait SchemaImporterExtension: Send {
    /// Attempts to map the type reference `name` in `namespace`. `target`
    /// receives any supporting declarations; the returned name is what the
    /// generated code will reference.
    fn import_schema_type(
        &mut self,
        name: &str,
        namespace: &str,
        set: &SchemaSet,
        target: &mut CodeNamespace,
    ) -> Option<String>;
}

/// Maps restricted string simple types onto synthesized value-holder
/// classes that enforce the restriction facets at assignment time.
///
/// Synthesis is cached by the schema type's identity key, so two
/// references to one parsed type share a single generated class while
/// identically named types from separate parses each get their own.
#[derive(Debug, Default)]
pub struct SimpleTypeExtension {
    synthesized: HashMap<u64, String>,
}

impl SimpleTypeExtension {
    /// Creates the extension with an empty synthesis cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn applicable(st: &SimpleType) -> bool {
        st.base == QName::xsd("string") && !st.has_enumeration() && !st.facets.is_empty()
    }

    fn facet_condition(facet: &Facet) -> Option<(String, String)> {
        match facet {
            Facet::Length(n) => Some((
                "length".to_string(),
                format!("value.chars().count() as u32 != {}", n),
            )),
            Facet::MinLength(n) => Some((
                "minLength".to_string(),
                format!("(value.chars().count() as u32) < {}", n),
            )),
            Facet::MaxLength(n) => Some((
                "maxLength".to_string(),
                format!("value.chars().count() as u32 > {}", n),
            )),
            Facet::Pattern(p) => Some((
                "pattern".to_string(),
                format!(
                    "!regex::Regex::new({:?}).map(|re| re.is_match(&value)).unwrap_or(false)",
                    p
                ),
            )),
            Facet::Enumeration(_) => None,
        }
    }

    fn synthesize(st: &SimpleType, namespace: &str, target: &mut CodeNamespace) -> String {
        let mut decl = TypeDeclaration::class(&st.name);
        decl.comments.push(format!(
            "Value holder for the restricted string type `{}`.",
            st.name
        ));
        decl.attributes.push(AttributeDecl::new("Serializable"));
        if !namespace.is_empty() {
            decl.attributes
                .push(AttributeDecl::new("XmlType").with_named_str("Namespace", namespace));
        }

        decl.members.push(Member::Field(Field {
            name: "value".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::default(),
            attributes: Vec::new(),
            comments: Vec::new(),
        }));

        // Setter checks facets in declaration order and reports the first
        // violation only.
        let set_statements = st
            .facets
            .iter()
            .filter_map(Self::facet_condition)
            .map(|(facet, condition)| Statement::FacetCheck { facet, condition })
            .collect();

        decl.members.push(Member::Property(Property {
            name: "Value".into(),
            ty: TypeRef::new("String"),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: vec!["The held value; assignment enforces the restriction facets.".into()],
            backing_field: Some("value".into()),
            set_statements,
        }));

        decl.members.push(Member::Method(Method {
            name: "from".into(),
            return_type: Some(TypeRef::new(&format!(
                "Result<{}, FacetViolation>",
                st.name
            ))),
            parameters: vec![("value".into(), TypeRef::new("String"))],
            modifiers: MemberModifiers {
                public: true,
                is_static: true,
                ..Default::default()
            },
            attributes: Vec::new(),
            comments: vec!["Converts a plain string, validating the facets.".into()],
            statements: vec![
                Statement::Raw("let mut holder = Self::default();".into()),
                Statement::Raw("holder.set_value(value)?;".into()),
                Statement::Raw("Ok(holder)".into()),
            ],
        }));

        decl.members.push(Member::Method(Method {
            name: "into_inner".into(),
            return_type: Some(TypeRef::new("String")),
            parameters: Vec::new(),
            modifiers: MemberModifiers::public(),
            attributes: Vec::new(),
            comments: vec!["Converts back to the plain string.".into()],
            statements: vec![Statement::Raw("self.value".into())],
        }));

        target.add_import_once("crate::error::FacetViolation");
        target.types.push(decl);
        st.name.clone()
    }
}

impl SchemaImporterExtension for SimpleTypeExtension {
    fn import_schema_type(
        &mut self,
        name: &str,
        namespace: &str,
        set: &SchemaSet,
        target: &mut CodeNamespace,
    ) -> Option<String> {
        let st = set.find_simple_type(&QName::new(name, namespace))?;
        if !Self::applicable(st) {
            return None;
        }

        if let Some(existing) = self.synthesized.get(&st.uid) {
            return Some(existing.clone());
        }

        debug!("synthesizing value holder for simple type '{}'", st.name);
        let generated = Self::synthesize(st, namespace, target);
        self.synthesized.insert(st.uid, generated.clone());
        Some(generated)
    }
}

/// Maps types from externally provided namespaces onto their existing
/// definitions instead of generating local copies.
///
/// The first configured namespace is assumed to be imported already (it is
/// the one the generated code lives alongside); later ones get an import
/// directive registered once each. `ArrayOf*` wrapper names are left for
/// the importer so array handling stays uniform.
#[derive(Debug, Default)]
pub struct StripExternalTypesExtension {
    /// `(xml namespace, code namespace)` in configuration order.
    namespaces: Vec<(String, String)>,
}

impl StripExternalTypesExtension {
    /// Creates the extension over the configured namespace pairs.
    pub fn new(namespaces: Vec<(String, String)>) -> Self {
        Self { namespaces }
    }
}

impl SchemaImporterExtension for StripExternalTypesExtension {
    fn import_schema_type(
        &mut self,
        name: &str,
        namespace: &str,
        _set: &SchemaSet,
        target: &mut CodeNamespace,
    ) -> Option<String> {
        if namespace == XSD_NAMESPACE || name.starts_with("ArrayOf") {
            return None;
        }
        let index = self
            .namespaces
            .iter()
            .position(|(xml, _)| xml == namespace)?;
        if index > 0 {
            target.add_import_once(&self.namespaces[index].1);
        }
        Some(name.to_string())
    }
}

/// Maps the XML-Schema types that have no primitive equivalent onto the
/// SOAP interop wrapper types.
#[derive(Debug, Default)]
pub struct SoapTypeExtension;

const SOAP_TYPES: [(&str, &str); 7] = [
    ("anyURI", "SoapAnyUri"),
    ("gDay", "SoapDay"),
    ("gMonth", "SoapMonth"),
    ("gMonthDay", "SoapMonthDay"),
    ("gYear", "SoapYear"),
    ("gYearMonth", "SoapYearMonth"),
    ("duration", "SoapDuration"),
];

impl SchemaImporterExtension for SoapTypeExtension {
    fn import_schema_type(
        &mut self,
        name: &str,
        namespace: &str,
        _set: &SchemaSet,
        _target: &mut CodeNamespace,
    ) -> Option<String> {
        if namespace != XSD_NAMESPACE {
            return None;
        }
        SOAP_TYPES
            .iter()
            .find(|(xsd, _)| *xsd == name)
            .map(|(_, mapped)| mapped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn set_with(text: &str) -> SchemaSet {
        let mut set = SchemaSet::new();
        set.add(Schema::parse(text).unwrap());
        set
    }

    const RESTRICTED: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        targetNamespace="urn:t" xmlns:tns="urn:t">
  <xs:simpleType name="PostalCode">
    <xs:restriction base="xs:string">
      <xs:length value="6" />
      <xs:pattern value="[A-Z0-9]+" />
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    #[test]
    fn test_simple_type_synthesis_and_cache() {
        let set = set_with(RESTRICTED);
        let mut ext = SimpleTypeExtension::new();
        let mut ns = CodeNamespace::new("generated");

        let mapped = ext.import_schema_type("PostalCode", "urn:t", &set, &mut ns);
        assert_eq!(mapped.as_deref(), Some("PostalCode"));
        assert_eq!(ns.types.len(), 1);

        // Second reference to the same parsed type reuses the class.
        let again = ext.import_schema_type("PostalCode", "urn:t", &set, &mut ns);
        assert_eq!(again.as_deref(), Some("PostalCode"));
        assert_eq!(ns.types.len(), 1);

        let holder = ns.find_type("PostalCode").unwrap();
        let value_prop = holder.properties().next().unwrap();
        let facets: Vec<_> = value_prop
            .set_statements
            .iter()
            .map(|s| match s {
                Statement::FacetCheck { facet, .. } => facet.as_str(),
                _ => panic!("expected facet check"),
            })
            .collect();
        assert_eq!(facets, vec!["length", "pattern"]);
    }

    #[test]
    fn test_simple_type_defers_on_enumeration() {
        let set = set_with(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        targetNamespace="urn:t" xmlns:tns="urn:t">
  <xs:simpleType name="Color">
    <xs:restriction base="xs:string">
      <xs:enumeration value="red" />
      <xs:enumeration value="blue" />
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#,
        );
        let mut ext = SimpleTypeExtension::new();
        let mut ns = CodeNamespace::new("generated");
        assert!(ext
            .import_schema_type("Color", "urn:t", &set, &mut ns)
            .is_none());
    }

    #[test]
    fn test_strip_external_types() {
        let set = SchemaSet::new();
        let mut ext = StripExternalTypesExtension::new(vec![
            ("urn:first".into(), "first::types".into()),
            ("urn:second".into(), "second::types".into()),
        ]);
        let mut ns = CodeNamespace::new("generated");

        // First namespace: mapped, no import registered.
        assert_eq!(
            ext.import_schema_type("Money", "urn:first", &set, &mut ns),
            Some("Money".to_string())
        );
        assert!(ns.imports.is_empty());

        // Second namespace: mapped, import registered once.
        ext.import_schema_type("Rate", "urn:second", &set, &mut ns);
        ext.import_schema_type("Fee", "urn:second", &set, &mut ns);
        assert_eq!(ns.imports, vec!["second::types"]);

        // Array wrappers and unknown namespaces defer.
        assert!(ext
            .import_schema_type("ArrayOfMoney", "urn:first", &set, &mut ns)
            .is_none());
        assert!(ext
            .import_schema_type("Other", "urn:elsewhere", &set, &mut ns)
            .is_none());
    }

    #[test]
    fn test_soap_types() {
        let set = SchemaSet::new();
        let mut ext = SoapTypeExtension;
        let mut ns = CodeNamespace::new("generated");

        assert_eq!(
            ext.import_schema_type("gYearMonth", XSD_NAMESPACE, &set, &mut ns),
            Some("SoapYearMonth".to_string())
        );
        assert!(ext
            .import_schema_type("string", XSD_NAMESPACE, &set, &mut ns)
            .is_none());
        assert!(ext
            .import_schema_type("gDay", "urn:not-xsd", &set, &mut ns)
            .is_none());
    }
}
