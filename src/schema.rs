#![deny(missing_docs)]

//! # Schema Model
//!
//! Typed representation of XML Schema documents: target namespace, imports,
//! top-level elements, complex types and restricted simple types. A
//! `SchemaSet` is the ordered collection the generators compile and resolve
//! against; compilation reports errors as fatal and accumulates warnings.

use crate::error::{AppError, AppResult, FacetViolation};
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Schema parsing (`roxmltree`-backed).
pub mod parser;

/// Schema rendering back to XSD text.
pub mod writer;

/// The W3C XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-wide unique identity key for a parsed schema type.
pub(crate) fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Local name.
    pub name: String,
    /// Namespace URI, may be empty.
    pub namespace: String,
}

impl QName {
    /// Creates a qualified name.
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// Creates a name in the XML Schema namespace.
    pub fn xsd(name: &str) -> Self {
        Self::new(name, XSD_NAMESPACE)
    }

    /// True if this name lives in the XML Schema namespace.
    pub fn is_xsd(&self) -> bool {
        self.namespace == XSD_NAMESPACE
    }
}

/// A restriction facet, in schema declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Facet {
    /// `xs:length`
    Length(u32),
    /// `xs:minLength`
    MinLength(u32),
    /// `xs:maxLength`
    MaxLength(u32),
    /// `xs:pattern`
    Pattern(String),
    /// `xs:enumeration`
    Enumeration(String),
}

impl Facet {
    /// The schema name of the facet.
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Length(_) => "length",
            Facet::MinLength(_) => "minLength",
            Facet::MaxLength(_) => "maxLength",
            Facet::Pattern(_) => "pattern",
            Facet::Enumeration(_) => "enumeration",
        }
    }
}

/// Evaluates facets against a value in declaration order, reporting the
/// first violated facet and nothing else. Enumeration facets are pooled:
/// the value must match one of them.
pub fn check_facets(facets: &[Facet], value: &str) -> Result<(), FacetViolation> {
    let mut enumerations = Vec::new();
    for facet in facets {
        match facet {
            Facet::Length(n) => {
                if value.chars().count() as u32 != *n {
                    return Err(FacetViolation::new("length", value));
                }
            }
            Facet::MinLength(n) => {
                if (value.chars().count() as u32) < *n {
                    return Err(FacetViolation::new("minLength", value));
                }
            }
            Facet::MaxLength(n) => {
                if value.chars().count() as u32 > *n {
                    return Err(FacetViolation::new("maxLength", value));
                }
            }
            Facet::Pattern(p) => match Regex::new(p) {
                Ok(re) => {
                    if !re.is_match(value) {
                        return Err(FacetViolation::new("pattern", value));
                    }
                }
                Err(e) => warn!("skipping unparseable pattern facet '{}': {}", p, e),
            },
            Facet::Enumeration(v) => enumerations.push(v.as_str()),
        }
    }

    if !enumerations.is_empty() && !enumerations.contains(&value) {
        return Err(FacetViolation::new("enumeration", value));
    }

    Ok(())
}

/// A named simple type defined by restriction.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Type name.
    pub name: String,
    /// The restricted base type (e.g. `xs:string`).
    pub base: QName,
    /// Facets in declaration order.
    pub facets: Vec<Facet>,
    /// Identity key, unique per parsed schema-type object. Extensions cache
    /// synthesized declarations by this key, not by name.
    pub uid: u64,
}

impl SimpleType {
    /// True if any facet is an enumeration.
    pub fn has_enumeration(&self) -> bool {
        self.facets
            .iter()
            .any(|f| matches!(f, Facet::Enumeration(_)))
    }
}

/// An element particle inside a complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    /// Element name.
    pub name: String,
    /// Element type.
    pub ty: QName,
    /// True when `maxOccurs` exceeds one.
    pub is_array: bool,
    /// `nillable` flag.
    pub nillable: bool,
}

/// A named complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Type name.
    pub name: String,
    /// Extension base, if any.
    pub base: Option<QName>,
    /// Child element particles in declaration order.
    pub elements: Vec<ElementDef>,
    /// True when the content model contains an `xs:any` wildcard.
    pub has_wildcard: bool,
    /// True for abstract types.
    pub is_abstract: bool,
}

/// A top-level element declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelElement {
    /// Element name.
    pub name: String,
    /// Referenced type. Inline anonymous types are registered as complex
    /// types named after the element during parsing.
    pub ty: Option<QName>,
}

/// An `xs:import` link to another schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaImport {
    /// Imported target namespace.
    pub namespace: String,
    /// Location hint; synthesized during import resolution when absent.
    pub schema_location: Option<String>,
    /// Index of the resolved schema within the owning `SchemaSet`. `None`
    /// until resolution runs.
    pub resolved: Option<usize>,
}

/// One schema document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Target namespace; may be empty.
    pub target_namespace: String,
    /// Synthesized identifier, stable within one generation run.
    pub id: Option<String>,
    /// Synthesized source locator.
    pub source_uri: Option<String>,
    /// Imports in declaration order.
    pub imports: Vec<SchemaImport>,
    /// Top-level elements.
    pub elements: Vec<TopLevelElement>,
    /// Named complex types.
    pub complex_types: Vec<ComplexType>,
    /// Named simple types.
    pub simple_types: Vec<SimpleType>,
}

impl Schema {
    /// Parses a schema document from XSD text.
    pub fn parse(text: &str) -> AppResult<Self> {
        parser::parse(text)
    }

    /// Renders the schema to XSD text.
    pub fn to_xsd_string(&self) -> String {
        writer::write(self)
    }

    /// Finds a named complex type.
    pub fn find_complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.iter().find(|t| t.name == name)
    }

    /// Finds a named simple type.
    pub fn find_simple_type(&self, name: &str) -> Option<&SimpleType> {
        self.simple_types.iter().find(|t| t.name == name)
    }

    /// True if the schema imports the given namespace.
    pub fn imports_namespace(&self, ns: &str) -> bool {
        self.imports.iter().any(|i| i.namespace == ns)
    }
}

/// Settings applied when compiling a `SchemaSet`.
#[derive(Debug, Clone)]
pub struct CompilationSettings {
    /// Unique-particle-attribution checking. The generators disable this
    /// because legitimate `xs:any` wildcards would otherwise fail
    /// compilation.
    pub enable_upa_check: bool,
}

impl Default for CompilationSettings {
    fn default() -> Self {
        Self {
            enable_upa_check: true,
        }
    }
}

/// An ordered collection of schema documents.
#[derive(Debug, Default)]
pub struct SchemaSet {
    /// Documents in insertion order.
    pub schemas: Vec<Schema>,
    /// Compilation settings.
    pub settings: CompilationSettings,
    /// Warnings accumulated by the last `compile` run.
    pub warnings: Vec<String>,
    compiled: bool,
}

impl SchemaSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a schema document.
    pub fn add(&mut self, schema: Schema) {
        self.compiled = false;
        self.schemas.push(schema);
    }

    /// True once `compile` has succeeded.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Returns the schema with the given target namespace.
    pub fn by_namespace(&self, ns: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.target_namespace == ns)
    }

    /// True if a document with the given target namespace is present.
    pub fn contains_namespace(&self, ns: &str) -> bool {
        self.by_namespace(ns).is_some()
    }

    /// Finds a simple type by qualified name across the set.
    pub fn find_simple_type(&self, qname: &QName) -> Option<&SimpleType> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == qname.namespace)
            .find_map(|s| s.find_simple_type(&qname.name))
    }

    /// Finds a complex type by qualified name across the set.
    pub fn find_complex_type(&self, qname: &QName) -> Option<&ComplexType> {
        self.schemas
            .iter()
            .filter(|s| s.target_namespace == qname.namespace)
            .find_map(|s| s.find_complex_type(&qname.name))
    }

    /// Validates the set. Errors are fatal; warnings are logged and kept on
    /// the set for inspection.
    pub fn compile(&mut self) -> AppResult<()> {
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        for schema in &self.schemas {
            for ct in &schema.complex_types {
                if self.settings.enable_upa_check && ct.has_wildcard && !ct.elements.is_empty() {
                    errors.push(format!(
                        "complex type '{}' mixes an xs:any wildcard with named particles \
                         (unique particle attribution)",
                        ct.name
                    ));
                }

                for element in &ct.elements {
                    self.check_type_reference(
                        schema,
                        &element.ty,
                        &ct.name,
                        &mut errors,
                        &mut warnings,
                    );
                }

                if let Some(base) = &ct.base {
                    self.check_type_reference(schema, base, &ct.name, &mut errors, &mut warnings);
                }
            }

            for st in &schema.simple_types {
                for facet in &st.facets {
                    if let Facet::Pattern(p) = facet {
                        if let Err(e) = Regex::new(p) {
                            warnings.push(format!(
                                "simple type '{}' has an unparseable pattern facet: {}",
                                st.name, e
                            ));
                        }
                    }
                }
            }

            for element in &schema.elements {
                if let Some(ty) = &element.ty {
                    self.check_type_reference(
                        schema,
                        ty,
                        &element.name,
                        &mut errors,
                        &mut warnings,
                    );
                }
            }
        }

        for warning in &warnings {
            warn!("schema warning: {}", warning);
        }
        self.warnings = warnings;

        if let Some(first) = errors.first() {
            return Err(AppError::Validation(format!(
                "{} ({} error(s) total)",
                first,
                errors.len()
            )));
        }

        self.compiled = true;
        Ok(())
    }

    fn check_type_reference(
        &self,
        schema: &Schema,
        ty: &QName,
        context: &str,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        if ty.is_xsd() {
            if !is_builtin(&ty.name) {
                errors.push(format!(
                    "'{}' references unknown XML Schema type 'xs:{}'",
                    context, ty.name
                ));
            }
            return;
        }

        if self.contains_namespace(&ty.namespace) {
            if self.find_complex_type(ty).is_none() && self.find_simple_type(ty).is_none() {
                errors.push(format!(
                    "'{}' references undeclared type '{}' in namespace '{}'",
                    context, ty.name, ty.namespace
                ));
            }
            return;
        }

        // External namespace: tolerated when declared as an import, warned
        // about otherwise. The caller may have the types pre-compiled.
        if !schema.imports_namespace(&ty.namespace) {
            warnings.push(format!(
                "'{}' references type '{}' in unimported namespace '{}'",
                context, ty.name, ty.namespace
            ));
        }
    }
}

/// True for the XML Schema built-in type names this crate understands.
pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "string"
            | "normalizedString"
            | "token"
            | "int"
            | "integer"
            | "long"
            | "short"
            | "byte"
            | "boolean"
            | "decimal"
            | "double"
            | "float"
            | "dateTime"
            | "date"
            | "time"
            | "anyURI"
            | "anyType"
            | "duration"
            | "gDay"
            | "gMonth"
            | "gMonthDay"
            | "gYear"
            | "gYearMonth"
            | "base64Binary"
            | "hexBinary"
            | "QName"
            | "unsignedByte"
            | "unsignedShort"
            | "unsignedInt"
            | "unsignedLong"
            | "nonNegativeInteger"
            | "positiveInteger"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_order_determines_violation() {
        // length declared before maxLength: a value violating both reports
        // length, never maxLength.
        let facets = vec![Facet::Length(3), Facet::MaxLength(2)];
        let err = check_facets(&facets, "abcdef").unwrap_err();
        assert_eq!(err.facet, "length");

        // Reversed declaration order reports maxLength first.
        let facets = vec![Facet::MaxLength(2), Facet::Length(3)];
        let err = check_facets(&facets, "abcdef").unwrap_err();
        assert_eq!(err.facet, "maxLength");
    }

    #[test]
    fn test_facets_pass() {
        let facets = vec![
            Facet::MinLength(2),
            Facet::MaxLength(5),
            Facet::Pattern("^[a-z]+$".into()),
        ];
        assert!(check_facets(&facets, "abc").is_ok());
        assert_eq!(
            check_facets(&facets, "a").unwrap_err().facet,
            "minLength"
        );
        assert_eq!(
            check_facets(&facets, "ABC").unwrap_err().facet,
            "pattern"
        );
    }

    #[test]
    fn test_upa_check_flag() {
        let mut ct = ComplexType {
            name: "Any".into(),
            base: None,
            elements: vec![ElementDef {
                name: "known".into(),
                ty: QName::xsd("string"),
                is_array: false,
                nillable: false,
            }],
            has_wildcard: true,
            is_abstract: false,
        };
        let mut schema = Schema::default();
        schema.complex_types.push(ct.clone());

        let mut set = SchemaSet::new();
        set.add(schema.clone());
        assert!(set.compile().is_err());

        let mut set = SchemaSet::new();
        set.settings.enable_upa_check = false;
        set.add(schema.clone());
        assert!(set.compile().is_ok());

        // Without the wildcard the default settings pass too.
        ct.has_wildcard = false;
        schema.complex_types.clear();
        schema.complex_types.push(ct);
        let mut set = SchemaSet::new();
        set.add(schema);
        assert!(set.compile().is_ok());
    }

    #[test]
    fn test_undeclared_type_is_fatal() {
        let mut schema = Schema::default();
        schema.target_namespace = "urn:test".into();
        schema.complex_types.push(ComplexType {
            name: "Holder".into(),
            base: None,
            elements: vec![ElementDef {
                name: "missing".into(),
                ty: QName::new("Nope", "urn:test"),
                is_array: false,
                nillable: false,
            }],
            has_wildcard: false,
            is_abstract: false,
        });

        let mut set = SchemaSet::new();
        let err = {
            set.add(schema);
            set.compile().unwrap_err()
        };
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unimported_external_reference_warns() {
        let mut schema = Schema::default();
        schema.target_namespace = "urn:test".into();
        schema.complex_types.push(ComplexType {
            name: "Holder".into(),
            base: None,
            elements: vec![ElementDef {
                name: "external".into(),
                ty: QName::new("Elsewhere", "urn:other"),
                is_array: false,
                nillable: false,
            }],
            has_wildcard: false,
            is_abstract: false,
        });

        let mut set = SchemaSet::new();
        set.add(schema);
        assert!(set.compile().is_ok());
        assert_eq!(set.warnings.len(), 1);
        assert!(set.warnings[0].contains("urn:other"));

        // Declaring the import clears the warning on the next run.
        set.schemas[0].imports.push(SchemaImport {
            namespace: "urn:other".into(),
            schema_location: None,
            resolved: None,
        });
        assert!(set.compile().is_ok());
        assert!(set.warnings.is_empty());
    }
}
