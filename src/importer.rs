#![deny(missing_docs)]

//! # XSD to Code Model
//!
//! `XsdClassGenerator` turns a compiled schema set into a [`CodeNamespace`]:
//! one class per complex type, one enum per enumerated simple type, with an
//! extension chain getting the first look at every type reference. Failures
//! are per type, logged and skipped, so one broken declaration never sinks
//! the rest of the schema.

use crate::code_model::{
    AttributeDecl, CodeNamespace, Field, Member, MemberModifiers, TypeDeclaration, TypeRef,
};
use crate::error::{AppError, AppResult};
use crate::modifiers::{ModifierConfig, ModifierPipeline, ModifierRegistry};
use crate::schema::{ComplexType, QName, Schema, SchemaSet, SimpleType};
use heck::{ToSnakeCase, ToUpperCamelCase};
use std::collections::HashSet;
use tracing::error;

/// Importer extensions.
pub mod extensions;

use extensions::{SchemaImporterExtension, SimpleTypeExtension, SoapTypeExtension};

/// Generates code-model declarations from XML schemas.
pub struct XsdClassGenerator {
    set: SchemaSet,
    extensions: Vec<Box<dyn SchemaImporterExtension>>,
    namespace_name: String,
}

impl XsdClassGenerator {
    /// Creates a generator over a single schema document. The set is
    /// compiled up front with unique-particle-attribution checking off,
    /// since schemas with legitimate wildcards would otherwise never
    /// import.
    pub fn new(schema: Schema) -> AppResult<Self> {
        let mut set = SchemaSet::new();
        set.settings.enable_upa_check = false;
        set.add(schema);
        Self::from_set(set)
    }

    /// Creates a generator over an already assembled set. The set is
    /// compiled here if the caller has not done so.
    pub fn from_set(mut set: SchemaSet) -> AppResult<Self> {
        if !set.is_compiled() {
            set.compile()?;
        }
        Ok(Self {
            set,
            extensions: vec![
                Box::new(SimpleTypeExtension::new()),
                Box::new(SoapTypeExtension),
            ],
            namespace_name: "generated".to_string(),
        })
    }

    /// Appends an extension. The chain is consulted in registration order;
    /// the built-in extensions are registered first.
    pub fn add_extension(&mut self, extension: Box<dyn SchemaImporterExtension>) {
        self.extensions.push(extension);
    }

    /// Sets the generated namespace name.
    pub fn set_namespace_name(&mut self, name: &str) {
        self.namespace_name = name.to_string();
    }

    /// The fixed post-import chain, in the only order its steps compose
    /// correctly: collections before comments so collection classes get
    /// documented, object-base removal before serialization marking.
    pub fn default_pipeline() -> ModifierPipeline {
        let registry = ModifierRegistry::with_defaults();
        let configs: Vec<ModifierConfig> = [
            "convert_arrays_to_collections",
            "add_doc_comments",
            "remove_object_base",
            "add_non_serialized",
            "add_non_serialized_events",
            "remove_specified_types",
        ]
        .iter()
        .map(|name| ModifierConfig {
            name: (*name).to_string(),
            options: serde_json::Value::Null,
        })
        .collect();
        // Every step name above is registered, so this cannot fail.
        registry.build_pipeline(&configs).unwrap_or_default()
    }

    /// Imports every top-level element's type, then every remaining named
    /// complex type, then runs the default pipeline.
    pub fn generate(&mut self) -> AppResult<CodeNamespace> {
        let mut ns = CodeNamespace::new(&self.namespace_name);
        let mut done = HashSet::new();

        let mut worklist: Vec<QName> = Vec::new();
        for schema in &self.set.schemas {
            for element in &schema.elements {
                if let Some(ty) = &element.ty {
                    worklist.push(ty.clone());
                }
            }
        }
        for schema in &self.set.schemas {
            for ct in &schema.complex_types {
                worklist.push(QName::new(&ct.name, &schema.target_namespace));
            }
            for st in &schema.simple_types {
                worklist.push(QName::new(&st.name, &schema.target_namespace));
            }
        }

        for qname in worklist {
            if let Err(e) = self.import_named(&qname, &mut ns, &mut done) {
                error!("skipping type '{}': {}", qname.name, e);
            }
        }

        Self::default_pipeline().run(&mut ns);
        Ok(ns)
    }

    fn import_named(
        &mut self,
        qname: &QName,
        ns: &mut CodeNamespace,
        done: &mut HashSet<QName>,
    ) -> AppResult<()> {
        if done.contains(qname) || qname.is_xsd() {
            return Ok(());
        }
        done.insert(qname.clone());

        if let Some(ct) = self.set.find_complex_type(qname).cloned() {
            let decl = self.class_for(&ct, &qname.namespace, ns)?;
            if ns.find_type(&decl.name).is_none() {
                ns.types.push(decl);
            }
            return Ok(());
        }

        if let Some(st) = self.set.find_simple_type(qname).cloned() {
            // The extension chain handles restricted strings; enumerations
            // become enums here. Anything else only matters at reference
            // sites.
            if st.has_enumeration() {
                let decl = Self::enum_for(&st, &qname.namespace);
                if ns.find_type(&decl.name).is_none() {
                    ns.types.push(decl);
                }
            } else {
                self.map_type(qname, ns)?;
            }
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "type '{}' was not found in namespace '{}'",
            qname.name, qname.namespace
        )))
    }

    fn class_for(
        &mut self,
        ct: &ComplexType,
        namespace: &str,
        ns: &mut CodeNamespace,
    ) -> AppResult<TypeDeclaration> {
        let mut decl = TypeDeclaration::class(&ct.name);
        decl.is_abstract = ct.is_abstract;
        decl.attributes.push(AttributeDecl::new("Serializable"));
        decl.attributes
            .push(AttributeDecl::new("DebuggerStepThrough"));
        if !namespace.is_empty() {
            decl.attributes
                .push(AttributeDecl::new("XmlType").with_named_str("Namespace", namespace));
        }

        // Every class records an explicit object base; the default pipeline
        // strips it again for types without a real one.
        match &ct.base {
            Some(base) => decl.base_types.push(self.map_type(base, ns)?),
            None => decl.base_types.push(TypeRef::new("Object")),
        }

        for element in &ct.elements {
            let mut ty = self.map_type(&element.ty, ns)?;
            if element.nillable && !ty.is_array() {
                ty = TypeRef::new(&format!("Option<{}>", ty.base));
            }
            if element.is_array {
                ty = TypeRef::array_of(ty);
            }
            decl.members.push(Member::Field(Field {
                name: element.name.to_snake_case(),
                ty,
                modifiers: MemberModifiers::public(),
                attributes: vec![
                    AttributeDecl::new("XmlElement").with_named_str("Name", &element.name),
                ],
                comments: Vec::new(),
            }));
        }

        if ct.has_wildcard {
            decl.members.push(Member::Field(Field {
                name: "any".into(),
                ty: TypeRef::new("XmlElement"),
                modifiers: MemberModifiers::public(),
                attributes: Vec::new(),
                comments: Vec::new(),
            }));
        }

        Ok(decl)
    }

    fn enum_for(st: &SimpleType, namespace: &str) -> TypeDeclaration {
        let mut decl = TypeDeclaration::enumeration(&st.name);
        decl.attributes.push(AttributeDecl::new("Serializable"));
        if !namespace.is_empty() {
            decl.attributes
                .push(AttributeDecl::new("XmlType").with_named_str("Namespace", namespace));
        }
        for facet in &st.facets {
            if let crate::schema::Facet::Enumeration(value) = facet {
                decl.members.push(Member::Field(Field {
                    name: value.to_upper_camel_case(),
                    ty: TypeRef::default(),
                    modifiers: MemberModifiers::public(),
                    attributes: vec![
                        AttributeDecl::new("XmlEnum").with_named_str("Name", value),
                    ],
                    comments: Vec::new(),
                }));
            }
        }
        decl
    }

    /// Maps a schema type reference to a code type. Extensions first, then
    /// the built-in primitive table, then local declarations by name.
    fn map_type(&mut self, qname: &QName, ns: &mut CodeNamespace) -> AppResult<TypeRef> {
        for extension in &mut self.extensions {
            if let Some(mapped) =
                extension.import_schema_type(&qname.name, &qname.namespace, &self.set, ns)
            {
                return Ok(TypeRef::new(&mapped));
            }
        }

        if qname.is_xsd() {
            return match builtin_type(&qname.name) {
                Some(mapped) => Ok(TypeRef::new(mapped)),
                None => Err(AppError::Validation(format!(
                    "no mapping for XML Schema type 'xs:{}'",
                    qname.name
                ))),
            };
        }

        if self.set.find_complex_type(qname).is_some() {
            return Ok(TypeRef::new(&qname.name));
        }

        if let Some(st) = self.set.find_simple_type(qname).cloned() {
            if st.has_enumeration() {
                return Ok(TypeRef::new(&st.name));
            }
            // Non-string restrictions collapse onto their base type.
            return self.map_type(&st.base, ns);
        }

        Err(AppError::Validation(format!(
            "unresolvable type reference '{}' ({})",
            qname.name, qname.namespace
        )))
    }
}

/// Code type names for the XML Schema built-ins.
fn builtin_type(name: &str) -> Option<&'static str> {
    Some(match name {
        "string" | "normalizedString" | "token" | "dateTime" | "date" | "time" | "QName" => {
            "String"
        }
        "int" => "i32",
        "integer" | "long" | "nonNegativeInteger" | "positiveInteger" => "i64",
        "short" => "i16",
        "byte" => "i8",
        "unsignedByte" => "u8",
        "unsignedShort" => "u16",
        "unsignedInt" => "u32",
        "unsignedLong" => "u64",
        "boolean" => "bool",
        "decimal" | "double" => "f64",
        "float" => "f32",
        "base64Binary" | "hexBinary" => "Vec<u8>",
        "anyType" => "XmlElement",
        _ => return None,
    })
}
