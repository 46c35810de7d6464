#![deny(missing_docs)]

//! # Registry Types to XSD
//!
//! `ClassXsdGenerator` reflects over a [`TypeRegistry`] and produces one
//! schema document per XML namespace the reachable types serialize under.
//! The schema containing the requested type always comes first; links
//! between the documents are synthesized as `xs:import` and resolved
//! depth-first with deterministic generated names.

use crate::error::{AppError, AppResult};
use crate::registry::{RecordType, TypeRegistry, ValueType};
use crate::schema::{
    ComplexType, ElementDef, QName, Schema, SchemaImport, SchemaSet, TopLevelElement,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Produces deterministic names `base0`, `base1`, ... for schemas that have
/// none of their own. The naming scheme is replaceable per generator.
pub struct NameGenerator {
    base: String,
    count: u32,
    naming: Option<Box<dyn Fn(&str, u32) -> String + Send>>,
}

impl NameGenerator {
    /// Creates a generator with the given base.
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            count: 0,
            naming: None,
        }
    }

    /// Replaces the naming scheme. The closure receives the base and the
    /// running count.
    pub fn set_naming(&mut self, naming: impl Fn(&str, u32) -> String + Send + 'static) {
        self.naming = Some(Box::new(naming));
    }

    /// Produces the next name.
    pub fn next(&mut self) -> String {
        let n = self.count;
        self.count += 1;
        match &self.naming {
            Some(naming) => naming(&self.base, n),
            None => format!("{}{}", self.base, n),
        }
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new("parameter")
    }
}

/// Generates XSD schema documents from registered record types.
pub struct ClassXsdGenerator {
    names: NameGenerator,
}

impl Default for ClassXsdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassXsdGenerator {
    /// Creates a generator with the default naming scheme.
    pub fn new() -> Self {
        Self {
            names: NameGenerator::default(),
        }
    }

    /// Creates a generator with a custom name generator.
    pub fn with_names(names: NameGenerator) -> Self {
        Self { names }
    }

    /// Generates the schema documents describing `type_name` and every type
    /// reachable from it. The first document contains the requested type.
    pub fn generate(
        &mut self,
        type_name: &str,
        registry: &TypeRegistry,
    ) -> AppResult<Vec<Schema>> {
        self.generate_many(&[type_name], registry)
    }

    /// Generates the schema documents describing several root types at
    /// once. The first document contains the first requested type.
    pub fn generate_many(
        &mut self,
        type_names: &[&str],
        registry: &TypeRegistry,
    ) -> AppResult<Vec<Schema>> {
        let first = type_names.first().ok_or_else(|| {
            AppError::General("at least one type name is required".to_string())
        })?;
        let master_ns = registry
            .get(first)
            .ok_or_else(|| {
                AppError::General(format!("type '{}' is not registered", first))
            })?
            .xml_namespace
            .clone()
            .unwrap_or_default();

        // Reachable types, grouped by namespace in discovery order with the
        // master namespace pinned first.
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        groups.insert(master_ns.clone(), Vec::new());
        let mut seen = HashSet::new();
        for name in type_names {
            self.collect(name, registry, &mut groups, &mut seen)?;
        }

        let mut schemas: Vec<Schema> = groups
            .into_iter()
            .map(|(ns, names)| {
                let mut schema = Schema {
                    target_namespace: ns,
                    ..Default::default()
                };
                for name in names {
                    // collect() verified registration.
                    if let Some(ty) = registry.get(&name) {
                        schema.complex_types.push(Self::complex_type(ty, registry));
                    }
                }
                schema
            })
            .collect();

        for root in type_names {
            if let Some(ty) = registry.get(root) {
                let ns = ty.xml_namespace.clone().unwrap_or_default();
                if let Some(schema) = schemas.iter_mut().find(|s| s.target_namespace == ns) {
                    schema.elements.push(TopLevelElement {
                        name: (*root).to_string(),
                        ty: Some(QName::new(root, &ns)),
                    });
                }
            }
        }

        // The master document must link its satellites; synthesize the
        // import list when the exporter produced none.
        if schemas.len() > 1 && schemas[0].imports.is_empty() {
            let satellites: Vec<String> = schemas[1..]
                .iter()
                .map(|s| s.target_namespace.clone())
                .collect();
            for namespace in satellites {
                schemas[0].imports.push(SchemaImport {
                    namespace,
                    schema_location: None,
                    resolved: None,
                });
            }
        }

        self.resolve_imported_schemas(&mut schemas);
        Self::validate(&schemas)?;
        Ok(schemas)
    }

    fn collect(
        &self,
        name: &str,
        registry: &TypeRegistry,
        groups: &mut IndexMap<String, Vec<String>>,
        seen: &mut HashSet<String>,
    ) -> AppResult<()> {
        if !seen.insert(name.to_string()) {
            return Ok(());
        }
        let ty = registry.get(name).ok_or_else(|| {
            AppError::General(format!("type '{}' is not registered", name))
        })?;

        let ns = ty.xml_namespace.clone().unwrap_or_default();
        groups.entry(ns).or_default().push(name.to_string());

        if let Some(base) = &ty.base {
            self.collect(base, registry, groups, seen)?;
        }
        for field in &ty.fields {
            if let Some(record) = record_name(&field.ty) {
                self.collect(record, registry, groups, seen)?;
            }
        }
        Ok(())
    }

    fn complex_type(ty: &RecordType, registry: &TypeRegistry) -> ComplexType {
        let elements = ty
            .fields
            .iter()
            .map(|field| {
                let (element_ty, is_array) = match &field.ty {
                    ValueType::List(inner) => (xsd_type(inner, registry), true),
                    other => (xsd_type(other, registry), false),
                };
                ElementDef {
                    name: field.name.clone(),
                    ty: element_ty,
                    is_array,
                    nillable: false,
                }
            })
            .collect();

        ComplexType {
            name: ty.name.clone(),
            base: ty.base.as_deref().map(|b| {
                let ns = registry
                    .get(b)
                    .and_then(|t| t.xml_namespace.clone())
                    .unwrap_or_default();
                QName::new(b, &ns)
            }),
            elements,
            has_wildcard: false,
            is_abstract: ty.is_abstract,
        }
    }

    /// Assigns identities to unnamed schemas and wires up unresolved import
    /// links by target-namespace search, depth-first from the first
    /// document into each newly resolved one.
    pub fn resolve_imported_schemas(&mut self, schemas: &mut [Schema]) {
        if schemas.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        let mut visited = HashSet::new();

        while let Some(i) = stack.pop() {
            if !visited.insert(i) {
                continue;
            }

            let namespaces: Vec<(usize, String)> = schemas[i]
                .imports
                .iter()
                .enumerate()
                .filter(|(_, imp)| imp.resolved.is_none())
                .map(|(j, imp)| (j, imp.namespace.clone()))
                .collect();

            for (j, namespace) in namespaces {
                let Some(k) = schemas
                    .iter()
                    .position(|s| s.target_namespace == namespace)
                else {
                    debug!("import of '{}' has no document in this set", namespace);
                    continue;
                };

                if schemas[k].id.is_none() {
                    let name = self.names.next();
                    schemas[k].source_uri = Some(format!("file:///{}.xsd", name));
                    schemas[k].id = Some(name);
                }
                if schemas[i].imports[j].schema_location.is_none() {
                    // id was just assigned above when absent.
                    if let Some(id) = schemas[k].id.clone() {
                        schemas[i].imports[j].schema_location = Some(format!("{}.xsd", id));
                    }
                }
                schemas[i].imports[j].resolved = Some(k);
                stack.push(k);
            }
        }
    }

    fn validate(schemas: &[Schema]) -> AppResult<()> {
        let mut set = SchemaSet::new();
        for schema in schemas {
            set.add(schema.clone());
        }
        set.compile()
    }
}

fn record_name(ty: &ValueType) -> Option<&str> {
    match ty {
        ValueType::Record(name) => Some(name),
        ValueType::List(inner) => record_name(inner),
        _ => None,
    }
}

fn xsd_type(ty: &ValueType, registry: &TypeRegistry) -> QName {
    match ty {
        ValueType::Record(name) => {
            let ns = registry
                .get(name)
                .and_then(|t| t.xml_namespace.clone())
                .unwrap_or_default();
            QName::new(name, &ns)
        }
        // Nested lists flatten onto their element type; XSD expresses the
        // repetition on the particle.
        ValueType::List(inner) => xsd_type(inner, registry),
        primitive => QName::xsd(primitive.xsd_name().unwrap_or("string")),
    }
}
