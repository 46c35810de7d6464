#![deny(missing_docs)]

//! # Transformation Pipeline
//!
//! Named, ordered post-processing steps over a generated [`CodeNamespace`].
//! Steps are identified by a stable, case-sensitive name; configuration
//! arrives as an opaque JSON blob each step deserializes for itself, so the
//! pipeline never needs to know any step's option shape.

use crate::code_model::CodeNamespace;
use crate::error::{AppError, AppResult};
use std::collections::HashMap;

/// Doc-comment generation.
pub mod doc_comments;

/// Array-to-collection-class conversion.
pub mod collections;

/// Serialization-exclusion attributes for fields and events.
pub mod non_serialized;

/// Explicit object-base removal.
pub mod object_base;

/// Block-list type removal.
pub mod remove_types;

/// Import rewriting steps.
pub mod imports;

/// Proxy-type filtering.
pub mod proxy;

/// Protocol-buffer attribute decoration.
pub mod protobuf;

/// Property flag steps (browsable / override / virtual).
pub mod property_flags;

/// Designer metadata for generated properties.
pub mod property_grid;

/// Attribute-stripping steps.
pub mod attribute_strippers;

/// A single transformation step.
///
/// Steps hold no references into the model once `execute` returns; every run
/// receives the namespace fresh.
pub trait CodeModifier: Send {
    /// Stable step name. Pipeline identity is this exact string.
    fn name(&self) -> &str;

    /// Applies per-step configuration. Steps without options accept and
    /// ignore any blob.
    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        let _ = options;
        Ok(())
    }

    /// Runs the step against the namespace.
    fn execute(&self, namespace: &mut CodeNamespace);
}

/// One configured pipeline entry: step name plus its opaque options.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ModifierConfig {
    /// Step name, resolved through the [`ModifierRegistry`].
    pub name: String,
    /// Opaque per-step options.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// An ordered collection of steps, executed in insertion order.
#[derive(Default)]
pub struct ModifierPipeline {
    steps: Vec<Box<dyn CodeModifier>>,
}

impl ModifierPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step. Adding a step whose name is already present is a
    /// silent no-op; the original keeps its position and configuration.
    pub fn add(&mut self, step: Box<dyn CodeModifier>) {
        if self.position(step.name()).is_none() {
            self.steps.push(step);
        }
    }

    /// Replaces a step by name: the old entry is removed and the new one
    /// appended at the end. Absent names degrade to a plain append.
    pub fn replace(&mut self, step: Box<dyn CodeModifier>) {
        if let Some(i) = self.position(step.name()) {
            self.steps.remove(i);
        }
        self.steps.push(step);
    }

    /// Removes the first step with the given name.
    pub fn remove(&mut self, name: &str) {
        if let Some(i) = self.position(name) {
            self.steps.remove(i);
        }
    }

    /// Step names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the pipeline holds no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Executes every step in order.
    pub fn run(&self, namespace: &mut CodeNamespace) {
        for step in &self.steps {
            step.execute(namespace);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }
}

type ModifierFactory = Box<dyn Fn() -> Box<dyn CodeModifier> + Send>;

/// Maps stable step names to factories so configured pipelines can be
/// rebuilt from `(name, options)` tuples alone.
pub struct ModifierRegistry {
    factories: HashMap<String, ModifierFactory>,
}

impl ModifierRegistry {
    /// A registry with no steps.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every built-in step.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("add_doc_comments", || {
            Box::new(doc_comments::AddDocComments::default())
        });
        registry.register("convert_arrays_to_collections", || {
            Box::new(collections::ConvertArraysToCollections::default())
        });
        registry.register("add_non_serialized", || {
            Box::new(non_serialized::AddNonSerialized)
        });
        registry.register("add_non_serialized_events", || {
            Box::new(non_serialized::AddNonSerializedEvents)
        });
        registry.register("remove_object_base", || {
            Box::new(object_base::RemoveObjectBase)
        });
        registry.register("remove_specified_types", || {
            Box::new(remove_types::RemoveSpecifiedTypes::default())
        });
        registry.register("import_fixer", || {
            Box::new(imports::ImportFixer::default())
        });
        registry.register("modify_imports", || {
            Box::new(imports::ModifyImports::default())
        });
        registry.register("strip_proxy_types", || {
            Box::new(proxy::StripProxyTypes::default())
        });
        registry.register("protobuf", || Box::new(protobuf::Protobuf::default()));
        registry.register("browsable_property", || {
            Box::new(property_flags::BrowsableProperty::default())
        });
        registry.register("override_property", || {
            Box::new(property_flags::OverrideProperty::default())
        });
        registry.register("virtual_property", || {
            Box::new(property_flags::VirtualProperty::default())
        });
        registry.register("property_grid_properties", || {
            Box::new(property_grid::PropertyGridProperties::default())
        });
        registry.register("remove_debugger_attribute", || {
            Box::new(attribute_strippers::RemoveDebuggerAttribute)
        });
        registry.register("remove_xml_type_attribute", || {
            Box::new(attribute_strippers::RemoveXmlTypeAttribute)
        });
        registry
    }

    /// Registers a factory under a step name.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn() -> Box<dyn CodeModifier> + Send + 'static,
    ) {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Instantiates a step by name.
    pub fn create(&self, name: &str) -> AppResult<Box<dyn CodeModifier>> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(AppError::General(format!(
                "unknown transformation step '{}'",
                name
            ))),
        }
    }

    /// Builds a pipeline from configuration, applying each entry's options.
    pub fn build_pipeline(&self, configs: &[ModifierConfig]) -> AppResult<ModifierPipeline> {
        let mut pipeline = ModifierPipeline::new();
        for config in configs {
            let mut step = self.create(&config.name)?;
            step.set_options(config.options.clone())?;
            pipeline.add(step);
        }
        Ok(pipeline)
    }
}
