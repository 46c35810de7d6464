#![deny(missing_docs)]

//! # XSD Codegen
//!
//! Bidirectional XML-Schema tooling: import XSD into a code model and
//! render it as source, export runtime type descriptors back to XSD, and
//! bridge XML documents onto method invocations.

/// Shared error types.
pub mod error;

/// Owned XML document model.
pub mod xml;

/// Schema model, parser and writer.
pub mod schema;

/// Language-agnostic code model.
pub mod code_model;

/// Runtime type registry and dynamic values.
pub mod registry;

/// XSD to code-model import.
pub mod importer;

/// Registry types to XSD export.
pub mod exporter;

/// Named transformation pipeline.
pub mod modifiers;

/// Code-model to source rendering.
pub mod codegen;

/// Rendered-source validation.
pub mod compiler;

/// Method-call marshaling.
pub mod bridge;

pub use bridge::{fast::FastMethodCall, MethodCall, MethodInvocation};
pub use codegen::{render_namespace, render_type};
pub use compiler::{CompileResult, CompiledModule, Compiler, Diagnostic, Severity};
pub use error::{AppError, AppResult, FacetViolation};
pub use exporter::{ClassXsdGenerator, NameGenerator};
pub use importer::XsdClassGenerator;
pub use modifiers::{CodeModifier, ModifierConfig, ModifierPipeline, ModifierRegistry};
pub use registry::{
    Direction, MethodDescriptor, ParameterInfo, RecordType, TypeRegistry, Value, ValueType,
};
pub use schema::{Schema, SchemaSet};
