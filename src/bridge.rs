#![deny(missing_docs)]

//! # Method-Call Bridge
//!
//! Marshals XML documents into method invocations and back: deserialize the
//! input document through the method's input wrapper, load the argument
//! slots, invoke, collect the out slots and return value through the output
//! wrapper, and serialize a freshly built output document. [`MethodCall`]
//! resolves everything reflectively per call; [`fast::FastMethodCall`]
//! pre-computes the dispatch at construction. Both honor the same contract
//! behind [`MethodInvocation`].

use crate::error::{AppError, AppResult};
use crate::exporter::{ClassXsdGenerator, NameGenerator};
use crate::registry::{MethodDescriptor, TypeRegistry, Value};
use crate::schema::Schema;
use crate::xml::Document;
use heck::ToUpperCamelCase;
use std::collections::HashSet;
use tracing::warn;

/// Wrapper synthesis.
pub mod wrapper;

/// Wire serialization and the serializer cache.
pub mod serializer;

/// Pre-compiled dispatch.
pub mod fast;

use serializer::SerializerCache;
use wrapper::{Wrapper, WrapperKind};

/// The marshaling contract shared by the reflective and the pre-compiled
/// implementations.
pub trait MethodInvocation {
    /// Marshals one call. The output is always a freshly built document,
    /// never a reused one.
    fn execute(&mut self, input: &Document) -> AppResult<Document>;

    /// Schema documents describing the input wrapper.
    fn input_schemas(&self) -> &[Schema];

    /// Schema documents describing the output wrapper.
    fn output_schemas(&self) -> &[Schema];
}

/// A reflective method-call bridge.
///
/// The target instance is constructed once at build time and reused across
/// calls, so a single bridge must not execute concurrently; share work by
/// constructing one bridge per worker instead.
pub struct MethodCall {
    pub(crate) registry: TypeRegistry,
    pub(crate) descriptor: MethodDescriptor,
    pub(crate) instance: Value,
    pub(crate) input: Wrapper,
    pub(crate) output: Wrapper,
    pub(crate) input_schemas: Vec<Schema>,
    pub(crate) output_schemas: Vec<Schema>,
    pub(crate) cache: &'static SerializerCache,
}

impl MethodCall {
    /// Builds a bridge for `type_name::method_name`. The identifier scopes
    /// generated wrapper and schema names so several bridges over the same
    /// method can coexist.
    pub fn new(
        registry: &TypeRegistry,
        type_name: &str,
        method_name: &str,
        identifier: &str,
    ) -> AppResult<Self> {
        Self::with_cache(
            registry,
            type_name,
            method_name,
            identifier,
            SerializerCache::global(),
        )
    }

    /// Like [`MethodCall::new`] with an explicit serializer cache.
    pub fn with_cache(
        registry: &TypeRegistry,
        type_name: &str,
        method_name: &str,
        identifier: &str,
        cache: &'static SerializerCache,
    ) -> AppResult<Self> {
        let service = registry.get(type_name).ok_or_else(|| {
            AppError::General(format!("type '{}' is not registered", type_name))
        })?;
        let descriptor = service.method(method_name).cloned().ok_or_else(|| {
            AppError::General(format!(
                "type '{}' has no method '{}'",
                type_name, method_name
            ))
        })?;
        let service_ns = service.xml_namespace.clone();

        let scope = format!("{}{}", method_name.to_upper_camel_case(), identifier);
        let inputs = wrapper::input_parameters(&descriptor.parameters);
        let outputs = wrapper::output_parameters(&descriptor.parameters);

        let mut working = registry.clone();
        let input = Self::build_wrapper(
            &format!("{}Input", scope),
            &inputs,
            &mut working,
            service_ns.as_deref(),
        )?;
        let output = Self::build_wrapper(
            &format!("{}Output", scope),
            &outputs,
            &mut working,
            service_ns.as_deref(),
        )?;

        let input_schemas = Self::derive_schemas(
            &working,
            input.type_name(),
            &format!("{}_{}_input", method_name, identifier),
        )?;
        let output_schemas = Self::derive_schemas(
            &working,
            output.type_name(),
            &format!("{}_{}_output", method_name, identifier),
        )?;

        let instance = registry.instantiate(type_name)?;

        Ok(Self {
            registry: working,
            descriptor,
            instance,
            input,
            output,
            input_schemas,
            output_schemas,
            cache,
        })
    }

    fn build_wrapper(
        name: &str,
        parameters: &[&crate::registry::ParameterInfo],
        registry: &mut TypeRegistry,
        namespace: Option<&str>,
    ) -> AppResult<Wrapper> {
        let mut built = wrapper::create_type_from_parameters(name, parameters, registry)
            .ok_or_else(|| {
                warn!("wrapper synthesis failed for '{}', bridging unavailable", name);
                AppError::General(format!(
                    "method bridging is unavailable: wrapper '{}' could not be built",
                    name
                ))
            })?;
        if let WrapperKind::Synthesized(ty) = &mut built.kind {
            ty.xml_namespace = namespace.map(str::to_string);
        }
        built.register(registry);
        Ok(built)
    }

    fn derive_schemas(
        registry: &TypeRegistry,
        type_name: &str,
        naming_base: &str,
    ) -> AppResult<Vec<Schema>> {
        let mut generator =
            ClassXsdGenerator::with_names(NameGenerator::new(naming_base));
        generator.generate(type_name, registry)
    }
}

impl MethodInvocation for MethodCall {
    fn execute(&mut self, input: &Document) -> AppResult<Document> {
        let serializer = self
            .cache
            .get_or_create(self.input.type_name(), &self.registry);
        let input_value = serializer.from_document(input, &self.registry)?;

        let mut args = default_args(&self.descriptor, &self.registry)?;
        load_inputs(&self.input, &input_value, &mut args)?;

        // Reflective dispatch: the thunk is resolved on every call.
        let invoke = self.descriptor.invoke.clone().ok_or_else(|| {
            AppError::General(format!(
                "method '{}' has no invocation behavior",
                self.descriptor.name
            ))
        })?;
        let returned = invoke(&mut self.instance, &mut args)?;

        let output_value = collect_outputs(&self.output, &args, &returned);
        let serializer = self
            .cache
            .get_or_create(self.output.type_name(), &self.registry);
        Ok(serializer.to_document(&output_value))
    }

    fn input_schemas(&self) -> &[Schema] {
        &self.input_schemas
    }

    fn output_schemas(&self) -> &[Schema] {
        &self.output_schemas
    }
}

/// Default-initialized argument slots, one per declared parameter in
/// position order. Out-only slots start at their defaults too.
pub(crate) fn default_args(
    descriptor: &MethodDescriptor,
    registry: &TypeRegistry,
) -> AppResult<Vec<Value>> {
    let count = descriptor
        .declared_parameters()
        .map(|p| p.position as usize + 1)
        .max()
        .unwrap_or(0);
    let mut args = vec![Value::Null; count];
    for parameter in descriptor.declared_parameters() {
        args[parameter.position as usize] =
            registry.default_value(&parameter.ty, &mut HashSet::new())?;
    }
    Ok(args)
}

/// Loads deserialized input into the argument slots: the whole object for a
/// direct wrapper, field by field into each slot's parameter position
/// otherwise.
pub(crate) fn load_inputs(
    input: &Wrapper,
    value: &Value,
    args: &mut [Value],
) -> AppResult<()> {
    match &input.kind {
        WrapperKind::Direct { position, .. } => {
            args[*position as usize] = value.clone();
        }
        WrapperKind::Synthesized(_) => {
            for slot in &input.slots {
                if let Some(field) = value.field(&slot.field_name) {
                    args[slot.position as usize] = field.clone();
                }
            }
        }
    }
    Ok(())
}

/// Collects post-call out slots and the return value into the output
/// wrapper's value.
pub(crate) fn collect_outputs(output: &Wrapper, args: &[Value], returned: &Value) -> Value {
    match &output.kind {
        WrapperKind::Direct { position, .. } => {
            if *position < 0 {
                returned.clone()
            } else {
                args[*position as usize].clone()
            }
        }
        WrapperKind::Synthesized(ty) => {
            let mut fields = indexmap::IndexMap::new();
            for slot in &output.slots {
                let value = if slot.position < 0 {
                    returned.clone()
                } else {
                    args[slot.position as usize].clone()
                };
                fields.insert(slot.field_name.clone(), value);
            }
            Value::Record {
                type_name: ty.name.clone(),
                fields,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Direction, ParameterInfo, RecordType, ValueType};

    fn calculator_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let add = MethodDescriptor::new(
            "add",
            vec![
                ParameterInfo::input("x", ValueType::Int, 0),
                ParameterInfo::input("y", ValueType::Int, 1),
                ParameterInfo::ret(ValueType::Int),
            ],
        )
        .with_invoke(|_instance, args| match (&args[0], &args[1]) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x + y)),
            _ => Err(AppError::General("expected integers".into())),
        });

        let mut calculator = RecordType::new("Calculator")
            .with_namespace("urn:calc")
            .with_method(add);
        calculator.is_service = true;
        registry.register(calculator);
        registry
    }

    #[test]
    fn test_reflective_roundtrip() {
        let registry = calculator_registry();
        let mut call = MethodCall::new(&registry, "Calculator", "add", "t1").unwrap();

        let input = Document::parse("<AddInput><x>2</x><y>40</y></AddInput>").unwrap();
        let output = call.execute(&input).unwrap();
        assert!(output.to_xml_string().contains("<Return>42</Return>"));
    }

    #[test]
    fn test_fresh_document_per_execute() {
        let registry = calculator_registry();
        let mut call = MethodCall::new(&registry, "Calculator", "add", "t2").unwrap();

        let input = Document::parse("<AddInput><x>1</x><y>1</y></AddInput>").unwrap();
        let first = call.execute(&input).unwrap();
        let second = call.execute(&input).unwrap();
        assert_eq!(first, second);

        // Mutating one result must not leak into the next call.
        let mut mutated = first;
        mutated.root.set_attr("tampered", "yes");
        let third = call.execute(&input).unwrap();
        assert_eq!(third, second);
    }

    #[test]
    fn test_missing_method_is_error() {
        let registry = calculator_registry();
        assert!(MethodCall::new(&registry, "Calculator", "subtract", "t").is_err());
    }

    #[test]
    fn test_input_schemas_describe_wrapper() {
        let registry = calculator_registry();
        let call = MethodCall::new(&registry, "Calculator", "add", "t3").unwrap();

        let schemas = call.input_schemas();
        assert_eq!(schemas.len(), 1);
        let wrapper = schemas[0].find_complex_type("Addt3Input").unwrap();
        let names: Vec<_> = wrapper.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_in_out_parameter_round_trips() {
        let mut registry = TypeRegistry::new();
        let bump = MethodDescriptor::new(
            "bump",
            vec![ParameterInfo {
                name: Some("counter".into()),
                ty: ValueType::Int,
                direction: Direction::InOut,
                position: 0,
            }],
        )
        .with_invoke(|_instance, args| {
            if let Value::Int(n) = args[0] {
                args[0] = Value::Int(n + 1);
            }
            Ok(Value::Null)
        });
        registry.register(RecordType::new("Counter").with_method(bump));

        let mut call = MethodCall::new(&registry, "Counter", "bump", "t").unwrap();
        let input = Document::parse("<In><counter>7</counter></In>").unwrap();
        let output = call.execute(&input).unwrap();
        assert!(output.to_xml_string().contains("<counter>8</counter>"));
    }
}
