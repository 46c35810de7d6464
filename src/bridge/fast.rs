//! Pre-compiled method dispatch.
//!
//! `FastMethodCall` honors the same contract as the reflective bridge but
//! moves every per-call lookup to construction time: the invocation thunk,
//! both serializers, the default argument template and the slot plans are
//! all resolved once, leaving `execute` with clone-fill-call-collect.

use super::serializer::WrapperSerializer;
use super::wrapper::WrapperKind;
use super::{MethodCall, MethodInvocation};
use crate::error::{AppError, AppResult};
use crate::registry::{InvokeFn, TypeRegistry, Value};
use crate::schema::Schema;
use crate::xml::Document;
use std::sync::Arc;

/// Where an input document lands in the argument slots.
enum InputPlan {
    /// The whole deserialized value fills one slot.
    Whole(usize),
    /// Field name to slot index, in wrapper field order.
    Fields(Vec<(String, usize)>),
}

/// Where one output wrapper field comes from.
enum SlotSource {
    /// A post-call argument slot.
    Arg(usize),
    /// The return value.
    Return,
}

/// How the output value is assembled.
enum OutputPlan {
    /// The output is a single slot or the return value itself.
    Whole(SlotSource),
    /// A synthesized record built field by field.
    Fields {
        type_name: String,
        fields: Vec<(String, SlotSource)>,
    },
}

/// A method-call bridge with dispatch pre-compiled at construction.
pub struct FastMethodCall {
    registry: TypeRegistry,
    instance: Value,
    invoke: Arc<InvokeFn>,
    template: Vec<Value>,
    input_plan: InputPlan,
    output_plan: OutputPlan,
    input_serializer: Arc<WrapperSerializer>,
    output_serializer: Arc<WrapperSerializer>,
    input_schemas: Vec<Schema>,
    output_schemas: Vec<Schema>,
}

impl FastMethodCall {
    /// Builds the bridge. Unlike the reflective path, a method without
    /// invocation behavior is rejected here instead of at the first call.
    pub fn new(
        registry: &TypeRegistry,
        type_name: &str,
        method_name: &str,
        identifier: &str,
    ) -> AppResult<Self> {
        let call = MethodCall::new(registry, type_name, method_name, identifier)?;

        let invoke = call.descriptor.invoke.clone().ok_or_else(|| {
            AppError::General(format!(
                "method '{}' has no invocation behavior",
                call.descriptor.name
            ))
        })?;

        let template = super::default_args(&call.descriptor, &call.registry)?;

        let input_plan = match &call.input.kind {
            WrapperKind::Direct { position, .. } => InputPlan::Whole(*position as usize),
            WrapperKind::Synthesized(_) => InputPlan::Fields(
                call.input
                    .slots
                    .iter()
                    .map(|s| (s.field_name.clone(), s.position as usize))
                    .collect(),
            ),
        };

        let output_plan = match &call.output.kind {
            WrapperKind::Direct { position, .. } => OutputPlan::Whole(if *position < 0 {
                SlotSource::Return
            } else {
                SlotSource::Arg(*position as usize)
            }),
            WrapperKind::Synthesized(ty) => OutputPlan::Fields {
                type_name: ty.name.clone(),
                fields: call
                    .output
                    .slots
                    .iter()
                    .map(|s| {
                        let source = if s.position < 0 {
                            SlotSource::Return
                        } else {
                            SlotSource::Arg(s.position as usize)
                        };
                        (s.field_name.clone(), source)
                    })
                    .collect(),
            },
        };

        let input_serializer = call
            .cache
            .get_or_create(call.input.type_name(), &call.registry);
        let output_serializer = call
            .cache
            .get_or_create(call.output.type_name(), &call.registry);

        Ok(Self {
            registry: call.registry,
            instance: call.instance,
            invoke,
            template,
            input_plan,
            output_plan,
            input_serializer,
            output_serializer,
            input_schemas: call.input_schemas,
            output_schemas: call.output_schemas,
        })
    }
}

impl MethodInvocation for FastMethodCall {
    fn execute(&mut self, input: &Document) -> AppResult<Document> {
        let input_value = self.input_serializer.from_document(input, &self.registry)?;

        let mut args = self.template.clone();
        match &self.input_plan {
            InputPlan::Whole(slot) => args[*slot] = input_value,
            InputPlan::Fields(fields) => {
                for (name, slot) in fields {
                    if let Some(value) = input_value.field(name) {
                        args[*slot] = value.clone();
                    }
                }
            }
        }

        let returned = (self.invoke)(&mut self.instance, &mut args)?;

        let output_value = match &self.output_plan {
            OutputPlan::Whole(SlotSource::Return) => returned,
            OutputPlan::Whole(SlotSource::Arg(slot)) => args[*slot].clone(),
            OutputPlan::Fields { type_name, fields } => {
                let mut out = indexmap::IndexMap::new();
                for (name, source) in fields {
                    let value = match source {
                        SlotSource::Return => returned.clone(),
                        SlotSource::Arg(slot) => args[*slot].clone(),
                    };
                    out.insert(name.clone(), value);
                }
                Value::Record {
                    type_name: type_name.clone(),
                    fields: out,
                }
            }
        };

        Ok(self.output_serializer.to_document(&output_value))
    }

    fn input_schemas(&self) -> &[Schema] {
        &self.input_schemas
    }

    fn output_schemas(&self) -> &[Schema] {
        &self.output_schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MethodDescriptor, ParameterInfo, RecordType, ValueType};

    fn registry() -> TypeRegistry {
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
        registry.register(RecordType::new("Calculator").with_method(add));
        registry
    }

    #[test]
    fn test_fast_roundtrip() {
        let registry = registry();
        let mut call = FastMethodCall::new(&registry, "Calculator", "add", "f1").unwrap();

        let input = Document::parse("<In><x>19</x><y>23</y></In>").unwrap();
        let output = call.execute(&input).unwrap();
        assert!(output.to_xml_string().contains("<Return>42</Return>"));
    }

    #[test]
    fn test_missing_thunk_rejected_at_construction() {
        let mut registry = TypeRegistry::new();
        let declared_only = MethodDescriptor::new(
            "noop",
            vec![ParameterInfo::input("x", ValueType::Int, 0)],
        );
        registry.register(RecordType::new("Svc").with_method(declared_only));

        assert!(FastMethodCall::new(&registry, "Svc", "noop", "f").is_err());
    }
}
