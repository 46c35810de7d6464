//! Parameter wrapper synthesis.
//!
//! A method's inputs and outputs each marshal through one wrapper type.
//! When a list degenerates to a single record entry the record itself is
//! the wrapper; otherwise a record type is synthesized with one field per
//! entry.

use crate::registry::{ParameterInfo, RecordType, TypeRegistry, ValueType};
use tracing::warn;

/// One wrapper field and the parameter slot it marshals.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperSlot {
    /// Field name on the wrapper type.
    pub field_name: String,
    /// Parameter position the field maps to; `-1` is the return value.
    pub position: i32,
    /// Slot type.
    pub ty: ValueType,
}

/// How a parameter list marshals.
#[derive(Debug, Clone)]
pub enum WrapperKind {
    /// The list is a single record entry; the record is the wrapper.
    Direct {
        /// The record type name.
        type_name: String,
        /// The parameter position the whole document maps to.
        position: i32,
    },
    /// A synthesized record with one field per entry.
    Synthesized(RecordType),
}

/// A wrapper: its kind plus the slot layout in list order.
#[derive(Debug, Clone)]
pub struct Wrapper {
    /// Direct or synthesized.
    pub kind: WrapperKind,
    /// Slots in list order; empty for direct wrappers.
    pub slots: Vec<WrapperSlot>,
}

impl Wrapper {
    /// The type name documents serialize under.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            WrapperKind::Direct { type_name, .. } => type_name,
            WrapperKind::Synthesized(ty) => &ty.name,
        }
    }

    /// Registers a synthesized wrapper type; direct wrappers are already
    /// registered.
    pub fn register(&self, registry: &mut TypeRegistry) {
        if let WrapperKind::Synthesized(ty) = &self.kind {
            registry.register(ty.clone());
        }
    }
}

/// The parameters the caller supplies: everything not out-only, in
/// declaration order.
pub fn input_parameters(parameters: &[ParameterInfo]) -> Vec<&ParameterInfo> {
    parameters
        .iter()
        .filter(|p| !p.is_return() && p.direction.is_input())
        .collect()
}

/// The parameters the callee hands back: out and in-out slots in
/// declaration order, then the return value last.
pub fn output_parameters(parameters: &[ParameterInfo]) -> Vec<&ParameterInfo> {
    let mut outputs: Vec<&ParameterInfo> = parameters
        .iter()
        .filter(|p| !p.is_return() && p.direction.is_output())
        .collect();
    outputs.extend(parameters.iter().filter(|p| p.is_return()));
    outputs
}

/// The wrapper field name for a list entry: the declared name when there is
/// one, `Return` for the return value, `Parameter{N}` otherwise.
pub fn slot_name(parameter: &ParameterInfo) -> String {
    match &parameter.name {
        Some(name) => name.clone(),
        None if parameter.is_return() => "Return".to_string(),
        None => format!("Parameter{}", parameter.position),
    }
}

/// Builds the wrapper for a parameter list. `None` means synthesis failed
/// (a record entry is not registered) and bridging is unavailable for this
/// method; the cause is logged.
pub fn create_type_from_parameters(
    name: &str,
    parameters: &[&ParameterInfo],
    registry: &TypeRegistry,
) -> Option<Wrapper> {
    // Record entries must be resolvable whichever shape we pick.
    for parameter in parameters {
        if let ValueType::Record(record) = &parameter.ty {
            if registry.get(record).is_none() {
                warn!(
                    "cannot build wrapper '{}': record type '{}' is not registered",
                    name, record
                );
                return None;
            }
        }
    }

    // A single record entry marshals as itself.
    if let [only] = parameters {
        if let ValueType::Record(record) = &only.ty {
            return Some(Wrapper {
                kind: WrapperKind::Direct {
                    type_name: record.clone(),
                    position: only.position,
                },
                slots: Vec::new(),
            });
        }
    }

    let mut ty = RecordType::new(name);
    let mut slots = Vec::new();
    for parameter in parameters {
        let field = slot_name(parameter);
        ty = ty.with_field(&field, parameter.ty.clone());
        slots.push(WrapperSlot {
            field_name: field,
            position: parameter.position,
            ty: parameter.ty.clone(),
        });
    }

    Some(Wrapper {
        kind: WrapperKind::Synthesized(ty),
        slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Direction;

    #[test]
    fn test_single_record_input_is_direct() {
        let mut registry = TypeRegistry::new();
        registry.register(RecordType::new("AddRequest").with_field("X", ValueType::Int));

        let param = ParameterInfo::input("request", ValueType::Record("AddRequest".into()), 0);
        let wrapper =
            create_type_from_parameters("AddInput", &[&param], &registry).unwrap();
        assert!(matches!(wrapper.kind, WrapperKind::Direct { .. }));
        assert_eq!(wrapper.type_name(), "AddRequest");
    }

    #[test]
    fn test_two_primitives_synthesize_named_fields() {
        let registry = TypeRegistry::new();
        let x = ParameterInfo::input("x", ValueType::Int, 0);
        let y = ParameterInfo::input("y", ValueType::Int, 1);
        let wrapper =
            create_type_from_parameters("AddInput", &[&x, &y], &registry).unwrap();

        match &wrapper.kind {
            WrapperKind::Synthesized(ty) => {
                let names: Vec<_> = ty.fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["x", "y"]);
            }
            _ => panic!("expected synthesized wrapper"),
        }
    }

    #[test]
    fn test_unnamed_slots_get_positional_names() {
        let registry = TypeRegistry::new();
        let unnamed = ParameterInfo {
            name: None,
            ty: ValueType::Int,
            direction: Direction::In,
            position: 2,
        };
        let ret = ParameterInfo::ret(ValueType::String);
        let wrapper =
            create_type_from_parameters("Output", &[&unnamed, &ret], &registry).unwrap();
        let names: Vec<_> = wrapper
            .slots
            .iter()
            .map(|s| s.field_name.as_str())
            .collect();
        assert_eq!(names, vec!["Parameter2", "Return"]);
    }

    #[test]
    fn test_output_ordering_return_last() {
        let parameters = vec![
            ParameterInfo::input("seed", ValueType::Int, 0),
            ParameterInfo::output("a", ValueType::Int, 1),
            ParameterInfo {
                name: Some("b".into()),
                ty: ValueType::Int,
                direction: Direction::InOut,
                position: 2,
            },
            ParameterInfo::ret(ValueType::Int),
        ];
        let outputs = output_parameters(&parameters);
        let names: Vec<String> = outputs.iter().map(|p| slot_name(p)).collect();
        assert_eq!(names, vec!["a", "b", "Return"]);

        let inputs = input_parameters(&parameters);
        let names: Vec<String> = inputs.iter().map(|p| slot_name(p)).collect();
        // In-out parameters appear on both sides; out-only ones never in
        // the input list.
        assert_eq!(names, vec!["seed", "b"]);
    }

    #[test]
    fn test_unregistered_record_fails_synthesis() {
        let registry = TypeRegistry::new();
        let param = ParameterInfo::input("request", ValueType::Record("Missing".into()), 0);
        assert!(create_type_from_parameters("Input", &[&param], &registry).is_none());
    }
}
