#![deny(missing_docs)]

//! # Type Registry
//!
//! Runtime descriptors for generated record types, their fields and their
//! methods, plus a dynamic `Value` that instances are held and passed as.
//! The schema exporter walks the registry to produce XSD; the call bridge
//! uses it to build wrapper instances and to dispatch method invocations.
//!
//! Descriptors are plain data. Invocation behavior attaches to a method as a
//! shared thunk so both the reflective and the pre-compiled call paths can
//! reuse one registration.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The dynamic type of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// Unicode string.
    String,
    /// Homogeneous list.
    List(Box<ValueType>),
    /// A registered record type, by name.
    Record(String),
}

impl ValueType {
    /// True for types with a direct XSD built-in mapping.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, ValueType::Record(_) | ValueType::List(_))
    }

    /// The XSD built-in name for primitive types.
    pub fn xsd_name(&self) -> Option<&'static str> {
        match self {
            ValueType::Bool => Some("boolean"),
            ValueType::Int => Some("long"),
            ValueType::Float => Some("double"),
            ValueType::String => Some("string"),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
            ValueType::Record(name) => write!(f, "{}", name),
        }
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; serialized as `xsi:nil`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Unicode string.
    Str(String),
    /// Homogeneous list.
    List(Vec<Value>),
    /// An instance of a registered record type. Field order follows the
    /// descriptor's declaration order.
    Record {
        /// Name of the registered record type.
        type_name: String,
        /// Field values in declaration order.
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    /// A short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Record { .. } => "record",
        }
    }

    /// Returns a record field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Sets a record field; errors for non-records.
    pub fn set_field(&mut self, name: &str, value: Value) -> AppResult<()> {
        match self {
            Value::Record { fields, .. } => {
                fields.insert(name.to_string(), value);
                Ok(())
            }
            other => Err(AppError::General(format!(
                "cannot set field '{}' on a {} value",
                name,
                other.kind()
            ))),
        }
    }
}

/// Parameter passing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Caller to callee.
    In,
    /// Callee to caller only.
    Out,
    /// Both directions.
    InOut,
}

impl Direction {
    /// True for parameters the caller must supply.
    pub fn is_input(&self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    /// True for parameters the callee writes back.
    pub fn is_output(&self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

/// One parameter of a method descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Declared name; synthesized names are used when absent.
    pub name: Option<String>,
    /// Parameter type.
    pub ty: ValueType,
    /// Direction.
    pub direction: Direction,
    /// Zero-based position in the declared parameter list; `-1` marks the
    /// return value.
    pub position: i32,
}

impl ParameterInfo {
    /// A positional input parameter.
    pub fn input(name: &str, ty: ValueType, position: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            direction: Direction::In,
            position,
        }
    }

    /// A positional output parameter.
    pub fn output(name: &str, ty: ValueType, position: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            direction: Direction::Out,
            position,
        }
    }

    /// The return pseudo-parameter.
    pub fn ret(ty: ValueType) -> Self {
        Self {
            name: None,
            ty,
            direction: Direction::Out,
            position: -1,
        }
    }

    /// True when this entry is the return value.
    pub fn is_return(&self) -> bool {
        self.position < 0
    }
}

/// The callable behavior of a method: receiver, then one slot per declared
/// parameter (outputs are written back in place), returning the result.
pub type InvokeFn = dyn Fn(&mut Value, &mut [Value]) -> AppResult<Value> + Send + Sync;

/// A method on a record type.
#[derive(Clone)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: String,
    /// Declared parameters in position order. The return value, when
    /// non-unit, appears as a trailing entry with position `-1`.
    pub parameters: Vec<ParameterInfo>,
    /// Invocation thunk; descriptors without one are declaration-only.
    pub invoke: Option<Arc<InvokeFn>>,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("invoke", &self.invoke.as_ref().map(|_| "..."))
            .finish()
    }
}

impl MethodDescriptor {
    /// A declaration-only method.
    pub fn new(name: &str, parameters: Vec<ParameterInfo>) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            invoke: None,
        }
    }

    /// Attaches invocation behavior.
    pub fn with_invoke(
        mut self,
        f: impl Fn(&mut Value, &mut [Value]) -> AppResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.invoke = Some(Arc::new(f));
        self
    }

    /// Declared (non-return) parameters in position order.
    pub fn declared_parameters(&self) -> impl Iterator<Item = &ParameterInfo> {
        self.parameters.iter().filter(|p| !p.is_return())
    }

    /// The return entry, if the method returns a value.
    pub fn return_parameter(&self) -> Option<&ParameterInfo> {
        self.parameters.iter().find(|p| p.is_return())
    }
}

/// A field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: ValueType,
}

/// A registered record type.
#[derive(Debug, Clone)]
pub struct RecordType {
    /// Type name, unique within a registry.
    pub name: String,
    /// XML namespace the type serializes under.
    pub xml_namespace: Option<String>,
    /// Abstract types are described but never instantiated.
    pub is_abstract: bool,
    /// Marks the type as a service description. A registry may hold at most
    /// one service type per lookup.
    pub is_service: bool,
    /// Base type name, if any.
    pub base: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDescriptor>,
}

impl RecordType {
    /// Creates an empty record type.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            xml_namespace: None,
            is_abstract: false,
            is_service: false,
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Sets the XML namespace.
    pub fn with_namespace(mut self, ns: &str) -> Self {
        self.xml_namespace = Some(ns.to_string());
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, name: &str, ty: ValueType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            ty,
        });
        self
    }

    /// Appends a method.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Finds a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A name-keyed collection of record types.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RecordType>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any previous registration with the same
    /// name.
    pub fn register(&mut self, ty: RecordType) {
        self.types.insert(ty.name.clone(), ty);
    }

    /// Looks a type up by name.
    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.types.get(name)
    }

    /// All registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &RecordType> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the single service type, failing when zero or several types
    /// carry the service marker.
    pub fn single_service(&self) -> AppResult<&RecordType> {
        let mut services = self.types.values().filter(|t| t.is_service);
        match (services.next(), services.next()) {
            (Some(s), None) => Ok(s),
            (None, _) => Err(AppError::General(
                "no service description is registered".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::General(
                "more than one service description is registered".to_string(),
            )),
        }
    }

    /// Constructs a default-valued instance of a registered type. Nested
    /// record fields are constructed recursively; recursion into a type
    /// already on the construction path yields `Null` instead of looping.
    pub fn instantiate(&self, name: &str) -> AppResult<Value> {
        let mut in_progress = HashSet::new();
        self.instantiate_guarded(name, &mut in_progress)
    }

    fn instantiate_guarded(
        &self,
        name: &str,
        in_progress: &mut HashSet<String>,
    ) -> AppResult<Value> {
        let ty = self.get(name).ok_or_else(|| {
            AppError::General(format!("type '{}' is not registered", name))
        })?;
        if ty.is_abstract {
            return Err(AppError::General(format!(
                "type '{}' is abstract and cannot be instantiated",
                name
            )));
        }

        in_progress.insert(name.to_string());
        let mut fields = IndexMap::new();
        for field in &self.field_chain(ty) {
            fields.insert(
                field.name.clone(),
                self.default_value(&field.ty, in_progress)?,
            );
        }
        in_progress.remove(name);

        Ok(Value::Record {
            type_name: name.to_string(),
            fields,
        })
    }

    /// The full field layout of a type, base-chain fields included, in
    /// serialization order. Empty for unregistered names.
    pub fn all_fields(&self, name: &str) -> Vec<FieldDescriptor> {
        self.get(name)
            .map(|ty| self.field_chain(ty))
            .unwrap_or_default()
    }

    /// Base-chain fields first, then the type's own, matching serialization
    /// order for derived types.
    fn field_chain(&self, ty: &RecordType) -> Vec<FieldDescriptor> {
        let mut visited = HashSet::new();
        self.field_chain_guarded(ty, &mut visited)
    }

    /// A base link back onto the walked path ends the chain at that point;
    /// nothing stops the registry from holding one.
    fn field_chain_guarded(
        &self,
        ty: &RecordType,
        visited: &mut HashSet<String>,
    ) -> Vec<FieldDescriptor> {
        let mut chain = Vec::new();
        if visited.insert(ty.name.clone()) {
            if let Some(base) = ty.base.as_deref().and_then(|b| self.get(b)) {
                chain.extend(self.field_chain_guarded(base, visited));
            }
            chain.extend(ty.fields.iter().cloned());
        }
        chain
    }

    /// The default value for a type: zero-like for primitives, empty for
    /// lists, a fresh instance for records.
    pub fn default_value(
        &self,
        ty: &ValueType,
        in_progress: &mut HashSet<String>,
    ) -> AppResult<Value> {
        Ok(match ty {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::Str(String::new()),
            ValueType::List(_) => Value::List(Vec::new()),
            ValueType::Record(name) => {
                if in_progress.contains(name) {
                    Value::Null
                } else {
                    self.instantiate_guarded(name, in_progress)?
                }
            }
        })
    }
}
