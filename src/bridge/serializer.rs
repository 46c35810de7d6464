//! Wire serialization between values and XML documents.
//!
//! Element names match field names, records nest, lists repeat their
//! field's element, and `Null` serializes as `xsi:nil`. Serializer
//! construction resolves the wrapper's field layout once; the process-wide
//! cache amortizes that across calls and can be disabled or replaced per
//! bridge.

use crate::error::{AppError, AppResult};
use crate::registry::{FieldDescriptor, TypeRegistry, Value, ValueType};
use crate::xml::{Document, Element};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const XSI_NIL: &str = "xsi:nil";

/// Serializes one wrapper type to and from documents.
#[derive(Debug)]
pub struct WrapperSerializer {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl WrapperSerializer {
    /// Builds a serializer for a registered type, resolving its full field
    /// layout up front.
    pub fn new(type_name: &str, registry: &TypeRegistry) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: registry.all_fields(type_name),
        }
    }

    /// The wrapper type this serializer handles.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Serializes a value into a freshly built document.
    pub fn to_document(&self, value: &Value) -> Document {
        Document::new(write_value(&self.type_name, value))
    }

    /// Deserializes a document against the wrapper layout. Missing elements
    /// take the field's default; malformed text is a validation error.
    pub fn from_document(
        &self,
        document: &Document,
        registry: &TypeRegistry,
    ) -> AppResult<Value> {
        read_record(&self.type_name, &self.fields, &document.root, registry)
    }
}

fn write_value(name: &str, value: &Value) -> Element {
    match value {
        Value::Null => {
            let mut e = Element::new(name);
            e.set_attr(XSI_NIL, "true");
            e
        }
        Value::Bool(b) => Element::with_text(name, if *b { "true" } else { "false" }),
        Value::Int(n) => Element::with_text(name, &n.to_string()),
        Value::Float(f) => Element::with_text(name, &f.to_string()),
        Value::Str(s) => Element::with_text(name, s),
        Value::List(items) => {
            // Lists never appear bare; the caller flattens them onto the
            // owning field's element name. A bare list still round-trips
            // under a generic item name.
            let mut e = Element::new(name);
            for item in items {
                e.children.push(write_value("Item", item));
            }
            e
        }
        Value::Record { fields, .. } => {
            let mut e = Element::new(name);
            for (field_name, field_value) in fields {
                if let Value::List(items) = field_value {
                    for item in items {
                        e.children.push(write_value(field_name, item));
                    }
                } else {
                    e.children.push(write_value(field_name, field_value));
                }
            }
            e
        }
    }
}

fn read_record(
    type_name: &str,
    fields: &[FieldDescriptor],
    element: &Element,
    registry: &TypeRegistry,
) -> AppResult<Value> {
    let mut out = indexmap::IndexMap::new();
    for field in fields {
        let value = match &field.ty {
            ValueType::List(inner) => {
                let mut items = Vec::new();
                for child in element.children_named(&field.name) {
                    items.push(read_value(inner, child, registry)?);
                }
                Value::List(items)
            }
            other => match element.child(&field.name) {
                Some(child) => read_value(other, child, registry)?,
                None => registry.default_value(other, &mut HashSet::new())?,
            },
        };
        out.insert(field.name.clone(), value);
    }
    Ok(Value::Record {
        type_name: type_name.to_string(),
        fields: out,
    })
}

fn read_value(ty: &ValueType, element: &Element, registry: &TypeRegistry) -> AppResult<Value> {
    if element.attr(XSI_NIL) == Some("true") {
        return Ok(Value::Null);
    }
    let text = element.text.as_deref().unwrap_or("");
    match ty {
        ValueType::Bool => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" | "" => Ok(Value::Bool(false)),
            other => Err(AppError::Validation(format!(
                "'{}' is not a boolean",
                other
            ))),
        },
        ValueType::Int => {
            if text.is_empty() {
                return Ok(Value::Int(0));
            }
            text.parse()
                .map(Value::Int)
                .map_err(|_| AppError::Validation(format!("'{}' is not an integer", text)))
        }
        ValueType::Float => {
            if text.is_empty() {
                return Ok(Value::Float(0.0));
            }
            text.parse()
                .map(Value::Float)
                .map_err(|_| AppError::Validation(format!("'{}' is not a number", text)))
        }
        ValueType::String => Ok(Value::Str(text.to_string())),
        ValueType::List(inner) => {
            let mut items = Vec::new();
            for child in &element.children {
                items.push(read_value(inner, child, registry)?);
            }
            Ok(Value::List(items))
        }
        ValueType::Record(name) => {
            let fields = registry.all_fields(name);
            read_record(name, &fields, element, registry)
        }
    }
}

/// A thread-safe serializer cache keyed by wrapper type name.
///
/// Disabling the cache makes `get_or_create` build a fresh serializer per
/// call, which matters when the registry changes between calls.
#[derive(Debug, Default)]
pub struct SerializerCache {
    disabled: AtomicBool,
    entries: Mutex<HashMap<String, Arc<WrapperSerializer>>>,
}

static GLOBAL_CACHE: Lazy<SerializerCache> = Lazy::new(SerializerCache::default);

impl SerializerCache {
    /// Creates an empty, enabled cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache instance.
    pub fn global() -> &'static SerializerCache {
        &GLOBAL_CACHE
    }

    /// Enables or disables caching. Disabling also drops current entries.
    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::Relaxed);
        if !enabled {
            self.clear();
        }
    }

    /// True while caching is on.
    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Relaxed)
    }

    /// Drops every cached serializer.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Returns the serializer for a type, building and caching it on first
    /// use.
    pub fn get_or_create(
        &self,
        type_name: &str,
        registry: &TypeRegistry,
    ) -> Arc<WrapperSerializer> {
        if self.is_enabled() {
            if let Ok(mut entries) = self.entries.lock() {
                return entries
                    .entry(type_name.to_string())
                    .or_insert_with(|| Arc::new(WrapperSerializer::new(type_name, registry)))
                    .clone();
            }
        }
        Arc::new(WrapperSerializer::new(type_name, registry))
    }
}
