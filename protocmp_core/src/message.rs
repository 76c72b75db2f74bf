use crate::descriptor::{FieldKind, FieldType, MapKeyType, MessageDescriptor, ScalarType};
use protocmp_common::{ProtoCmpError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Map field key. Ordered so map entries iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    String(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int32(v) => write!(f, "{v}"),
            MapKey::Int64(v) => write!(f, "{v}"),
            MapKey::UInt32(v) => write!(f, "{v}"),
            MapKey::UInt64(v) => write!(f, "{v}"),
            MapKey::Bool(v) => write!(f, "{v}"),
            MapKey::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl MapKey {
    fn key_type(&self) -> MapKeyType {
        match self {
            MapKey::Int32(_) => MapKeyType::Int32,
            MapKey::Int64(_) => MapKeyType::Int64,
            MapKey::UInt32(_) => MapKeyType::UInt32,
            MapKey::UInt64(_) => MapKeyType::UInt64,
            MapKey::Bool(_) => MapKeyType::Bool,
            MapKey::String(_) => MapKeyType::String,
        }
    }
}

/// A field value of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Float(f32),
    Double(f64),
    Enum(i32),
    Message(DynamicMessage),
    List(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "{v:02x?}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Enum(v) => write!(f, "{v}"),
            Value::Message(m) => write!(f, "{} {{..}}", m.descriptor().full_name()),
            Value::List(v) => write!(f, "[{} elements]", v.len()),
            Value::Map(v) => write!(f, "{{{} entries}}", v.len()),
        }
    }
}

/// A message instance: a descriptor plus the values of its set fields.
///
/// Presence is explicit. A field is set iff it has been assigned, with
/// one exception: repeated and map fields have no presence, so assigning
/// an empty list or map clears the field instead.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<String, Value>,
}

impl DynamicMessage {
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Assign a field. The value is type-checked (deeply, for lists,
    /// maps, and nested messages) against the declared kind. Assigning a
    /// member of a oneof group clears the group's other members.
    pub fn set(&mut self, field: &str, value: Value) -> Result<()> {
        let declared = self.descriptor.field(field).ok_or_else(|| {
            ProtoCmpError::UnknownField {
                message: self.descriptor.full_name().to_string(),
                field: field.to_string(),
            }
        })?;

        check_value(declared.kind(), &value).map_err(|reason| ProtoCmpError::FieldType {
            field: field.to_string(),
            reason,
        })?;

        match &value {
            Value::List(items) if items.is_empty() => {
                self.fields.remove(field);
                return Ok(());
            }
            Value::Map(entries) if entries.is_empty() => {
                self.fields.remove(field);
                return Ok(());
            }
            _ => {}
        }

        if let Some(group) = declared.oneof() {
            let siblings: Vec<String> = self
                .descriptor
                .fields()
                .iter()
                .filter(|f| f.oneof() == Some(group) && f.name() != field)
                .map(|f| f.name().to_string())
                .collect();
            for sibling in siblings {
                self.fields.remove(&sibling);
            }
        }

        self.fields.insert(field.to_string(), value);
        Ok(())
    }

    pub fn clear(&mut self, field: &str) {
        self.fields.remove(field);
    }

    /// Name of the set member of a oneof group, if any
    pub fn oneof_case(&self, group: &str) -> Option<&str> {
        self.descriptor
            .fields()
            .iter()
            .find(|f| f.oneof() == Some(group) && self.fields.contains_key(f.name()))
            .map(|f| f.name())
    }
}

fn check_value(kind: &FieldKind, value: &Value) -> std::result::Result<(), String> {
    match kind {
        FieldKind::Singular(ty) => check_single(ty, value),
        FieldKind::Repeated(element) => match value {
            Value::List(items) => {
                for item in items {
                    check_single(element, item)?;
                }
                Ok(())
            }
            other => Err(format!("expected a list, got {}", other.kind_name())),
        },
        FieldKind::Map { key, value: value_type } => match value {
            Value::Map(entries) => {
                for (entry_key, entry_value) in entries {
                    if entry_key.key_type() != *key {
                        return Err(format!(
                            "expected {key} map key, got {}",
                            entry_key.key_type()
                        ));
                    }
                    check_single(value_type, entry_value)?;
                }
                Ok(())
            }
            other => Err(format!("expected a map, got {}", other.kind_name())),
        },
    }
}

fn check_single(ty: &FieldType, value: &Value) -> std::result::Result<(), String> {
    let ok = match (ty, value) {
        (FieldType::Scalar(ScalarType::Int32), Value::Int32(_)) => true,
        (FieldType::Scalar(ScalarType::Int64), Value::Int64(_)) => true,
        (FieldType::Scalar(ScalarType::UInt32), Value::UInt32(_)) => true,
        (FieldType::Scalar(ScalarType::UInt64), Value::UInt64(_)) => true,
        (FieldType::Scalar(ScalarType::Bool), Value::Bool(_)) => true,
        (FieldType::Scalar(ScalarType::String), Value::String(_)) => true,
        (FieldType::Scalar(ScalarType::Bytes), Value::Bytes(_)) => true,
        (FieldType::Scalar(ScalarType::Float), Value::Float(_)) => true,
        (FieldType::Scalar(ScalarType::Double), Value::Double(_)) => true,
        (FieldType::Enum(_), Value::Enum(_)) => true,
        (FieldType::Message(declared), Value::Message(msg)) => {
            if msg.descriptor().full_name() == declared.full_name() {
                true
            } else {
                return Err(format!(
                    "expected message `{}`, got `{}`",
                    declared.full_name(),
                    msg.descriptor().full_name()
                ));
            }
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("expected {ty}, got {}", value.kind_name()))
    }
}
