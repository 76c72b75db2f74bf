use std::fmt;
use std::sync::Arc;

/// Scalar value types a field can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Bool,
    String,
    Bytes,
    Float,
    Double,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        };
        write!(f, "{name}")
    }
}

/// Key types permitted on map fields (no float or bytes keys)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKeyType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Bool,
    String,
}

impl fmt::Display for MapKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapKeyType::Int32 => "int32",
            MapKeyType::Int64 => "int64",
            MapKeyType::UInt32 => "uint32",
            MapKeyType::UInt64 => "uint64",
            MapKeyType::Bool => "bool",
            MapKeyType::String => "string",
        };
        write!(f, "{name}")
    }
}

/// A named enumeration with (name, number) values
#[derive(Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(value_name, number)| (value_name.into(), number))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[(String, i32)] {
        &self.values
    }

    pub fn number_by_name(&self, value_name: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(name, _)| name == value_name)
            .map(|(_, number)| *number)
    }

    pub fn name_by_number(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| name.as_str())
    }
}

/// Value type of a singular field, repeated element, or map value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Enum(Arc<EnumDescriptor>),
    Message(Arc<MessageDescriptor>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(scalar) => write!(f, "{scalar}"),
            FieldType::Enum(desc) => write!(f, "enum {}", desc.name()),
            FieldType::Message(desc) => write!(f, "message {}", desc.full_name()),
        }
    }
}

/// Declared shape of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Singular(FieldType),
    Repeated(FieldType),
    Map { key: MapKeyType, value: FieldType },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Singular(ty) => write!(f, "{ty}"),
            FieldKind::Repeated(ty) => write!(f, "repeated {ty}"),
            FieldKind::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

/// One declared field of a message schema. Oneof membership is only
/// meaningful on singular fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    oneof: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            oneof: None,
        }
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldKind::Singular(FieldType::Scalar(scalar)))
    }

    pub fn enumeration(name: impl Into<String>, descriptor: Arc<EnumDescriptor>) -> Self {
        Self::new(name, FieldKind::Singular(FieldType::Enum(descriptor)))
    }

    pub fn message(name: impl Into<String>, descriptor: Arc<MessageDescriptor>) -> Self {
        Self::new(name, FieldKind::Singular(FieldType::Message(descriptor)))
    }

    pub fn repeated(name: impl Into<String>, element: FieldType) -> Self {
        Self::new(name, FieldKind::Repeated(element))
    }

    pub fn map(name: impl Into<String>, key: MapKeyType, value: FieldType) -> Self {
        Self::new(name, FieldKind::Map { key, value })
    }

    /// Place this field in the named oneof group
    pub fn in_oneof(mut self, group: impl Into<String>) -> Self {
        self.oneof = Some(group.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn oneof(&self) -> Option<&str> {
        self.oneof.as_deref()
    }
}

/// Schema of one message type: a full name plus its declared fields in
/// declaration order
#[derive(Debug, PartialEq, Eq)]
pub struct MessageDescriptor {
    full_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Distinct oneof group names, in declaration order of their first
    /// member
    pub fn oneof_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for field in &self.fields {
            if let Some(group) = field.oneof() {
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_by_name() {
        let mut desc = MessageDescriptor::new("test.Foo");
        desc.add_field(FieldDescriptor::scalar("name", ScalarType::String));
        desc.add_field(FieldDescriptor::scalar("size", ScalarType::Int64));

        assert_eq!(desc.field("name").map(FieldDescriptor::name), Some("name"));
        assert!(desc.field("missing").is_none());
        assert_eq!(desc.fields().len(), 2);
    }

    #[test]
    fn oneof_groups_deduplicated_in_order() {
        let mut desc = MessageDescriptor::new("test.Bar");
        desc.add_field(FieldDescriptor::scalar("short_id", ScalarType::Int32).in_oneof("id"));
        desc.add_field(FieldDescriptor::scalar("name", ScalarType::String));
        desc.add_field(FieldDescriptor::scalar("long_id", ScalarType::Int64).in_oneof("id"));

        assert_eq!(desc.oneof_groups(), vec!["id"]);
        assert_eq!(desc.field("short_id").and_then(FieldDescriptor::oneof), Some("id"));
        assert_eq!(desc.field("name").and_then(FieldDescriptor::oneof), None);
    }

    #[test]
    fn enum_lookups() {
        let status = EnumDescriptor::new("test.Status", [("OK", 0), ("ERROR", 1)]);
        assert_eq!(status.number_by_name("ERROR"), Some(1));
        assert_eq!(status.name_by_number(0), Some("OK"));
        assert_eq!(status.number_by_name("UNKNOWN"), None);
        assert_eq!(status.name_by_number(7), None);
    }
}
