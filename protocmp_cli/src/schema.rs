use protocmp_common::{ProtoCmpError, Result};
use protocmp_core::{
    EnumDescriptor, FieldDescriptor, FieldKind, FieldType, MapKeyType, MessageDescriptor,
    ScalarType,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// TOML schema description: named enums and messages plus the root
/// message type the compared instances declare.
#[derive(Debug, Deserialize)]
pub struct SchemaFile {
    pub root: String,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

#[derive(Debug, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Deserialize)]
pub struct MessageDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Scalar keyword (`int32`, `string`, ...) or the name of a declared
    /// enum or message
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub repeated: bool,
    /// Present iff this is a map field; `type` then names the value type
    #[serde(default)]
    pub map_key: Option<String>,
    #[serde(default)]
    pub oneof: Option<String>,
}

/// Parse a schema description and resolve it to the root descriptor.
pub fn parse_schema(text: &str) -> Result<Arc<MessageDescriptor>> {
    let file: SchemaFile =
        toml::from_str(text).map_err(|e| ProtoCmpError::Serialization(e.to_string()))?;
    build_schema(file)
}

fn build_schema(file: SchemaFile) -> Result<Arc<MessageDescriptor>> {
    let mut enums: HashMap<String, Arc<EnumDescriptor>> = HashMap::new();
    for def in &file.enums {
        let values = def
            .values
            .iter()
            .map(|v| (v.name.clone(), v.number))
            .collect::<Vec<_>>();
        enums.insert(
            def.name.clone(),
            Arc::new(EnumDescriptor::new(def.name.clone(), values)),
        );
    }

    // Messages may reference each other in any order; resolve whichever
    // definitions have all their field types available, until done.
    let mut pending: Vec<&MessageDef> = file.messages.iter().collect();
    let mut resolved: HashMap<String, Arc<MessageDescriptor>> = HashMap::new();
    while !pending.is_empty() {
        let mut still_pending = Vec::new();
        let mut progressed = false;
        for def in pending {
            if def
                .fields
                .iter()
                .all(|f| resolvable(&f.type_name, &enums, &resolved))
            {
                let descriptor = build_message(def, &enums, &resolved)?;
                resolved.insert(def.name.clone(), Arc::new(descriptor));
                progressed = true;
            } else {
                still_pending.push(def);
            }
        }
        if !progressed {
            let names: Vec<&str> = still_pending.iter().map(|d| d.name.as_str()).collect();
            return Err(ProtoCmpError::Schema(format!(
                "unresolved or mutually recursive message types: {}",
                names.join(", ")
            )));
        }
        pending = still_pending;
    }

    resolved.get(&file.root).cloned().ok_or_else(|| {
        ProtoCmpError::Schema(format!("root message `{}` is not declared", file.root))
    })
}

fn resolvable(
    type_name: &str,
    enums: &HashMap<String, Arc<EnumDescriptor>>,
    resolved: &HashMap<String, Arc<MessageDescriptor>>,
) -> bool {
    scalar_type(type_name).is_some()
        || enums.contains_key(type_name)
        || resolved.contains_key(type_name)
}

fn build_message(
    def: &MessageDef,
    enums: &HashMap<String, Arc<EnumDescriptor>>,
    resolved: &HashMap<String, Arc<MessageDescriptor>>,
) -> Result<MessageDescriptor> {
    let mut descriptor = MessageDescriptor::new(def.name.clone());
    for field in &def.fields {
        descriptor.add_field(build_field(&def.name, field, enums, resolved)?);
    }
    Ok(descriptor)
}

fn build_field(
    message: &str,
    def: &FieldDef,
    enums: &HashMap<String, Arc<EnumDescriptor>>,
    resolved: &HashMap<String, Arc<MessageDescriptor>>,
) -> Result<FieldDescriptor> {
    let field_type = resolve_type(&def.type_name, enums, resolved).ok_or_else(|| {
        ProtoCmpError::Schema(format!(
            "field `{}.{}` has unknown type `{}`",
            message, def.name, def.type_name
        ))
    })?;

    let kind = if let Some(raw_key) = &def.map_key {
        if def.repeated {
            return Err(ProtoCmpError::Schema(format!(
                "field `{}.{}` cannot be both repeated and a map",
                message, def.name
            )));
        }
        let key = map_key_type(raw_key).ok_or_else(|| {
            ProtoCmpError::Schema(format!(
                "field `{}.{}` has invalid map key type `{raw_key}`",
                message, def.name
            ))
        })?;
        FieldKind::Map {
            key,
            value: field_type,
        }
    } else if def.repeated {
        FieldKind::Repeated(field_type)
    } else {
        FieldKind::Singular(field_type)
    };

    if def.oneof.is_some() && !matches!(kind, FieldKind::Singular(_)) {
        return Err(ProtoCmpError::Schema(format!(
            "field `{}.{}` is in a oneof but not singular",
            message, def.name
        )));
    }

    let mut field = FieldDescriptor::new(def.name.clone(), kind);
    if let Some(group) = &def.oneof {
        field = field.in_oneof(group.clone());
    }
    Ok(field)
}

fn resolve_type(
    type_name: &str,
    enums: &HashMap<String, Arc<EnumDescriptor>>,
    resolved: &HashMap<String, Arc<MessageDescriptor>>,
) -> Option<FieldType> {
    if let Some(scalar) = scalar_type(type_name) {
        return Some(FieldType::Scalar(scalar));
    }
    if let Some(desc) = enums.get(type_name) {
        return Some(FieldType::Enum(Arc::clone(desc)));
    }
    resolved.get(type_name).map(|desc| FieldType::Message(Arc::clone(desc)))
}

fn scalar_type(name: &str) -> Option<ScalarType> {
    match name {
        "int32" => Some(ScalarType::Int32),
        "int64" => Some(ScalarType::Int64),
        "uint32" => Some(ScalarType::UInt32),
        "uint64" => Some(ScalarType::UInt64),
        "bool" => Some(ScalarType::Bool),
        "string" => Some(ScalarType::String),
        "bytes" => Some(ScalarType::Bytes),
        "float" => Some(ScalarType::Float),
        "double" => Some(ScalarType::Double),
        _ => None,
    }
}

fn map_key_type(name: &str) -> Option<MapKeyType> {
    match name {
        "int32" => Some(MapKeyType::Int32),
        "int64" => Some(MapKeyType::Int64),
        "uint32" => Some(MapKeyType::UInt32),
        "uint64" => Some(MapKeyType::UInt64),
        "bool" => Some(MapKeyType::Bool),
        "string" => Some(MapKeyType::String),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
root = "Outer"

[[enums]]
name = "Color"
values = [ { name = "RED", number = 0 }, { name = "BLUE", number = 1 } ]

[[messages]]
name = "Outer"
fields = [
  { name = "inner", type = "Inner" },
  { name = "tags", type = "string", repeated = true },
  { name = "colors", type = "Color", map_key = "string" },
]

[[messages]]
name = "Inner"
fields = [
  { name = "a", type = "int32", oneof = "choice" },
  { name = "b", type = "string", oneof = "choice" },
]
"#;

    #[test]
    fn resolves_out_of_order_definitions() {
        let root = parse_schema(SCHEMA).unwrap();
        assert_eq!(root.full_name(), "Outer");
        assert!(root.field("inner").is_some());
        assert!(matches!(
            root.field("colors").unwrap().kind(),
            FieldKind::Map { .. }
        ));

        let FieldKind::Singular(FieldType::Message(inner)) =
            root.field("inner").unwrap().kind()
        else {
            panic!("inner should be a message field");
        };
        assert_eq!(inner.oneof_groups(), vec!["choice"]);
    }

    #[test]
    fn unknown_type_is_a_schema_error() {
        let text = r#"
root = "M"

[[messages]]
name = "M"
fields = [ { name = "x", type = "Mystery" } ]
"#;
        assert!(matches!(
            parse_schema(text).unwrap_err(),
            ProtoCmpError::Schema(_)
        ));
    }

    #[test]
    fn missing_root_is_a_schema_error() {
        let text = r#"
root = "Nope"

[[messages]]
name = "M"
fields = []
"#;
        assert!(matches!(
            parse_schema(text).unwrap_err(),
            ProtoCmpError::Schema(_)
        ));
    }

    #[test]
    fn oneof_on_repeated_field_rejected() {
        let text = r#"
root = "M"

[[messages]]
name = "M"
fields = [ { name = "x", type = "int32", repeated = true, oneof = "g" } ]
"#;
        assert!(matches!(
            parse_schema(text).unwrap_err(),
            ProtoCmpError::Schema(_)
        ));
    }
}
