use protocmp_common::{ProtoCmpError, Result};
use protocmp_core::{
    DynamicMessage, FieldKind, FieldType, MapKey, MapKeyType, MessageDescriptor, ScalarType, Value,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Decode a JSON object into a message instance. Object keys name set
/// fields; absent keys stay unset. Enum values are accepted by name or
/// number; map keys arrive as JSON strings and are parsed per the
/// declared key type.
pub fn decode_message(
    descriptor: &Arc<MessageDescriptor>,
    json: &JsonValue,
) -> Result<DynamicMessage> {
    let JsonValue::Object(object) = json else {
        return Err(ProtoCmpError::Decode(format!(
            "expected a JSON object for message `{}`",
            descriptor.full_name()
        )));
    };

    let mut message = DynamicMessage::new(Arc::clone(descriptor));
    for (key, value) in object {
        let field = descriptor.field(key).ok_or_else(|| {
            ProtoCmpError::Decode(format!(
                "message `{}` has no field `{key}`",
                descriptor.full_name()
            ))
        })?;
        let decoded = decode_field(key, field.kind(), value)?;
        message.set(key, decoded)?;
    }
    Ok(message)
}

fn decode_field(name: &str, kind: &FieldKind, json: &JsonValue) -> Result<Value> {
    match kind {
        FieldKind::Singular(ty) => decode_single(name, ty, json),
        FieldKind::Repeated(element) => {
            let JsonValue::Array(items) = json else {
                return Err(decode_error(name, "expected a JSON array"));
            };
            let values = items
                .iter()
                .map(|item| decode_single(name, element, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(values))
        }
        FieldKind::Map { key, value } => {
            let JsonValue::Object(entries) = json else {
                return Err(decode_error(name, "expected a JSON object"));
            };
            let mut map = BTreeMap::new();
            for (raw_key, entry_value) in entries {
                let map_key = parse_map_key(name, *key, raw_key)?;
                map.insert(map_key, decode_single(name, value, entry_value)?);
            }
            Ok(Value::Map(map))
        }
    }
}

fn decode_single(name: &str, ty: &FieldType, json: &JsonValue) -> Result<Value> {
    match ty {
        FieldType::Scalar(scalar) => decode_scalar(name, *scalar, json),
        FieldType::Enum(descriptor) => match json {
            JsonValue::String(value_name) => descriptor
                .number_by_name(value_name)
                .map(Value::Enum)
                .ok_or_else(|| {
                    decode_error(
                        name,
                        &format!("enum `{}` has no value `{value_name}`", descriptor.name()),
                    )
                }),
            JsonValue::Number(_) => {
                let number = json
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| decode_error(name, "enum number out of range"))?;
                Ok(Value::Enum(number))
            }
            _ => Err(decode_error(name, "expected an enum name or number")),
        },
        FieldType::Message(descriptor) => {
            decode_message(descriptor, json).map(Value::Message)
        }
    }
}

fn decode_scalar(name: &str, scalar: ScalarType, json: &JsonValue) -> Result<Value> {
    match scalar {
        ScalarType::Int32 => json
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int32)
            .ok_or_else(|| decode_error(name, "expected an int32")),
        ScalarType::Int64 => json
            .as_i64()
            .map(Value::Int64)
            .ok_or_else(|| decode_error(name, "expected an int64")),
        ScalarType::UInt32 => json
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Value::UInt32)
            .ok_or_else(|| decode_error(name, "expected a uint32")),
        ScalarType::UInt64 => json
            .as_u64()
            .map(Value::UInt64)
            .ok_or_else(|| decode_error(name, "expected a uint64")),
        ScalarType::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| decode_error(name, "expected a bool")),
        ScalarType::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| decode_error(name, "expected a string")),
        ScalarType::Bytes => json
            .as_str()
            .map(|s| Value::Bytes(s.as_bytes().to_vec()))
            .ok_or_else(|| decode_error(name, "expected a string of bytes")),
        ScalarType::Float => json
            .as_f64()
            .map(|f| Value::Float(f as f32))
            .ok_or_else(|| decode_error(name, "expected a float")),
        ScalarType::Double => json
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| decode_error(name, "expected a double")),
    }
}

fn parse_map_key(name: &str, key_type: MapKeyType, raw: &str) -> Result<MapKey> {
    let parsed = match key_type {
        MapKeyType::Int32 => raw.parse().ok().map(MapKey::Int32),
        MapKeyType::Int64 => raw.parse().ok().map(MapKey::Int64),
        MapKeyType::UInt32 => raw.parse().ok().map(MapKey::UInt32),
        MapKeyType::UInt64 => raw.parse().ok().map(MapKey::UInt64),
        MapKeyType::Bool => raw.parse().ok().map(MapKey::Bool),
        MapKeyType::String => Some(MapKey::String(raw.to_string())),
    };
    parsed.ok_or_else(|| {
        decode_error(name, &format!("map key `{raw}` is not a valid {key_type}"))
    })
}

fn decode_error(field: &str, reason: &str) -> ProtoCmpError {
    ProtoCmpError::Decode(format!("field `{field}`: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocmp_core::FieldDescriptor;
    use serde_json::json;

    fn descriptor() -> Arc<MessageDescriptor> {
        let mut inner = MessageDescriptor::new("Inner");
        inner.add_field(FieldDescriptor::scalar("label", ScalarType::String));
        let inner = Arc::new(inner);

        let mut outer = MessageDescriptor::new("Outer");
        outer.add_field(FieldDescriptor::scalar("count", ScalarType::Int32));
        outer.add_field(FieldDescriptor::message("inner", Arc::clone(&inner)));
        outer.add_field(FieldDescriptor::repeated(
            "tags",
            FieldType::Scalar(ScalarType::String),
        ));
        outer.add_field(FieldDescriptor::map(
            "scores",
            MapKeyType::Int32,
            FieldType::Scalar(ScalarType::Double),
        ));
        Arc::new(outer)
    }

    #[test]
    fn decodes_nested_structures() {
        let json = json!({
            "count": 3,
            "inner": { "label": "x" },
            "tags": ["a", "b"],
            "scores": { "5": 0.5, "10": 1.5 }
        });
        let message = decode_message(&descriptor(), &json).unwrap();

        assert_eq!(message.get("count"), Some(&Value::Int32(3)));
        assert!(message.has("inner"));
        let Some(Value::Map(scores)) = message.get("scores") else {
            panic!("scores should be a map");
        };
        assert_eq!(scores.get(&MapKey::Int32(5)), Some(&Value::Double(0.5)));
    }

    #[test]
    fn absent_keys_stay_unset() {
        let message = decode_message(&descriptor(), &json!({ "count": 1 })).unwrap();
        assert!(message.has("count"));
        assert!(!message.has("inner"));
        assert!(!message.has("tags"));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = decode_message(&descriptor(), &json!({ "mystery": 1 })).unwrap_err();
        assert!(matches!(err, ProtoCmpError::Decode(_)));
    }

    #[test]
    fn type_mismatches_rejected() {
        assert!(decode_message(&descriptor(), &json!({ "count": "three" })).is_err());
        assert!(decode_message(&descriptor(), &json!({ "tags": "not a list" })).is_err());
        assert!(
            decode_message(&descriptor(), &json!({ "scores": { "not a number": 1.0 } }))
                .is_err()
        );
    }
}
