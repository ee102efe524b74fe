//! JSON ↔ Firestore 类型化值
//!
//! Firestore REST 用 `{"stringValue": "..."}` 这样的包装表示每个值，
//! 整数以字符串形式传输。

use serde_json::{json, Map, Number, Value};

/// JSON 值 → Firestore 值
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                // 超出 i64 的整数只能作为 double 存储
                json!({ "doubleValue": u as f64 })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(obj) => json!({ "mapValue": { "fields": encode_fields(obj) } }),
    }
}

/// JSON 对象 → Firestore `fields`
pub fn encode_fields(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Firestore 值 → JSON 值
///
/// 时间戳、引用、字节串解码为字符串，地理坐标解码为 `{latitude, longitude}`，
/// 无法识别的包装解码为 `null`。
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => decode_integer(inner),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

/// Firestore `fields` → JSON 对象
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        Value::Number(n) => Value::Number(n.clone()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_mark_scheme() {
        let encoded = encode_value(&json!({
            "1a": [{"part_id": "", "total_marks": 2, "marking_points": [{"marks": 1.5, "ok": true, "note": null}]}]
        }));

        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "1a": {"arrayValue": {"values": [
                    {"mapValue": {"fields": {
                        "part_id": {"stringValue": ""},
                        "total_marks": {"integerValue": "2"},
                        "marking_points": {"arrayValue": {"values": [
                            {"mapValue": {"fields": {
                                "marks": {"doubleValue": 1.5},
                                "ok": {"booleanValue": true},
                                "note": {"nullValue": null}
                            }}}
                        ]}}
                    }}}
                ]}}
            }}})
        );
    }

    #[test]
    fn test_decode_restores_json() {
        let document = json!({
            "6ii": [{"part_id": "ii", "total_marks": 3, "marking_points": [], "weight": 0.25}],
            "empty": {}
        });
        let fields = encode_fields(document.as_object().unwrap());
        assert_eq!(Value::Object(decode_fields(&fields)), document);
    }

    #[test]
    fn test_decode_special_kinds() {
        assert_eq!(
            decode_value(&json!({"timestampValue": "2024-05-01T10:00:00Z"})),
            json!("2024-05-01T10:00:00Z")
        );
        assert_eq!(
            decode_value(&json!({"geoPointValue": {"latitude": 51.5, "longitude": -0.1}})),
            json!({"latitude": 51.5, "longitude": -0.1})
        );
        assert_eq!(decode_value(&json!({"arrayValue": {}})), json!([]));
        assert_eq!(decode_value(&json!({"integerValue": "abc"})), Value::Null);
        assert_eq!(decode_value(&json!("bare")), Value::Null);
    }
}
