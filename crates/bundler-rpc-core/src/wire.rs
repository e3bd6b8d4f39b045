//! Wire serialization policy.
//!
//! Every payload leaves the process through [`encode`]. One rule is applied on
//! the way out: integer values wider than the 53-bit safe range of IEEE-754
//! doubles are rendered as `0x`-prefixed hexadecimal strings, so JavaScript
//! clients never silently lose precision. All other values are written as-is.

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// Largest integer a double represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Serialize `payload` to wire text.
pub fn encode(payload: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Wire(payload))
}

/// Render a number as hex if it exceeds the safe integer range.
fn wide_integer_hex(n: &Number) -> Option<String> {
    if let Some(u) = n.as_u64() {
        return (u > MAX_SAFE_INTEGER).then(|| format!("{u:#x}"));
    }
    if let Some(i) = n.as_i64() {
        let abs = i.unsigned_abs();
        return (abs > MAX_SAFE_INTEGER).then(|| format!("-{abs:#x}"));
    }
    None
}

struct Wire<'a>(&'a Value);

impl Serialize for Wire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Number(n) => match wide_integer_hex(n) {
                Some(hex) => serializer.serialize_str(&hex),
                None => n.serialize(serializer),
            },
            Value::Array(items) => serializer.collect_seq(items.iter().map(Wire)),
            Value::Object(map) => serializer.collect_map(map.iter().map(|(k, v)| (k, Wire(v)))),
            other => other.serialize(serializer),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn safe_integers_stay_numeric() {
        let out = encode(&json!({"a": 1, "b": MAX_SAFE_INTEGER, "c": -5, "d": 1.5})).unwrap();
        assert_eq!(out, r#"{"a":1,"b":9007199254740991,"c":-5,"d":1.5}"#);
    }

    #[test]
    fn wide_integers_become_hex_at_any_depth() {
        let out = encode(&json!({
            "result": [{"gas": MAX_SAFE_INTEGER + 1}, u64::MAX],
            "neg": i64::MIN,
        }))
        .unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["result"][0]["gas"], "0x20000000000000");
        assert_eq!(v["result"][1], "0xffffffffffffffff");
        assert_eq!(v["neg"], "-0x8000000000000000");
    }

    #[test]
    fn strings_are_untouched() {
        let out = encode(&json!("0x1234")).unwrap();
        assert_eq!(out, r#""0x1234""#);
    }
}
