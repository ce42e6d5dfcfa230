use std::fmt;

use serde_json::{Number, Value};

use crate::format::Format;

#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Format for Json {
    type Item = Value;
    type Error = serde_json::Error;

    fn deserialize(v: &[u8]) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(v)
    }
}

/// Dot separated path into a json document, `a.b.c` style.
///
/// Each segment selects an object field. On arrays a decimal segment selects
/// the element at that index. The empty path selects the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn parse(path: &str) -> Path {
        let segments = if path.is_empty() {
            vec![]
        } else {
            path.split('.').map(str::to_string).collect()
        };
        Path { segments }
    }

    pub fn eval<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(doc, |cur, seg| match cur {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Evaluates the path and renders the leaf as a lookup key.
    pub fn key(&self, doc: &Value) -> Option<String> {
        self.eval(doc).and_then(key_string)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Largest magnitude below which every whole f64 is exact.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Canonical string form of a scalar, `None` for null and containers.
///
/// Numbers compare by value, so `42`, `42.0` and `4.2e1` all render as `42`.
pub fn key_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_key(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_key(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_lookup() {
        let doc = json!({"a": {"b": {"c": "42"}}});
        assert_eq!(Path::parse("a.b.c").key(&doc), Some("42".to_string()));
        assert_eq!(Path::parse("a.b.d").key(&doc), None);
        assert_eq!(Path::parse("a.b").key(&doc), None);
    }

    #[test]
    fn scalars_are_stringified() {
        let doc = json!({"int": 42, "neg": -3, "float": 1.5, "yes": true, "nil": null});
        assert_eq!(Path::parse("int").key(&doc).as_deref(), Some("42"));
        assert_eq!(Path::parse("neg").key(&doc).as_deref(), Some("-3"));
        assert_eq!(Path::parse("float").key(&doc).as_deref(), Some("1.5"));
        assert_eq!(Path::parse("yes").key(&doc).as_deref(), Some("true"));
        assert_eq!(Path::parse("nil").key(&doc), None);
    }

    #[test]
    fn whole_floats_match_integers() {
        let doc = json!({"a": 42.0, "b": 1e2, "c": -7.0, "d": 0.5, "e": 1e300});
        assert_eq!(Path::parse("a").key(&doc), Path::parse("x").key(&json!({"x": 42})));
        assert_eq!(Path::parse("a").key(&doc).as_deref(), Some("42"));
        assert_eq!(Path::parse("b").key(&doc).as_deref(), Some("100"));
        assert_eq!(Path::parse("c").key(&doc).as_deref(), Some("-7"));
        assert_eq!(Path::parse("d").key(&doc).as_deref(), Some("0.5"));
        assert_eq!(Path::parse("e").key(&doc), Some(serde_json::Number::from_f64(1e300).unwrap().to_string()));
    }

    #[test]
    fn parsed_float_text_is_canonical() {
        let doc = Json::deserialize(br#"{"k": 1e2, "n": 100, "big": 18446744073709551615}"#).unwrap();
        assert_eq!(Path::parse("k").key(&doc), Path::parse("n").key(&doc));
        assert_eq!(Path::parse("big").key(&doc).as_deref(), Some("18446744073709551615"));
    }

    #[test]
    fn array_index() {
        let doc = json!({"users": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(Path::parse("users.1.id").key(&doc).as_deref(), Some("b"));
        assert_eq!(Path::parse("users.2.id").key(&doc), None);
        assert_eq!(Path::parse("users.x.id").key(&doc), None);
    }

    #[test]
    fn empty_path_is_document() {
        let doc = json!("7");
        assert_eq!(Path::parse("").key(&doc).as_deref(), Some("7"));
        assert_eq!(Path::parse("a.b").to_string(), "a.b");
    }

    #[test]
    fn malformed_is_error() {
        assert!(Json::deserialize(b"{\"a\":").is_err());
        assert!(Json::deserialize(b"{\"a\":1}").is_ok());
    }
}
