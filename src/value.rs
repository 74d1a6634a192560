use std::fmt::{Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::Ast;

/// The JSON-shaped value the engine operates over, plus the `Expref`
/// variant: a first-class deferred expression produced by `&expr` and
/// consumed only by higher-order built-ins (`map`, `sort_by`, ...).
///
/// `Expref` wraps an `Arc<Ast>` rather than the teacher's `Rc` because a
/// `CompiledExpression` (and any `Value` it evaluates to) must be safely
/// shareable and evaluable across threads with no interior mutation.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Expref(Arc<Ast>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Expref(_) => "expref",
        }
    }

    /// JMESPath truthiness: `false`, `null`, `""`, `[]`, `{}` are falsey;
    /// everything else, including `0`, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(_) => true,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Expref(_) => true,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn array_element_type(&self) -> Option<&'static str> {
        self.as_array()
            .and_then(|a| a.first())
            .map(|v| v.type_name())
    }

    /// Renders this value as JSON text the way the `to_string` built-in
    /// (and the reference implementation) does: same whole-number rule as
    /// `Display` for a bare `Number`, applied recursively so a number
    /// nested inside an array or object doesn't pick up `serde_json`'s
    /// trailing `.0` the way routing through `serde_json::Value` would.
    pub fn to_json_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(_) => self.to_string(),
            Value::String(s) => serde_json::Value::String(s.clone()).to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_json_string).collect();
                format!("[{}]", parts.join(","))
            }
            Value::Object(obj) => {
                let parts: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{}:{}", serde_json::Value::String(k.clone()), v.to_json_string()))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }
            Value::Expref(_) => "null".to_string(),
        }
    }
}

/// Deep structural equality with the JMESPath rule that numeric `0`/`1`
/// are **not** equal to boolean `false`/`true` — satisfied here simply by
/// never matching across variants.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Expref(a), Value::Expref(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Object(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(a) => serde_json::Value::Array(a.into_iter().map(Into::into).collect()),
            Value::Object(o) => {
                serde_json::Value::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Expref(_) => serde_json::Value::Null,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            other => {
                let json: serde_json::Value = other.clone().into();
                write!(f, "{}", json)
            }
        }
    }
}

/// Serializes through [`serde_json::Value`] so this type plugs into any
/// serde-based pipeline (e.g. `serde_json::to_string(&value)`). An
/// `Expref`, which has no JSON representation, serializes as `null`.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let json: serde_json::Value = self.clone().into();
        json.serialize(serializer)
    }
}

/// Deserializes any JSON input into a `Value` by first building a
/// [`serde_json::Value`] and converting it with [`From<serde_json::Value>`].
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsey_values_match_jmespath_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Object(IndexMap::new()).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
    }

    #[test]
    fn zero_is_not_equal_to_false() {
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::Bool(true));
    }

    #[test]
    fn whole_numbers_display_without_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
    }

    #[test]
    fn object_equality_is_order_independent() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), Value::Number(1.0));
        a.insert("y".to_string(), Value::Number(2.0));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), Value::Number(2.0));
        b.insert("x".to_string(), Value::Number(1.0));
        assert_eq!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn to_json_string_drops_trailing_zero_at_every_nesting_level() {
        assert_eq!(Value::Number(3.0).to_json_string(), "3");
        assert_eq!(
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
                .to_json_string(),
            "[1,2,3]"
        );
        let mut obj = IndexMap::new();
        obj.insert("a".to_string(), Value::Number(1.0));
        assert_eq!(Value::Object(obj).to_json_string(), r#"{"a":1}"#);
    }

    #[test]
    fn serializes_and_deserializes_through_json() {
        let mut obj = IndexMap::new();
        obj.insert("a".to_string(), Value::Number(1.0));
        obj.insert("b".to_string(), Value::Array(vec![Value::Bool(true), Value::Null]));
        let value = Value::Object(obj);

        let json = serde_json::to_string(&value).unwrap();
        let round_tripped: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, round_tripped);
    }
}
