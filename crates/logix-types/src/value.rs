//! Slot values.
//!
//! A pin carries an `Option<Value>`: `None` is the absence marker, which only
//! object-typed slots keep after construction. Every other [`ValueType`] has
//! a canonical default that replaces absence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type tag of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Bytes,
    /// Free-form structured value. Has no canonical default.
    Object,
}

impl ValueType {
    /// Returns the canonical default for this type.
    ///
    /// # Example
    ///
    /// ```
    /// use logix_types::{Value, ValueType};
    ///
    /// assert_eq!(ValueType::Bool.default_value(), Some(Value::Bool(false)));
    /// assert_eq!(ValueType::String.default_value(), Some(Value::String(String::new())));
    /// assert_eq!(ValueType::Object.default_value(), None);
    /// ```
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Self::Bool => Some(Value::Bool(false)),
            Self::Int => Some(Value::Int(0)),
            Self::Float => Some(Value::Float(0.0)),
            Self::String => Some(Value::String(String::new())),
            Self::Bytes => Some(Value::Bytes(Vec::new())),
            Self::Object => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Runtime value held by a pin.
///
/// Equality is structural; it drives change detection on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Object(serde_json::Value),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Object(_) => ValueType::Object,
        }
    }

    /// Value equality for change detection.
    ///
    /// Unlike `==`, floats compare by bit pattern with every NaN equal to
    /// every other NaN, so a NaN that stays NaN is not a change.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            _ => self == other,
        }
    }
}

/// [`Value::same_as`] lifted to optional values; two absent values are the same.
#[must_use]
pub fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Object(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types usable as slot fields.
///
/// Implemented for `bool`, `i64`, `f64`, `String`, `Vec<u8>` and
/// `serde_json::Value`.
pub trait SlotType: Clone + Send + Sync + 'static {
    /// The tag declared for slots of this type.
    const VALUE_TYPE: ValueType;

    /// Wraps `self` into a [`Value`].
    fn into_value(self) -> Value;

    /// Unwraps a [`Value`], returning `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_slot_type {
    ($ty:ty, $variant:ident) => {
        impl SlotType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_slot_type!(bool, Bool);
impl_slot_type!(i64, Int);
impl_slot_type!(f64, Float);
impl_slot_type!(String, String);
impl_slot_type!(Vec<u8>, Bytes);
impl_slot_type!(serde_json::Value, Object);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_the_same_as_nan() {
        let nan = Value::Float(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert!(nan.same_as(&Value::Float(-f64::NAN)));
        assert!(!nan.same_as(&Value::Float(0.0)));
        assert!(Value::Float(1.5).same_as(&Value::Float(1.5)));
        assert!(!Value::Float(0.0).same_as(&Value::Float(-0.0)));
        assert!(Value::Int(3).same_as(&Value::Int(3)));
        assert!(!Value::Int(3).same_as(&Value::Float(3.0)));
        assert!(same_value(None, None));
        assert!(!same_value(Some(&nan), None));
    }

    #[test]
    fn defaults_match_type() {
        for ty in [
            ValueType::Bool,
            ValueType::Int,
            ValueType::Float,
            ValueType::String,
            ValueType::Bytes,
        ] {
            let default = ty.default_value().expect("primitive types have defaults");
            assert_eq!(default.value_type(), ty);
        }
        assert!(ValueType::Object.default_value().is_none());
    }

    #[test]
    fn slot_type_conversion() {
        assert_eq!(true.into_value(), Value::Bool(true));
        assert_eq!(i64::from_value(&Value::Int(7)), Some(7));
        assert_eq!(i64::from_value(&Value::Bool(true)), None);
        assert_eq!(
            String::from_value(&Value::from("on")),
            Some("on".to_string())
        );
        assert_eq!(<Vec<u8>>::VALUE_TYPE, ValueType::Bytes);
        assert_eq!(<serde_json::Value>::VALUE_TYPE, ValueType::Object);
    }

    #[test]
    fn serde_tagged() {
        let json = serde_json::to_value(Value::Int(3)).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "int", "value": 3}));
        let back: Value = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, Value::Int(3));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::from("x").to_string(), "\"x\"");
        assert_eq!(Value::Bytes(vec![1, 2]).to_string(), "<2 bytes>");
        assert_eq!(ValueType::Object.to_string(), "object");
    }
}
