//! Type-tagged scalar values.

use std::fmt;

/// The physical type tag carried by every [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// Signed 64-bit integer.
    Int,
    /// UTF-8 text.
    Text,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "INT",
            ValueType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar that carries its type tag.
///
/// Two values are equal only when both the tag and the content match. Text
/// comparison is byte-exact: case and trailing whitespace are significant, so
/// `"a"`, `"A"` and `"a "` are three distinct group keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    #[inline]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Text(_) => ValueType::Text,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(Int, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_value!(Text, String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
