//! Ordered row schemas.

use std::fmt;

use crate::value::ValueType;

/// A single named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub value_type: ValueType,
}

impl Field {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Ordered `(type, name)` pairs describing the shape of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RowSchema {
    fields: Vec<Field>,
}

impl RowSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, ValueType)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value_type)| Field::new(name, value_type))
                .collect(),
        )
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the first field named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl fmt::Display for RowSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", field.name, field.value_type)?;
        }
        f.write_str(")")
    }
}
