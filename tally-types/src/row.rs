//! Rows of type-tagged values.

use tally_result::{Error, Result};

use crate::value::Value;

/// An ordered sequence of [`Value`]s.
///
/// A row does not carry its schema; the producing sequence exposes it through
/// [`RowSequence::schema`](crate::RowSequence::schema).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Field at `index`, or [`Error::InvalidArgumentError`] if the row is
    /// shorter than that.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or_else(|| {
            Error::InvalidArgumentError(format!(
                "field index {index} out of range for row of width {}",
                self.values.len()
            ))
        })
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
