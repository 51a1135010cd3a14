//! Pull-based row sequences.
//!
//! Every operator that produces rows exposes them through [`RowSequence`]. A
//! sequence starts `Closed`; [`open`](RowSequence::open) moves it to `Open`,
//! where `has_next`, `next` and `rewind` are valid; [`close`](RowSequence::close)
//! returns it to `Closed`. Calling an iteration method while closed is a
//! protocol violation, and pulling past the last row is
//! [`Error::SequenceExhausted`].

use tally_result::{Error, Result};

use crate::row::Row;
use crate::schema::RowSchema;

/// The open/has-next/next/rewind/close protocol shared by all row producers.
pub trait RowSequence {
    /// Prepare the sequence for iteration. Only valid while closed.
    ///
    /// `close` returns a sequence to the same state it started in, so a closed
    /// sequence may be opened again and iterates from the first row. Sources
    /// that cannot restart should reject the second `open` themselves.
    fn open(&mut self) -> Result<()>;

    /// Whether another row is available.
    fn has_next(&mut self) -> Result<bool>;

    /// The next row. Fails with [`Error::SequenceExhausted`] past the end.
    fn next(&mut self) -> Result<Row>;

    /// Restart from the first row, producing the same rows in the same order.
    fn rewind(&mut self) -> Result<()>;

    /// Release iteration state. Always safe, never fails.
    fn close(&mut self);

    /// Shape of every row this sequence produces.
    fn schema(&self) -> &RowSchema;

    /// Drain the remaining rows of an open sequence.
    fn collect_rows(&mut self) -> Result<Vec<Row>> {
        let mut out = Vec::new();
        while self.has_next()? {
            out.push(self.next()?);
        }
        Ok(out)
    }
}

/// Cursor plus open/closed state, shared by the in-crate sequence
/// implementations so they enforce the protocol identically.
#[derive(Debug, Clone, Default)]
pub struct SequenceCursor {
    position: Option<usize>,
}

impl SequenceCursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::protocol("open() called on an already open sequence"));
        }
        self.position = Some(0);
        Ok(())
    }

    /// Current position, or a protocol error naming `method` when closed.
    #[inline]
    pub fn position(&self, method: &str) -> Result<usize> {
        self.position
            .ok_or_else(|| Error::protocol(format!("{method}() called on a closed sequence")))
    }

    /// Return the current position and step past it, failing once `len`
    /// positions have been handed out.
    pub fn advance(&mut self, len: usize) -> Result<usize> {
        let pos = self.position("next")?;
        if pos >= len {
            return Err(Error::SequenceExhausted);
        }
        self.position = Some(pos + 1);
        Ok(pos)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.position("rewind")?;
        self.position = Some(0);
        Ok(())
    }

    pub fn close(&mut self) {
        self.position = None;
    }
}

/// An in-memory [`RowSequence`] over owned rows.
///
/// Used as a leaf source in tests and wherever rows are already materialized.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    schema: RowSchema,
    rows: Vec<Row>,
    cursor: SequenceCursor,
}

impl RowBuffer {
    pub fn new(schema: RowSchema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows,
            cursor: SequenceCursor::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl RowSequence for RowBuffer {
    fn open(&mut self) -> Result<()> {
        self.cursor.open()?;
        tracing::trace!(rows = self.rows.len(), "row buffer opened");
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(self.cursor.position("has_next")? < self.rows.len())
    }

    fn next(&mut self) -> Result<Row> {
        let pos = self.cursor.advance(self.rows.len())?;
        Ok(self.rows[pos].clone())
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.rewind()
    }

    fn close(&mut self) {
        self.cursor.close();
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueType};

    fn buffer() -> RowBuffer {
        let schema = RowSchema::from_pairs([("a", ValueType::Int)]);
        let rows = (1..=3).map(|i| Row::new(vec![Value::Int(i)])).collect();
        RowBuffer::new(schema, rows)
    }

    #[test]
    fn closed_buffer_rejects_iteration() {
        let mut buf = buffer();
        assert!(matches!(buf.has_next(), Err(Error::Protocol(_))));
        assert!(matches!(buf.next(), Err(Error::Protocol(_))));
        assert!(matches!(buf.rewind(), Err(Error::Protocol(_))));
        buf.close();
    }

    #[test]
    fn drains_then_reports_exhaustion() {
        let mut buf = buffer();
        buf.open().unwrap();
        let rows = buf.collect_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!buf.has_next().unwrap());
        assert!(matches!(buf.next(), Err(Error::SequenceExhausted)));

        buf.rewind().unwrap();
        assert_eq!(buf.collect_rows().unwrap(), rows);
    }

    #[test]
    fn double_open_is_a_protocol_error() {
        let mut buf = buffer();
        buf.open().unwrap();
        assert!(matches!(buf.open(), Err(Error::Protocol(_))));
        buf.close();
        buf.open().unwrap();
    }

    #[test]
    fn reopening_after_close_starts_from_the_first_row() {
        let mut buf = buffer();
        buf.open().unwrap();
        buf.next().unwrap();
        buf.next().unwrap();
        buf.close();

        buf.open().unwrap();
        assert_eq!(buf.next().unwrap(), Row::new(vec![Value::Int(1)]));
        assert_eq!(buf.collect_rows().unwrap().len(), 2);
    }
}
