//! Helpers shared by the tally test suites.

use std::io;
use std::sync::Once;

use tally_result::{Error, Result};
use tally_types::{Row, RowSchema, RowSequence, SequenceCursor, Value};

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
///
/// Honors `RUST_LOG` when it parses, otherwise logs at `info`.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Run at binary init time so individual tests don't need to call init.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

/// A row of integers.
pub fn int_row(values: &[i64]) -> Row {
    values.iter().copied().map(Value::Int).collect()
}

/// A `(text, int)` row, the usual shape for grouped aggregation tests.
pub fn keyed_row(key: &str, value: i64) -> Row {
    Row::new(vec![Value::from(key), Value::Int(value)])
}

/// A [`RowSequence`] that yields `rows` and then fails with an I/O error,
/// standing in for a storage-backed source that breaks mid-scan.
pub struct FailingSequence {
    schema: RowSchema,
    rows: Vec<Row>,
    cursor: SequenceCursor,
    closed_count: usize,
}

impl FailingSequence {
    pub fn new(schema: RowSchema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows,
            cursor: SequenceCursor::new(),
            closed_count: 0,
        }
    }

    /// How many times `close` has been called.
    pub fn closed_count(&self) -> usize {
        self.closed_count
    }
}

impl RowSequence for FailingSequence {
    fn open(&mut self) -> Result<()> {
        self.cursor.open()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.cursor.position("has_next")?;
        Ok(true)
    }

    fn next(&mut self) -> Result<Row> {
        let pos = self.cursor.position("next")?;
        if pos < self.rows.len() {
            self.cursor.advance(self.rows.len())?;
            return Ok(self.rows[pos].clone());
        }
        Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "page read failed",
        )))
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.rewind()
    }

    fn close(&mut self) {
        self.closed_count += 1;
        self.cursor.close();
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }
}
