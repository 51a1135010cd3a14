//! Pull iterator over finalized group results.

use arrow::record_batch::RecordBatch;
use tally_result::Result;
use tally_types::{Row, RowSchema, RowSequence, SequenceCursor, Value, rows_to_record_batch};

use crate::accumulator::AggregateValue;
use crate::aggregator::GroupedAggregator;

/// Result rows of a [`GroupedAggregator`], one per group.
///
/// The sequence holds a shared borrow of its aggregator, which freezes the
/// group table for as long as the sequence lives. Every pass (the first one
/// and each one after [`rewind`](RowSequence::rewind)) therefore yields the
/// same rows in the same order. Results are finalized lazily as rows are
/// pulled; an average over a group whose running values overflow surfaces
/// as an error from `next`.
pub struct ResultSequence<'a> {
    aggregator: &'a GroupedAggregator,
    cursor: SequenceCursor,
}

impl<'a> ResultSequence<'a> {
    pub(crate) fn new(aggregator: &'a GroupedAggregator) -> Self {
        Self {
            aggregator,
            cursor: SequenceCursor::new(),
        }
    }

    /// Drain the remaining rows into one Arrow record batch.
    pub fn to_record_batch(&mut self) -> Result<RecordBatch> {
        let rows = self.collect_rows()?;
        rows_to_record_batch(self.schema(), &rows)
    }
}

impl RowSequence for ResultSequence<'_> {
    fn open(&mut self) -> Result<()> {
        self.cursor.open()?;
        tracing::debug!(
            op = %self.aggregator.config().op,
            groups = self.aggregator.group_count(),
            "result sequence opened"
        );
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(self.cursor.position("has_next")? < self.aggregator.group_count())
    }

    fn next(&mut self) -> Result<Row> {
        let groups = self.aggregator.groups();
        let pos = self.cursor.advance(groups.len())?;
        let (key, accumulator) = &groups[pos];

        let mut values = Vec::with_capacity(self.schema().len());
        if let Some(group) = key {
            values.push(group.clone());
        }
        match accumulator.finalize()? {
            AggregateValue::Single(v) => values.push(Value::Int(v)),
            AggregateValue::SumAndCount { sum, count } => {
                values.push(Value::Int(sum));
                values.push(Value::Int(count));
            }
        }
        Ok(Row::new(values))
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.rewind()?;
        tracing::trace!("result sequence rewound");
        Ok(())
    }

    fn close(&mut self) {
        if self.cursor.is_open() {
            tracing::trace!("result sequence closed");
        }
        self.cursor.close();
    }

    fn schema(&self) -> &RowSchema {
        self.aggregator.output_schema()
    }
}
