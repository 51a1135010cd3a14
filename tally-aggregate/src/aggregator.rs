//! Grouped aggregation over a stream of rows.

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use tally_result::{Error, Result};
use tally_types::{Field, Row, RowSchema, RowSequence, Value, ValueType, rows_from_record_batch};

use crate::accumulator::{AggregateAccumulator, AggregateOp, Observation};
use crate::sequence::ResultSequence;

/// Key a row is grouped under. `None` is the "no grouping" sentinel: every
/// row of an ungrouped aggregator lands in that single group.
pub type GroupKey = Option<Value>;

/// Position and type of the group-by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBy {
    pub index: usize,
    pub value_type: ValueType,
}

/// Validated construction parameters for a [`GroupedAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateConfig {
    pub group_by: Option<GroupBy>,
    pub aggregate_field: usize,
    pub aggregate_type: ValueType,
    pub op: AggregateOp,
}

impl AggregateConfig {
    /// Reject operator/type combinations that can never produce a result.
    pub fn validate(&self) -> Result<()> {
        if !self.op.supports(self.aggregate_type) {
            return Err(Error::invalid_configuration(format!(
                "{} is not supported over {} fields; only count is",
                self.op, self.aggregate_type
            )));
        }
        if let Some(count_index) = self.partial_count_index() {
            if count_index == self.aggregate_field {
                return Err(Error::invalid_configuration(format!(
                    "partial_avg reads its partial count from field {count_index}, \
                     which is also the aggregate field"
                )));
            }
            if self.group_by.is_some_and(|g| g.index == count_index) {
                return Err(Error::invalid_configuration(format!(
                    "partial_avg reads its partial count from field {count_index}, \
                     which is also the group field"
                )));
            }
        }
        Ok(())
    }

    /// Where PARTIAL_AVG rows carry their partial count: field 1 when
    /// ungrouped, field 2 when grouped. `None` for every other operator.
    pub fn partial_count_index(&self) -> Option<usize> {
        match self.op {
            AggregateOp::PartialAvg if self.group_by.is_some() => Some(2),
            AggregateOp::PartialAvg => Some(1),
            _ => None,
        }
    }

    /// Shape of the result rows.
    pub fn output_schema(&self) -> RowSchema {
        let mut fields = Vec::with_capacity(1 + self.op.output_width());
        if let Some(group_by) = self.group_by {
            fields.push(Field::new("groupVal", group_by.value_type));
        }
        match self.op {
            AggregateOp::SumAndCount => {
                fields.push(Field::new("sumVal", ValueType::Int));
                fields.push(Field::new("countVal", ValueType::Int));
            }
            _ => fields.push(Field::new("aggregateVal", ValueType::Int)),
        }
        RowSchema::new(fields)
    }
}

/// Computes one aggregate per group over the rows merged into it.
///
/// The aggregator has two phases. During the build phase rows are pushed in
/// with [`merge_tuple_into_group`](Self::merge_tuple_into_group) (which needs
/// `&mut self`). Reading happens through [`result_sequence`](Self::result_sequence),
/// which borrows the aggregator shared, so no merge can interleave with an
/// open sequence. Producers on several threads go through
/// [`SharedAggregator`](crate::SharedAggregator).
///
/// Groups are reported in the order they were first seen.
#[derive(Debug, Clone)]
pub struct GroupedAggregator {
    config: AggregateConfig,
    output_schema: RowSchema,
    slots: FxHashMap<GroupKey, usize>,
    groups: Vec<(GroupKey, AggregateAccumulator)>,
}

impl GroupedAggregator {
    pub fn new(config: AggregateConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            op = %config.op,
            group_by = ?config.group_by,
            aggregate_field = config.aggregate_field,
            aggregate_type = %config.aggregate_type,
            "grouped aggregator created"
        );
        Ok(Self {
            output_schema: config.output_schema(),
            config,
            slots: FxHashMap::default(),
            groups: Vec::new(),
        })
    }

    /// Aggregator over an integer field. `group_type` is ignored when
    /// `group_field` is `None`.
    pub fn over_int(
        group_field: Option<usize>,
        group_type: ValueType,
        aggregate_field: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        Self::with_field_type(group_field, group_type, aggregate_field, ValueType::Int, op)
    }

    /// Aggregator over a text field. Only [`AggregateOp::Count`] is accepted.
    pub fn over_text(
        group_field: Option<usize>,
        group_type: ValueType,
        aggregate_field: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        Self::with_field_type(group_field, group_type, aggregate_field, ValueType::Text, op)
    }

    /// Aggregator whose field types are taken from the input schema.
    pub fn from_schema(
        schema: &RowSchema,
        group_field: Option<usize>,
        aggregate_field: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        let type_at = |index: usize| {
            schema.field(index).map(|f| f.value_type).ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "field {index} does not exist in input schema {schema}"
                ))
            })
        };
        let group_by = group_field
            .map(|index| {
                Ok::<_, Error>(GroupBy {
                    index,
                    value_type: type_at(index)?,
                })
            })
            .transpose()?;
        Self::new(AggregateConfig {
            group_by,
            aggregate_field,
            aggregate_type: type_at(aggregate_field)?,
            op,
        })
    }

    fn with_field_type(
        group_field: Option<usize>,
        group_type: ValueType,
        aggregate_field: usize,
        aggregate_type: ValueType,
        op: AggregateOp,
    ) -> Result<Self> {
        Self::new(AggregateConfig {
            group_by: group_field.map(|index| GroupBy {
                index,
                value_type: group_type,
            }),
            aggregate_field,
            aggregate_type,
            op,
        })
    }

    #[inline]
    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    #[inline]
    pub fn output_schema(&self) -> &RowSchema {
        &self.output_schema
    }

    /// Number of distinct groups seen so far.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub(crate) fn groups(&self) -> &[(GroupKey, AggregateAccumulator)] {
        &self.groups
    }

    /// Fold `row` into the accumulator of its group.
    ///
    /// Fails with [`Error::TypeMismatch`] when the group or aggregate field has
    /// the wrong type, and with [`Error::InvalidArgumentError`] when the row is
    /// too short or the running value overflows. A failed call leaves the
    /// aggregator unchanged.
    pub fn merge_tuple_into_group(&mut self, row: &Row) -> Result<()> {
        let key = self.group_key(row)?;
        let observation = self.observation(row)?;

        match self.slots.get(&key) {
            Some(&slot) => self.groups[slot].1.update(observation)?,
            None => {
                let accumulator = AggregateAccumulator::seed(self.config.op, observation)?;
                tracing::trace!(group = ?key, op = %self.config.op, "new aggregation group");
                self.slots.insert(key.clone(), self.groups.len());
                self.groups.push((key, accumulator));
            }
        }
        Ok(())
    }

    /// Open `child`, merge every row it produces, and close it again.
    ///
    /// Errors raised by the child are returned unchanged; the child is closed
    /// either way.
    pub fn merge_from(&mut self, child: &mut dyn RowSequence) -> Result<()> {
        child.open()?;
        let result = self.drain(child);
        child.close();
        result
    }

    fn drain(&mut self, child: &mut dyn RowSequence) -> Result<()> {
        let mut merged = 0usize;
        while child.has_next()? {
            let row = child.next()?;
            self.merge_tuple_into_group(&row)?;
            merged += 1;
        }
        tracing::debug!(rows = merged, groups = self.groups.len(), "merged child sequence");
        Ok(())
    }

    /// Merge every row of an Arrow record batch.
    ///
    /// Rows are merged in order and the first failing row stops the merge.
    /// Rows before it stay merged; only the failing row itself leaves its
    /// group untouched.
    pub fn merge_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        for row in rows_from_record_batch(batch)? {
            self.merge_tuple_into_group(&row)?;
        }
        Ok(())
    }

    /// A fresh, unopened sequence over the groups accumulated so far.
    pub fn result_sequence(&self) -> ResultSequence<'_> {
        ResultSequence::new(self)
    }

    fn group_key(&self, row: &Row) -> Result<GroupKey> {
        let Some(group_by) = self.config.group_by else {
            return Ok(None);
        };
        let value = row.get(group_by.index)?;
        if value.value_type() != group_by.value_type {
            return Err(Error::type_mismatch(
                "group key",
                group_by.value_type,
                value.value_type(),
            ));
        }
        Ok(Some(value.clone()))
    }

    fn observation(&self, row: &Row) -> Result<Observation> {
        match self.config.op {
            AggregateOp::Count => {
                let value = row.get(self.config.aggregate_field)?;
                if value.value_type() != self.config.aggregate_type {
                    return Err(Error::type_mismatch(
                        "aggregate field",
                        self.config.aggregate_type,
                        value.value_type(),
                    ));
                }
                Ok(Observation::Row)
            }
            AggregateOp::PartialAvg => {
                let count_index = self.config.partial_count_index().ok_or_else(|| {
                    Error::Internal("partial_avg aggregator without a count field".into())
                })?;
                Ok(Observation::Partial {
                    sum: int_field(row, self.config.aggregate_field, "aggregate field")?,
                    count: int_field(row, count_index, "partial count field")?,
                })
            }
            AggregateOp::Min
            | AggregateOp::Max
            | AggregateOp::Sum
            | AggregateOp::Avg
            | AggregateOp::SumAndCount => Ok(Observation::Int(int_field(
                row,
                self.config.aggregate_field,
                "aggregate field",
            )?)),
        }
    }
}

fn int_field(row: &Row, index: usize, context: &'static str) -> Result<i64> {
    let value = row.get(index)?;
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch(context, ValueType::Int, value.value_type()))
}
