//! Aggregate operators and their per-group accumulators.

use std::fmt;
use std::str::FromStr;

use tally_result::{Error, Result};
use tally_types::ValueType;

/// Aggregation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Count,
    /// Average of raw observations, truncated toward zero.
    Avg,
    /// Average over pre-aggregated `(partial sum, partial count)` rows.
    PartialAvg,
    /// Sum and count of raw observations as two output columns.
    SumAndCount,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 7] = [
        AggregateOp::Min,
        AggregateOp::Max,
        AggregateOp::Sum,
        AggregateOp::Count,
        AggregateOp::Avg,
        AggregateOp::PartialAvg,
        AggregateOp::SumAndCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Count => "count",
            AggregateOp::Avg => "avg",
            AggregateOp::PartialAvg => "partial_avg",
            AggregateOp::SumAndCount => "sum_count",
        }
    }

    /// Number of aggregate columns in each result row (the group column is
    /// not included).
    pub fn output_width(&self) -> usize {
        match self {
            AggregateOp::SumAndCount => 2,
            _ => 1,
        }
    }

    /// Whether the operator can consume fields of `value_type`. Text fields
    /// only support COUNT.
    pub fn supports(&self, value_type: ValueType) -> bool {
        match value_type {
            ValueType::Int => true,
            ValueType::Text => matches!(self, AggregateOp::Count),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            "sum" => Ok(AggregateOp::Sum),
            "count" => Ok(AggregateOp::Count),
            "avg" => Ok(AggregateOp::Avg),
            "partial_avg" | "sc_avg" => Ok(AggregateOp::PartialAvg),
            "sum_count" => Ok(AggregateOp::SumAndCount),
            other => Err(Error::InvalidArgumentError(format!(
                "unknown aggregate operator '{other}'"
            ))),
        }
    }
}

/// What a single input row contributes to its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The row exists; its aggregate value is irrelevant (COUNT).
    Row,
    /// A raw integer observation.
    Int(i64),
    /// A pre-aggregated partial result.
    Partial { sum: i64, count: i64 },
}

/// Per-group state. Each variant belongs to exactly one [`AggregateOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateAccumulator {
    Min(i64),
    Max(i64),
    Sum(i64),
    Count(i64),
    /// Raw observations, averaged once at read time.
    Avg(Vec<i64>),
    PartialAvg { sum: i64, count: i64 },
    /// Raw observations, summed and counted at read time.
    SumAndCount(Vec<i64>),
}

/// A finalized group result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateValue {
    Single(i64),
    SumAndCount { sum: i64, count: i64 },
}

impl AggregateAccumulator {
    /// Start a group's state from its first observation.
    pub fn seed(op: AggregateOp, observation: Observation) -> Result<Self> {
        match (op, observation) {
            (AggregateOp::Min, Observation::Int(v)) => Ok(AggregateAccumulator::Min(v)),
            (AggregateOp::Max, Observation::Int(v)) => Ok(AggregateAccumulator::Max(v)),
            (AggregateOp::Sum, Observation::Int(v)) => Ok(AggregateAccumulator::Sum(v)),
            (AggregateOp::Count, Observation::Row) => Ok(AggregateAccumulator::Count(1)),
            (AggregateOp::Avg, Observation::Int(v)) => Ok(AggregateAccumulator::Avg(vec![v])),
            (AggregateOp::PartialAvg, Observation::Partial { sum, count }) => {
                Ok(AggregateAccumulator::PartialAvg { sum, count })
            }
            (AggregateOp::SumAndCount, Observation::Int(v)) => {
                Ok(AggregateAccumulator::SumAndCount(vec![v]))
            }
            (op, observation) => Err(Error::Internal(format!(
                "{op} aggregate cannot be seeded from {observation:?}"
            ))),
        }
    }

    /// Fold one more observation into the group. On error the state is left
    /// as it was.
    pub fn update(&mut self, observation: Observation) -> Result<()> {
        match (self, observation) {
            (AggregateAccumulator::Min(current), Observation::Int(v)) => {
                *current = (*current).min(v);
            }
            (AggregateAccumulator::Max(current), Observation::Int(v)) => {
                *current = (*current).max(v);
            }
            (AggregateAccumulator::Sum(current), Observation::Int(v)) => {
                *current = current
                    .checked_add(v)
                    .ok_or_else(|| Error::overflow("SUM aggregate result"))?;
            }
            (AggregateAccumulator::Count(current), Observation::Row) => {
                *current = current
                    .checked_add(1)
                    .ok_or_else(|| Error::overflow("COUNT result"))?;
            }
            (AggregateAccumulator::Avg(values), Observation::Int(v))
            | (AggregateAccumulator::SumAndCount(values), Observation::Int(v)) => {
                values.push(v);
            }
            (
                AggregateAccumulator::PartialAvg { sum, count },
                Observation::Partial {
                    sum: partial_sum,
                    count: partial_count,
                },
            ) => {
                let next_sum = sum
                    .checked_add(partial_sum)
                    .ok_or_else(|| Error::overflow("PARTIAL_AVG running sum"))?;
                let next_count = count
                    .checked_add(partial_count)
                    .ok_or_else(|| Error::overflow("PARTIAL_AVG running count"))?;
                *sum = next_sum;
                *count = next_count;
            }
            (acc, observation) => {
                return Err(Error::Internal(format!(
                    "accumulator {acc:?} cannot absorb {observation:?}"
                )));
            }
        }
        Ok(())
    }

    /// Compute the group's result. Averages use integer division truncating
    /// toward zero.
    pub fn finalize(&self) -> Result<AggregateValue> {
        match self {
            AggregateAccumulator::Min(v)
            | AggregateAccumulator::Max(v)
            | AggregateAccumulator::Sum(v)
            | AggregateAccumulator::Count(v) => Ok(AggregateValue::Single(*v)),
            AggregateAccumulator::Avg(values) => {
                let (sum, count) = sum_and_count(values)?;
                let avg = sum
                    .checked_div(count)
                    .ok_or_else(|| Error::overflow("AVG aggregate result"))?;
                Ok(AggregateValue::Single(avg))
            }
            AggregateAccumulator::PartialAvg { sum, count } => {
                if *count == 0 {
                    return Err(Error::InvalidArgumentError(
                        "PARTIAL_AVG group has a total partial count of zero".into(),
                    ));
                }
                let avg = sum
                    .checked_div(*count)
                    .ok_or_else(|| Error::overflow("PARTIAL_AVG aggregate result"))?;
                Ok(AggregateValue::Single(avg))
            }
            AggregateAccumulator::SumAndCount(values) => {
                let (sum, count) = sum_and_count(values)?;
                Ok(AggregateValue::SumAndCount { sum, count })
            }
        }
    }
}

fn sum_and_count(values: &[i64]) -> Result<(i64, i64)> {
    let sum = values.iter().try_fold(0i64, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| Error::overflow("AVG aggregate sum"))
    })?;
    let count = i64::try_from(values.len()).map_err(|_| Error::overflow("AVG aggregate count"))?;
    Ok((sum, count))
}
