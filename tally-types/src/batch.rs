//! Conversions between tally rows and Arrow record batches.
//!
//! `INT` maps to `Int64` and `TEXT` to `Utf8`. tally values are never NULL, so
//! Arrow columns are declared non-nullable and NULL slots in incoming batches
//! are rejected.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, Int64Builder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field as ArrowField, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use tally_result::{Error, Result};

use crate::row::Row;
use crate::schema::{Field, RowSchema};
use crate::value::{Value, ValueType};

impl ValueType {
    pub fn to_arrow(&self) -> DataType {
        match self {
            ValueType::Int => DataType::Int64,
            ValueType::Text => DataType::Utf8,
        }
    }

    pub fn from_arrow(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Int64 => Ok(ValueType::Int),
            DataType::Utf8 => Ok(ValueType::Text),
            other => Err(Error::InvalidArgumentError(format!(
                "unsupported Arrow column type {other:?}"
            ))),
        }
    }
}

impl RowSchema {
    pub fn to_arrow_schema(&self) -> SchemaRef {
        let fields: Vec<ArrowField> = self
            .fields()
            .iter()
            .map(|f| ArrowField::new(&f.name, f.value_type.to_arrow(), false))
            .collect();
        Arc::new(Schema::new(fields))
    }

    pub fn from_arrow_schema(schema: &Schema) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|f| Ok(Field::new(f.name().as_str(), ValueType::from_arrow(f.data_type())?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(RowSchema::new(fields))
    }
}

/// Pack `rows` into a single record batch shaped by `schema`.
pub fn rows_to_record_batch(schema: &RowSchema, rows: &[Row]) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.len());
    for (idx, field) in schema.fields().iter().enumerate() {
        let column: ArrayRef = match field.value_type {
            ValueType::Int => {
                let mut builder = Int64Builder::with_capacity(rows.len());
                for row in rows {
                    match row.get(idx)? {
                        Value::Int(v) => builder.append_value(*v),
                        other => {
                            return Err(Error::type_mismatch(
                                "record batch column",
                                ValueType::Int,
                                other.value_type(),
                            ));
                        }
                    }
                }
                Arc::new(builder.finish())
            }
            ValueType::Text => {
                let mut builder = StringBuilder::new();
                for row in rows {
                    match row.get(idx)? {
                        Value::Text(s) => builder.append_value(s),
                        other => {
                            return Err(Error::type_mismatch(
                                "record batch column",
                                ValueType::Text,
                                other.value_type(),
                            ));
                        }
                    }
                }
                Arc::new(builder.finish())
            }
        };
        columns.push(column);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        schema.to_arrow_schema(),
        columns,
        &options,
    )?)
}

/// Unpack every row of `batch`.
pub fn rows_from_record_batch(batch: &RecordBatch) -> Result<Vec<Row>> {
    let num_rows = batch.num_rows();
    let mut values: Vec<Vec<Value>> = (0..num_rows)
        .map(|_| Vec::with_capacity(batch.num_columns()))
        .collect();

    for (col_idx, array) in batch.columns().iter().enumerate() {
        if array.null_count() > 0 {
            return Err(Error::InvalidArgumentError(format!(
                "column {col_idx} contains NULLs, which tally values cannot represent"
            )));
        }
        match ValueType::from_arrow(array.data_type())? {
            ValueType::Int => {
                let array = array.as_any().downcast_ref::<Int64Array>().ok_or_else(|| {
                    Error::Internal(format!("column {col_idx} is not an Int64Array"))
                })?;
                for (row, v) in values.iter_mut().zip(array.values().iter()) {
                    row.push(Value::Int(*v));
                }
            }
            ValueType::Text => {
                let array = array.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
                    Error::Internal(format!("column {col_idx} is not a StringArray"))
                })?;
                for (i, row) in values.iter_mut().enumerate() {
                    row.push(Value::Text(array.value(i).to_string()));
                }
            }
        }
    }

    Ok(values.into_iter().map(Row::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_survive_a_batch() {
        let schema = RowSchema::from_pairs([("dept", ValueType::Text), ("n", ValueType::Int)]);
        let rows = vec![
            Row::new(vec![Value::from("eng"), Value::Int(3)]),
            Row::new(vec![Value::from("ops"), Value::Int(-1)]),
        ];
        let batch = rows_to_record_batch(&schema, &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Int64);

        assert_eq!(RowSchema::from_arrow_schema(&batch.schema()).unwrap(), schema);
        assert_eq!(rows_from_record_batch(&batch).unwrap(), rows);
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let schema = RowSchema::from_pairs([("n", ValueType::Int)]);
        let rows = vec![Row::new(vec![Value::from("oops")])];
        let err = rows_to_record_batch(&schema, &rows).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn nulls_are_rejected() {
        let schema = Arc::new(Schema::new(vec![ArrowField::new(
            "n",
            DataType::Int64,
            true,
        )]));
        let array = Int64Array::from(vec![Some(1), None]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(array)]).unwrap();
        let err = rows_from_record_batch(&batch).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(msg) if msg.contains("NULL")));
    }

    #[test]
    fn unsupported_arrow_types_are_rejected() {
        assert!(ValueType::from_arrow(&DataType::Float64).is_err());
    }
}
