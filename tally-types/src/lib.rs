//! Row-level primitives shared by the tally operators.
//!
//! tally does not own storage or a catalog. It assumes the surrounding engine
//! hands it type-tagged [`Value`]s arranged in [`Row`]s that conform to a
//! [`RowSchema`], and that operators exchange rows through the pull-based
//! [`RowSequence`] protocol. This crate defines those boundary types, the
//! predicate operator enumeration ([`CompareOp`]) consumed by the optimizer
//! statistics, and conversions to and from Arrow record batches.
#![forbid(unsafe_code)]

pub mod batch;
pub mod compare;
pub mod row;
pub mod schema;
pub mod sequence;
pub mod value;

pub use batch::{rows_from_record_batch, rows_to_record_batch};
pub use compare::CompareOp;
pub use row::Row;
pub use schema::{Field, RowSchema};
pub use sequence::{RowBuffer, RowSequence, SequenceCursor};
pub use value::{Value, ValueType};
