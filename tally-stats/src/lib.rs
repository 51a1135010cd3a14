//! Optimizer statistics.
//!
//! [`SelectivityHistogram`] summarizes an integer column with a fixed number
//! of equal-width buckets and answers "what fraction of rows satisfy
//! `col <op> v`" without touching the data again.
#![forbid(unsafe_code)]

pub mod histogram;

pub use histogram::{DEFAULT_HISTOGRAM_BUCKETS, SelectivityHistogram};
