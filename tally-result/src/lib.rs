//! Error types and result definitions shared by every tally crate.
//!
//! All fallible operations return [`Result<T>`], whose error variant is the
//! single [`Error`] enum defined here. Crates do not define their own error
//! types; they pick the variant that matches the failure and propagate it
//! with `?`.
//!
//! # Error Categories
//!
//! - **Configuration errors** ([`Error::InvalidConfiguration`]): an operator or
//!   bound combination that can never work, rejected at construction.
//! - **Type mismatches** ([`Error::TypeMismatch`]): a value whose type differs
//!   from the configured one.
//! - **Range errors** ([`Error::OutOfRange`]): a histogram observation outside
//!   its declared bounds.
//! - **Protocol errors** ([`Error::Protocol`], [`Error::SequenceExhausted`]):
//!   a result sequence driven outside of its valid state.
//! - **Malformed input** ([`Error::InvalidArgumentError`]): bad field indices,
//!   NULLs, arithmetic overflow.
//! - **Propagated failures** ([`Error::Io`], [`Error::Arrow`]): surfaced by a
//!   row source or a batch conversion and passed through unchanged.
//! - **Internal errors** ([`Error::Internal`]): bugs or poisoned state.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
