//! Error types for `covid-core`.
//!
//! Two families: a [`SchemaError`] means the feed no longer has the shape the
//! normalisation tables expect, a [`ParseError`] means a single value could not
//! be read. Both are fatal to a refresh.

use chrono::NaiveDate;
use thiserror::Error;

use crate::label::{Column, Period, Status};

#[derive(Debug, Error)]
pub enum Error {
  #[error("schema error: {0}")]
  Schema(#[from] SchemaError),

  #[error("parse error: {0}")]
  Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("unknown state code: {0:?}")]
  UnknownStateCode(String),

  #[error("unknown state name: {0:?}")]
  UnknownStateName(String),

  #[error("unknown column label: {0:?}")]
  UnknownColumn(String),

  #[error("unknown status: {0:?}")]
  UnknownStatus(String),

  #[error("{at}: missing field {field:?}")]
  MissingField { at: String, field: String },

  #[error("{at}: unexpected field {field:?}")]
  UnexpectedField { at: String, field: String },

  #[error("{at}: expected {expected}")]
  UnexpectedShape { at: String, expected: &'static str },

  #[error("{period} columns are incomplete: {missing} is absent")]
  IncompletePeriod { period: Period, missing: Column },

  #[error("{at}: row has {found} region columns, expected {expected}")]
  RowWidth {
    at:       String,
    found:    usize,
    expected: usize,
  },

  #[error("duplicate date {0}")]
  DuplicateDate(NaiveDate),

  #[error("duplicate row for {date} / {status}")]
  DuplicateKey { date: NaiveDate, status: Status },

  #[error("{date} has no {status} row")]
  MissingStatus { date: NaiveDate, status: Status },

  #[error("gap in series between {before} and {after}")]
  DateGap { before: NaiveDate, after: NaiveDate },

  #[error("{at}: {field} overflows a 64-bit count")]
  Overflow { at: String, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("{at}: invalid date in {field}: {value:?}")]
  InvalidDate {
    at:    String,
    field: String,
    value: String,
  },

  #[error("{at}: {field} is not an integer: {value:?}")]
  InvalidCount {
    at:    String,
    field: String,
    value: String,
  },

  #[error("{at}: {field} is empty")]
  EmptyCell { at: String, field: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
