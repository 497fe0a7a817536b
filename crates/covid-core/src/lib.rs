//! Core types for the India COVID-19 dashboard pipeline.
//!
//! This crate holds the normalisation tables, the typed series produced by the
//! feed builders and the error taxonomy. It is deliberately free of HTTP,
//! file-system and logging dependencies; every other crate depends on it.

pub mod district;
pub mod error;
pub mod label;
pub mod region;
pub mod series;
pub mod totals;

pub use error::{Error, ParseError, Result, SchemaError};
