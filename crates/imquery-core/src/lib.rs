//! Core types and utilities for imquery
//!
//! This crate provides the data structures shared by the header parsers, the page
//! decoder and the multi-page writer: page geometry, pixel buffers with
//! region-of-interest views, container metadata, result codes and error types.

pub mod buffer;
pub mod consts;
pub mod error;
pub mod metadata;
pub mod types;

pub use buffer::*;
pub use error::{ImqError, ImqResult};
pub use metadata::*;
pub use types::*;
