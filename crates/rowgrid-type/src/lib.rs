// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

//! Row, primary key, and value types consumed by the RowGrid writer.
//!
//! The writer only needs two things from the data model: byte-size
//! accounting (batch limits are expressed in serialized bytes) and a stable
//! hash identity for primary keys (bucket routing). Wire encoding lives in
//! the transport layer, not here.

mod condition;
mod primary_key;
mod row;
mod value;

pub use condition::Condition;
pub use primary_key::{PrimaryKey, PrimaryKeyColumn, PrimaryKeyValue};
pub use row::{Column, RowChange, RowOperation};
pub use value::Value;
