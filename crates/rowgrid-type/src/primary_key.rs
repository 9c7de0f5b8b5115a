// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use serde::{Deserialize, Serialize};

/// A primary key column value.
///
/// Only integer, text, and binary columns can participate in a primary key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryKeyValue {
	/// An 8-byte signed integer
	Int8(i64),
	/// A UTF-8 encoded text
	Utf8(String),
	/// A binary value
	Blob(Vec<u8>),
}

impl PrimaryKeyValue {
	pub fn byte_size(&self) -> usize {
		match self {
			PrimaryKeyValue::Int8(_) => 8,
			PrimaryKeyValue::Utf8(s) => s.len(),
			PrimaryKeyValue::Blob(b) => b.len(),
		}
	}
}

impl From<i64> for PrimaryKeyValue {
	fn from(v: i64) -> Self {
		PrimaryKeyValue::Int8(v)
	}
}

impl From<&str> for PrimaryKeyValue {
	fn from(v: &str) -> Self {
		PrimaryKeyValue::Utf8(v.to_string())
	}
}

impl From<String> for PrimaryKeyValue {
	fn from(v: String) -> Self {
		PrimaryKeyValue::Utf8(v)
	}
}

impl From<Vec<u8>> for PrimaryKeyValue {
	fn from(v: Vec<u8>) -> Self {
		PrimaryKeyValue::Blob(v)
	}
}

/// A single named primary key column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKeyColumn {
	pub name: String,
	pub value: PrimaryKeyValue,
}

/// The ordered primary key of a row.
///
/// Column order is part of the key's identity: two keys with the same
/// columns in different order are different keys. The derived `Hash` is the
/// identity the writer's bucket router consumes, which makes routing a pure
/// function of the key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryKey {
	columns: Vec<PrimaryKeyColumn>,
}

impl PrimaryKey {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a primary key column.
	pub fn column(mut self, name: impl Into<String>, value: impl Into<PrimaryKeyValue>) -> Self {
		self.columns.push(PrimaryKeyColumn {
			name: name.into(),
			value: value.into(),
		});
		self
	}

	pub fn columns(&self) -> &[PrimaryKeyColumn] {
		&self.columns
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	/// The number of bytes this key contributes to a serialized row.
	pub fn byte_size(&self) -> usize {
		self.columns.iter().map(|c| c.name.len() + c.value.byte_size()).sum()
	}
}
