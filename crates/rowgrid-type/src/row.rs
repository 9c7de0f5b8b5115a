// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use serde::{Deserialize, Serialize};

use crate::{Condition, PrimaryKey, Value};

/// A named attribute column carried by a put or update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
	pub name: String,
	pub value: Value,
}

impl Column {
	pub fn byte_size(&self) -> usize {
		self.name.len() + self.value.byte_size()
	}
}

/// The mutation a [`RowChange`] applies to its row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RowOperation {
	/// Replace the row with exactly these columns.
	Put { columns: Vec<Column> },
	/// Write some columns and remove others, leaving the rest untouched.
	Update { puts: Vec<Column>, deletes: Vec<String> },
	/// Remove the row.
	Delete,
}

/// A single row mutation: table, primary key, optional condition, and the
/// column edits to apply.
///
/// Built with the `put`/`update`/`delete` constructors and the chained
/// `column`/`delete_column`/`condition` methods:
///
/// ```
/// use rowgrid_type::{Condition, PrimaryKey, RowChange};
///
/// let change = RowChange::update("users", PrimaryKey::new().column("id", 7i64))
/// 	.column("name", "alice")
/// 	.delete_column("nickname")
/// 	.condition(Condition::ExpectExist);
/// assert_eq!(change.table(), "users");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
	table: String,
	primary_key: PrimaryKey,
	condition: Condition,
	operation: RowOperation,
}

impl RowChange {
	pub fn put(table: impl Into<String>, primary_key: PrimaryKey) -> Self {
		Self {
			table: table.into(),
			primary_key,
			condition: Condition::default(),
			operation: RowOperation::Put {
				columns: Vec::new(),
			},
		}
	}

	pub fn update(table: impl Into<String>, primary_key: PrimaryKey) -> Self {
		Self {
			table: table.into(),
			primary_key,
			condition: Condition::default(),
			operation: RowOperation::Update {
				puts: Vec::new(),
				deletes: Vec::new(),
			},
		}
	}

	pub fn delete(table: impl Into<String>, primary_key: PrimaryKey) -> Self {
		Self {
			table: table.into(),
			primary_key,
			condition: Condition::default(),
			operation: RowOperation::Delete,
		}
	}

	/// Add an attribute column. Ignored for delete mutations, which carry
	/// no columns.
	pub fn column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		let column = Column {
			name: name.into(),
			value: value.into(),
		};
		match &mut self.operation {
			RowOperation::Put {
				columns,
			} => columns.push(column),
			RowOperation::Update {
				puts, ..
			} => puts.push(column),
			RowOperation::Delete => {}
		}
		self
	}

	/// Mark an attribute column for removal. Only meaningful for updates.
	pub fn delete_column(mut self, name: impl Into<String>) -> Self {
		if let RowOperation::Update {
			deletes, ..
		} = &mut self.operation
		{
			deletes.push(name.into());
		}
		self
	}

	pub fn condition(mut self, condition: Condition) -> Self {
		self.condition = condition;
		self
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn primary_key(&self) -> &PrimaryKey {
		&self.primary_key
	}

	pub fn row_condition(&self) -> Condition {
		self.condition
	}

	pub fn operation(&self) -> &RowOperation {
		&self.operation
	}

	/// The number of bytes this mutation contributes to a batch request.
	///
	/// This is an accounting size, not the exact wire size: batch limits
	/// only need a stable, monotone approximation.
	pub fn byte_size(&self) -> usize {
		let op = match &self.operation {
			RowOperation::Put {
				columns,
			} => columns.iter().map(Column::byte_size).sum(),
			RowOperation::Update {
				puts,
				deletes,
			} => {
				puts.iter().map(Column::byte_size).sum::<usize>()
					+ deletes.iter().map(|name| name.len()).sum::<usize>()
			}
			RowOperation::Delete => 0,
		};
		self.table.len() + self.primary_key.byte_size() + op
	}

	/// Name and size of the largest attribute value written by this
	/// mutation, if it writes any.
	pub fn largest_attribute(&self) -> Option<(&str, usize)> {
		let columns = match &self.operation {
			RowOperation::Put {
				columns,
			} => columns.as_slice(),
			RowOperation::Update {
				puts, ..
			} => puts.as_slice(),
			RowOperation::Delete => return None,
		};
		columns.iter().map(|c| (c.name.as_str(), c.value.byte_size())).max_by_key(|(_, size)| *size)
	}
}
