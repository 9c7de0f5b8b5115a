// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use serde::{Deserialize, Serialize};

/// Row-existence expectation checked server-side before a mutation applies.
///
/// Bulk-import requests carry no conditional semantics; the transport
/// ignores the condition for those.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
	/// Apply the mutation unconditionally.
	#[default]
	Ignore,
	/// Fail the row if it does not already exist.
	ExpectExist,
	/// Fail the row if it already exists.
	ExpectNotExist,
}
