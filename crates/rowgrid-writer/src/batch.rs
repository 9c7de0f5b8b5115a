// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use rowgrid_type::RowChange;

use crate::{result::ResultSink, row::PendingRow};

/// An immutable snapshot of rows drained from one bucket, ready for one
/// network request. `rows` and `sinks` are parallel: the transport sees the
/// rows, the demultiplexer pairs its outcomes back with the sinks.
pub(crate) struct OutboundBatch {
	pub(crate) rows: Vec<RowChange>,
	pub(crate) sinks: Vec<ResultSink>,
	pub(crate) bytes: usize,
	/// True for the degenerate one-row batch carrying a row too large to
	/// batch; dispatched through the single-row call.
	pub(crate) single: bool,
}

impl OutboundBatch {
	pub(crate) fn single(row: PendingRow) -> Self {
		let bytes = row.size;
		Self::build(vec![row], bytes, true)
	}

	pub(crate) fn multi(rows: Vec<PendingRow>, bytes: usize) -> Self {
		Self::build(rows, bytes, false)
	}

	pub(crate) fn len(&self) -> usize {
		self.rows.len()
	}

	fn build(pending: Vec<PendingRow>, bytes: usize, single: bool) -> Self {
		let mut rows = Vec::with_capacity(pending.len());
		let mut sinks = Vec::with_capacity(pending.len());
		for row in pending {
			let PendingRow {
				change,
				sink,
				permit,
				..
			} = row;
			// the admission-buffer slot frees as the row leaves the
			// pending queue
			drop(permit);
			rows.push(change);
			sinks.push(sink);
		}
		Self {
			rows,
			sinks,
			bytes,
			single,
		}
	}
}
