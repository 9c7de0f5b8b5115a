// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	collections::{HashSet, VecDeque},
	time::Duration,
};

use tokio::time::Instant;

use crate::{batch::OutboundBatch, config::WriterConfig, row::PendingRow};

/// The pending queue of one bucket and the rules for cutting batches out
/// of it.
///
/// Rows leave strictly in arrival order; a batch never exceeds the byte or
/// row-count ceiling, never mixes an oversized row with anything else, and
/// (unless duplicates are allowed) never carries two mutations of the same
/// key.
pub(crate) struct Accumulator {
	pending: VecDeque<PendingRow>,
	pending_bytes: usize,
	max_batch_bytes: usize,
	max_batch_rows: usize,
	flush_interval: Duration,
	allow_duplicate_rows: bool,
}

impl Accumulator {
	pub(crate) fn new(config: &WriterConfig) -> Self {
		Self {
			pending: VecDeque::new(),
			pending_bytes: 0,
			max_batch_bytes: config.max_batch_size,
			max_batch_rows: config.effective_max_batch_rows(),
			flush_interval: config.flush_interval,
			allow_duplicate_rows: config.allow_duplicate_rows,
		}
	}

	pub(crate) fn enqueue(&mut self, row: PendingRow) {
		self.pending_bytes += row.size;
		self.pending.push_back(row);
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	pub(crate) fn max_batch_bytes(&self) -> usize {
		self.max_batch_bytes
	}

	/// When the bucket must be force-flushed: `flush_interval` after the
	/// oldest pending row arrived. `None` while empty.
	pub(crate) fn deadline(&self) -> Option<Instant> {
		self.pending.front().map(|row| row.enqueued_at + self.flush_interval)
	}

	/// Whether enough is pending to fill a batch without waiting for the
	/// flush timer.
	pub(crate) fn threshold_reached(&self) -> bool {
		self.pending.len() >= self.max_batch_rows || self.pending_bytes >= self.max_batch_bytes
	}

	/// Cut the next batch off the front of the queue, or `None` if the
	/// queue is empty. Never reorders or skips rows.
	pub(crate) fn next_batch(&mut self) -> Option<OutboundBatch> {
		let oversized = {
			let front = self.pending.front()?;
			front.size > self.max_batch_bytes
		};
		if oversized {
			// cannot share a request with anything; goes out alone
			// through the single-row call
			let row = self.pending.pop_front()?;
			self.pending_bytes -= row.size;
			return Some(OutboundBatch::single(row));
		}

		let mut rows = Vec::new();
		let mut bytes = 0usize;
		let mut keys = HashSet::new();
		while let Some(front) = self.pending.front() {
			if rows.len() >= self.max_batch_rows {
				break;
			}
			if front.size > self.max_batch_bytes {
				// an oversized row starts its own degenerate batch
				break;
			}
			if !rows.is_empty() && bytes + front.size > self.max_batch_bytes {
				break;
			}
			if !self.allow_duplicate_rows && keys.contains(&front.key_hash) {
				// the batch request rejects two mutations of one key;
				// the duplicate starts the next batch
				break;
			}
			let Some(row) = self.pending.pop_front() else {
				break;
			};
			self.pending_bytes -= row.size;
			bytes += row.size;
			keys.insert(row.key_hash);
			rows.push(row);
		}
		Some(OutboundBatch::multi(rows, bytes))
	}
}
