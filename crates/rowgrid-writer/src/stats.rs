// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	fmt::{Display, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

/// Lifetime counters of a writer. Monotonically increasing; mutated from
/// the admission path and the result demultiplexer, read from anywhere.
#[derive(Debug, Default)]
pub(crate) struct WriterStatistics {
	total_rows: AtomicU64,
	succeeded_rows: AtomicU64,
	failed_rows: AtomicU64,
	requests: AtomicU64,
	single_row_requests: AtomicU64,
}

impl WriterStatistics {
	pub(crate) fn inc_total_rows(&self) {
		self.total_rows.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn inc_succeeded_rows(&self) {
		self.succeeded_rows.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn inc_failed_rows(&self) {
		self.failed_rows.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn inc_requests(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn inc_single_row_requests(&self) {
		self.single_row_requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> StatisticsSnapshot {
		StatisticsSnapshot {
			total_rows_count: self.total_rows.load(Ordering::Relaxed),
			total_succeeded_rows_count: self.succeeded_rows.load(Ordering::Relaxed),
			total_failed_rows_count: self.failed_rows.load(Ordering::Relaxed),
			total_request_count: self.requests.load(Ordering::Relaxed),
			total_single_row_request_count: self.single_row_requests.load(Ordering::Relaxed),
		}
	}
}

/// A point-in-time copy of the writer's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
	/// Rows accepted by `add_row_change`/`add_row_change_with_future`.
	pub total_rows_count: u64,
	/// Rows that reached a successful terminal outcome.
	pub total_succeeded_rows_count: u64,
	/// Rows that reached a failed terminal outcome.
	pub total_failed_rows_count: u64,
	/// Requests handed to the transport.
	pub total_request_count: u64,
	/// The subset of requests sent through the single-row call because the
	/// row alone exceeded the batch size limit.
	pub total_single_row_request_count: u64,
}

impl Display for StatisticsSnapshot {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"rows={} succeeded={} failed={} requests={} single_row_requests={}",
			self.total_rows_count,
			self.total_succeeded_rows_count,
			self.total_failed_rows_count,
			self.total_request_count,
			self.total_single_row_request_count
		)
	}
}
