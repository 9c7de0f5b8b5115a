// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WriterError;

/// Protocol-level ceiling on rows per multi-row request. Requests above
/// this are rejected server-side regardless of client configuration.
pub const MAX_ROWS_PER_REQUEST: usize = 200;

/// Fixed ceiling on a single attribute value. Configuration can lower the
/// effective limit but never raise it past this.
pub const MAX_ATTRIBUTE_VALUE_SIZE: usize = 2 * 1024 * 1024;

/// Whether a bucket may have more than one batch in flight at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
	/// A bucket's next batch is not dispatched until its previous batch has
	/// fully resolved. Same-key mutations can never be reordered by the
	/// server, even under retries.
	#[default]
	Sequential,
	/// Batches from one bucket may overlap in flight. Higher throughput;
	/// callers must not mutate the same key concurrently.
	Parallel,
}

/// Which multi-row RPC carries the writer's batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
	/// Transactional multi-table batch semantics with per-row conditions.
	#[default]
	BatchWrite,
	/// Relaxed bulk-load semantics without per-row condition checks.
	BulkImport,
}

/// Immutable writer configuration, snapshotted at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriterConfig {
	/// Maximum simultaneous in-flight requests across all buckets.
	pub concurrency: usize,
	/// Maximum rows held in the pending queues before admission blocks.
	pub buffer_size: usize,
	/// Maximum residency of the oldest pending row in a bucket before the
	/// bucket is force-flushed.
	pub flush_interval: Duration,
	/// Number of ordering partitions. `1` serializes all rows.
	pub bucket_count: usize,
	pub write_mode: WriteMode,
	pub request_type: RequestType,
	/// Byte ceiling per outbound batch.
	pub max_batch_size: usize,
	/// Row-count ceiling per outbound batch, clamped by
	/// [`MAX_ROWS_PER_REQUEST`].
	pub max_batch_rows: usize,
	/// Per-attribute value ceiling, clamped by
	/// [`MAX_ATTRIBUTE_VALUE_SIZE`].
	pub max_attr_value_size: usize,
	/// When false, a batch never carries two mutations of the same primary
	/// key; the second mutation starts the next batch.
	pub allow_duplicate_rows: bool,
	/// Interval of the periodic statistics report, `None` to disable.
	pub log_interval: Option<Duration>,
}

impl Default for WriterConfig {
	fn default() -> Self {
		Self {
			concurrency: 10,
			buffer_size: 1024,
			flush_interval: Duration::from_secs(10),
			bucket_count: 4,
			write_mode: WriteMode::default(),
			request_type: RequestType::default(),
			max_batch_size: 4 * 1024 * 1024,
			max_batch_rows: MAX_ROWS_PER_REQUEST,
			max_attr_value_size: MAX_ATTRIBUTE_VALUE_SIZE,
			allow_duplicate_rows: false,
			log_interval: Some(Duration::from_secs(10)),
		}
	}
}

impl WriterConfig {
	/// The row-count ceiling actually applied to batches.
	pub fn effective_max_batch_rows(&self) -> usize {
		self.max_batch_rows.min(MAX_ROWS_PER_REQUEST)
	}

	/// The attribute-value ceiling actually applied at admission.
	pub fn effective_max_attr_value_size(&self) -> usize {
		self.max_attr_value_size.min(MAX_ATTRIBUTE_VALUE_SIZE)
	}

	pub(crate) fn validate(&self) -> Result<(), WriterError> {
		fn invalid(reason: &str) -> WriterError {
			WriterError::InvalidConfig {
				reason: reason.to_string(),
			}
		}

		if self.concurrency == 0 {
			return Err(invalid("concurrency must be at least 1"));
		}
		if self.buffer_size == 0 {
			return Err(invalid("buffer_size must be at least 1"));
		}
		if self.bucket_count == 0 {
			return Err(invalid("bucket_count must be at least 1"));
		}
		if self.max_batch_size == 0 {
			return Err(invalid("max_batch_size must be at least 1 byte"));
		}
		if self.max_batch_rows == 0 {
			return Err(invalid("max_batch_rows must be at least 1"));
		}
		if self.max_attr_value_size == 0 {
			return Err(invalid("max_attr_value_size must be at least 1 byte"));
		}
		if self.flush_interval.is_zero() {
			return Err(invalid("flush_interval must be non-zero"));
		}
		Ok(())
	}
}
