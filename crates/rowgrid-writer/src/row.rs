// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use rowgrid_type::RowChange;
use tokio::{sync::OwnedSemaphorePermit, time::Instant};

use crate::result::ResultSink;

/// A row admitted into a bucket's pending queue.
pub(crate) struct PendingRow {
	pub(crate) change: RowChange,
	/// Full key hash; `hash % bucket_count` routed the row here, the full
	/// value also identifies the key for duplicate detection in a batch.
	pub(crate) key_hash: u64,
	/// Accounting size used against the batch byte limit.
	pub(crate) size: usize,
	pub(crate) enqueued_at: Instant,
	pub(crate) sink: ResultSink,
	/// Admission-buffer slot, freed when the row leaves the pending queue.
	pub(crate) permit: Option<OwnedSemaphorePermit>,
}
