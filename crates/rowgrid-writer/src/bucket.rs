// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	hash::{Hash, Hasher},
	sync::Arc,
};

use rowgrid_type::PrimaryKey;
use tokio::{
	sync::{mpsc, oneshot},
	time::{Instant, sleep_until},
};
use xxhash_rust::xxh3::Xxh3;

use crate::{
	accumulator::Accumulator,
	batch::OutboundBatch,
	config::WriteMode,
	dispatch::send_and_resolve,
	row::PendingRow,
	writer::Shared,
};

/// Stable 64-bit identity of a primary key.
///
/// Seed-free xxh3 over the key's `Hash` feed, so repeated mutations of one
/// key hash identically for the writer's whole lifetime. This is the only
/// mechanism keeping conflicting writes to one key in order.
pub(crate) fn key_hash(key: &PrimaryKey) -> u64 {
	let mut hasher = Xxh3::new();
	key.hash(&mut hasher);
	hasher.finish()
}

pub(crate) fn bucket_index(hash: u64, bucket_count: usize) -> usize {
	(hash % bucket_count as u64) as usize
}

pub(crate) enum BucketCommand {
	Row(PendingRow),
	/// Drain everything pending, then acknowledge.
	Flush(oneshot::Sender<()>),
}

/// Owner of one bucket's queue. A single task per bucket serializes the
/// admission path, the flush timer, and explicit flushes onto one drain
/// path, so the two flush triggers can never double-drain.
pub(crate) struct BucketWorker {
	index: usize,
	shared: Arc<Shared>,
	accumulator: Accumulator,
}

impl BucketWorker {
	pub(crate) fn new(index: usize, shared: Arc<Shared>) -> Self {
		let accumulator = Accumulator::new(&shared.config);
		Self {
			index,
			shared,
			accumulator,
		}
	}

	pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BucketCommand>) {
		tracing::debug!("bucket {} worker started", self.index);
		loop {
			let deadline = self.accumulator.deadline();
			tokio::select! {
				biased;

				command = rx.recv() => match command {
					Some(BucketCommand::Row(row)) => self.on_row(row).await,
					Some(BucketCommand::Flush(ack)) => {
						if !self.accumulator.is_empty() {
							self.drain_all().await;
						}
						let _ = ack.send(());
					}
					// all senders gone: the writer is closing or was
					// dropped; everything still queued was delivered
					// above, so drain and stop
					None => {
						self.drain_all().await;
						break;
					}
				},

				_ = idle_flush(deadline) => {
					tracing::debug!("bucket {} flushed by timer", self.index);
					self.drain_all().await;
				}
			}
		}
		tracing::debug!("bucket {} worker stopped", self.index);
	}

	async fn on_row(&mut self, row: PendingRow) {
		let oversized = row.size > self.accumulator.max_batch_bytes();
		self.accumulator.enqueue(row);
		if oversized {
			// an oversized row would stall everything behind it; push the
			// whole queue out now, FIFO
			self.drain_all().await;
			return;
		}
		while self.accumulator.threshold_reached() {
			match self.accumulator.next_batch() {
				Some(batch) => self.dispatch(batch).await,
				None => break,
			}
		}
	}

	async fn drain_all(&mut self) {
		while let Some(batch) = self.accumulator.next_batch() {
			self.dispatch(batch).await;
		}
	}

	/// Hand one batch through the dispatch gate. The permit is acquired
	/// in-line so batches of one bucket enter the gate in FIFO order in
	/// both write modes.
	async fn dispatch(&self, batch: OutboundBatch) {
		let permit =
			self.shared.gate.clone().acquire_owned().await.expect("dispatch gate semaphore closed");
		match self.shared.config.write_mode {
			WriteMode::Sequential => {
				// at most one in-flight batch per bucket
				send_and_resolve(&self.shared, batch).await;
				drop(permit);
			}
			WriteMode::Parallel => {
				let shared = Arc::clone(&self.shared);
				tokio::spawn(async move {
					send_and_resolve(&shared, batch).await;
					drop(permit);
				});
			}
		}
	}
}

async fn idle_flush(deadline: Option<Instant>) {
	match deadline {
		Some(at) => sleep_until(at).await,
		None => std::future::pending().await,
	}
}
