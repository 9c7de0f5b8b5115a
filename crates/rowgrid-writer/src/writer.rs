// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	sync::{
		Arc,
		atomic::{AtomicU8, Ordering},
	},
	time::Duration,
};

use parking_lot::{Mutex, RwLock};
use rowgrid_type::RowChange;
use tokio::{
	sync::{Semaphore, mpsc, oneshot, watch},
	task::JoinHandle,
	time::Instant,
};

use crate::{
	bucket::{BucketCommand, BucketWorker, bucket_index, key_hash},
	config::WriterConfig,
	dispatch::resolve_row,
	error::{RowError, WriterError},
	result::{ResultFuture, ResultGroup, ResultSink, WriterCallback},
	row::PendingRow,
	stats::{StatisticsSnapshot, WriterStatistics},
	transport::WriteTransport,
};

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// State shared between the writer handle, the bucket workers, and
/// spawned dispatches.
pub(crate) struct Shared {
	pub(crate) config: WriterConfig,
	pub(crate) transport: Arc<dyn WriteTransport>,
	/// Dispatch gate: bounds requests in flight across all buckets.
	pub(crate) gate: Arc<Semaphore>,
	pub(crate) callback: RwLock<Option<Arc<dyn WriterCallback>>>,
	pub(crate) stats: WriterStatistics,
	/// Rows admitted into a bucket and not yet terminal. `flush` and
	/// `close` wait for this to reach zero.
	outstanding: watch::Sender<usize>,
}

impl Shared {
	pub(crate) fn row_admitted(&self) {
		self.outstanding.send_modify(|count| *count += 1);
	}

	pub(crate) fn row_settled(&self) {
		self.outstanding.send_modify(|count| *count -= 1);
	}

	fn subscribe_outstanding(&self) -> watch::Receiver<usize> {
		self.outstanding.subscribe()
	}
}

struct Inner {
	shared: Arc<Shared>,
	state: AtomicU8,
	/// Admission buffer: one permit per row held in a pending queue.
	buffer: Arc<Semaphore>,
	/// `None` once `close` has started tearing the workers down.
	buckets: Mutex<Option<Vec<mpsc::UnboundedSender<BucketCommand>>>>,
	tasks: Mutex<Vec<JoinHandle<()>>>,
	shutdown: watch::Sender<bool>,
}

/// Buffered batch row writer.
///
/// Cheap to clone; all clones share the same buckets, statistics, and
/// lifecycle. Submission methods take `&self` and may be called from any
/// number of tasks concurrently.
///
/// The writer goes through three states: open (accepting rows), closing
/// (draining after [`close`](Writer::close) was called), and closed.
/// Submissions and `flush` are only valid while open.
#[derive(Clone)]
pub struct Writer {
	inner: Arc<Inner>,
}

impl Writer {
	/// Create a writer over `transport`.
	///
	/// Spawns one worker task per bucket (plus the periodic statistics
	/// reporter unless `log_interval` is `None`), so this must be called
	/// within a Tokio runtime.
	pub fn new(transport: Arc<dyn WriteTransport>, config: WriterConfig) -> Result<Self, WriterError> {
		config.validate()?;

		let (outstanding, _) = watch::channel(0usize);
		let shared = Arc::new(Shared {
			gate: Arc::new(Semaphore::new(config.concurrency)),
			callback: RwLock::new(None),
			stats: WriterStatistics::default(),
			transport,
			outstanding,
			config,
		});

		let (shutdown, shutdown_rx) = watch::channel(false);
		let mut senders = Vec::with_capacity(shared.config.bucket_count);
		let mut tasks = Vec::with_capacity(shared.config.bucket_count + 1);
		for index in 0..shared.config.bucket_count {
			let (tx, rx) = mpsc::unbounded_channel();
			let worker = BucketWorker::new(index, Arc::clone(&shared));
			tasks.push(tokio::spawn(worker.run(rx)));
			senders.push(tx);
		}
		if let Some(interval) = shared.config.log_interval {
			tasks.push(spawn_reporter(Arc::clone(&shared), interval, shutdown_rx));
		}

		Ok(Self {
			inner: Arc::new(Inner {
				buffer: Arc::new(Semaphore::new(shared.config.buffer_size)),
				state: AtomicU8::new(STATE_OPEN),
				buckets: Mutex::new(Some(senders)),
				tasks: Mutex::new(tasks),
				shutdown,
				shared,
			}),
		})
	}

	/// Submit one mutation fire-and-forget. Its terminal outcome reaches
	/// the callback installed with
	/// [`set_result_callback`](Writer::set_result_callback).
	///
	/// Suspends while the admission buffer is full (backpressure). Returns
	/// an error only for lifecycle misuse; per-row failures are delivered
	/// through the callback, never here.
	pub async fn add_row_change(&self, change: RowChange) -> Result<(), WriterError> {
		self.check_open()?;
		self.admit(change, ResultSink::Callback).await;
		Ok(())
	}

	/// Submit one mutation and obtain a future for its outcome.
	pub async fn add_row_change_with_future(
		&self,
		change: RowChange,
	) -> Result<ResultFuture, WriterError> {
		self.add_row_changes_with_future(vec![change]).await
	}

	/// Submit a list of mutations and obtain a future for the whole
	/// submission.
	///
	/// The rows may be spread across many outbound requests; the future
	/// resolves once every one of them has a terminal outcome, with the
	/// itemized per-row breakdown.
	pub async fn add_row_changes_with_future(
		&self,
		changes: Vec<RowChange>,
	) -> Result<ResultFuture, WriterError> {
		self.check_open()?;
		let (group, future) = ResultGroup::channel(changes.len());
		for change in changes {
			self.admit(change, ResultSink::Group(Arc::clone(&group))).await;
		}
		Ok(future)
	}

	/// Install or replace the callback receiving fire-and-forget outcomes.
	pub fn set_result_callback(&self, callback: Arc<dyn WriterCallback>) {
		*self.inner.shared.callback.write() = Some(callback);
	}

	pub fn clear_result_callback(&self) {
		*self.inner.shared.callback.write() = None;
	}

	/// A point-in-time snapshot of the lifetime counters.
	pub fn statistics(&self) -> StatisticsSnapshot {
		self.inner.shared.stats.snapshot()
	}

	/// Force every bucket to drain and wait until every row admitted
	/// before this call has reached its terminal outcome.
	pub async fn flush(&self) -> Result<(), WriterError> {
		self.check_open()?;
		self.flush_inner().await;
		Ok(())
	}

	/// Stop accepting rows, flush everything pending, wait for every
	/// in-flight request to settle, then stop the worker tasks.
	///
	/// Valid exactly once; later calls (and calls racing the first) fail
	/// with [`WriterError::AlreadyClosed`]. No row admitted before `close`
	/// is dropped.
	pub async fn close(&self) -> Result<(), WriterError> {
		if self
			.inner
			.state
			.compare_exchange(STATE_OPEN, STATE_CLOSING, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return Err(WriterError::AlreadyClosed);
		}
		tracing::debug!("writer closing");
		self.flush_inner().await;

		// dropping the senders ends each worker after it has drained every
		// command already queued, so a submission that raced the state
		// change is still delivered, not lost
		let senders = self.inner.buckets.lock().take();
		drop(senders);
		let _ = self.inner.shutdown.send(true);
		let tasks: Vec<JoinHandle<()>> = {
			let mut tasks = self.inner.tasks.lock();
			tasks.drain(..).collect()
		};
		for task in tasks {
			let _ = task.await;
		}

		// rows that raced the close settle through their sinks before the
		// writer reports closed
		let mut outstanding = self.inner.shared.subscribe_outstanding();
		let _ = outstanding.wait_for(|count| *count == 0).await;

		self.inner.state.store(STATE_CLOSED, Ordering::Release);
		tracing::debug!("writer closed");
		Ok(())
	}

	fn check_open(&self) -> Result<(), WriterError> {
		if self.inner.state.load(Ordering::Acquire) == STATE_OPEN {
			Ok(())
		} else {
			Err(WriterError::Closed)
		}
	}

	async fn flush_inner(&self) {
		let senders = self.inner.buckets.lock().clone();
		let mut acks = Vec::new();
		if let Some(senders) = senders {
			for sender in &senders {
				let (tx, rx) = oneshot::channel();
				if sender.send(BucketCommand::Flush(tx)).is_ok() {
					acks.push(rx);
				}
			}
		}
		for ack in acks {
			let _ = ack.await;
		}
		let mut outstanding = self.inner.shared.subscribe_outstanding();
		let _ = outstanding.wait_for(|count| *count == 0).await;
	}

	/// Validate, apply backpressure, route, and enqueue one row. Rows
	/// rejected client-side resolve their sink immediately; every accepted
	/// row is guaranteed a terminal outcome later.
	async fn admit(&self, change: RowChange, sink: ResultSink) {
		let shared = &self.inner.shared;
		shared.stats.inc_total_rows();

		if change.primary_key().is_empty() {
			let error = RowError::MalformedRow {
				reason: "the primary key has no columns".to_string(),
			};
			resolve_row(shared, change, sink, Err(error));
			return;
		}
		let limit = shared.config.effective_max_attr_value_size();
		if let Some((column, size)) = change.largest_attribute() {
			if size > limit {
				let error = RowError::AttributeTooLarge {
					column: column.to_string(),
					size,
					limit,
				};
				resolve_row(shared, change, sink, Err(error));
				return;
			}
		}

		// backpressure: wait for a buffer slot
		let permit = match Arc::clone(&self.inner.buffer).acquire_owned().await {
			Ok(permit) => permit,
			Err(_) => {
				resolve_row(shared, change, sink, Err(RowError::WriterClosed));
				return;
			}
		};

		let hash = key_hash(change.primary_key());
		let index = bucket_index(hash, shared.config.bucket_count);
		let row = PendingRow {
			key_hash: hash,
			size: change.byte_size(),
			enqueued_at: Instant::now(),
			change,
			sink,
			permit: Some(permit),
		};

		let sender = {
			let buckets = self.inner.buckets.lock();
			buckets.as_ref().map(|senders| senders[index].clone())
		};
		let Some(sender) = sender else {
			// close() won the race; the row still gets a terminal outcome
			resolve_row(shared, row.change, row.sink, Err(RowError::WriterClosed));
			return;
		};
		shared.row_admitted();
		if let Err(mpsc::error::SendError(command)) = sender.send(BucketCommand::Row(row)) {
			shared.row_settled();
			if let BucketCommand::Row(row) = command {
				resolve_row(shared, row.change, row.sink, Err(RowError::WriterClosed));
			}
		}
	}
}

fn spawn_reporter(
	shared: Arc<Shared>,
	interval: Duration,
	mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			tokio::select! {
				_ = tokio::time::sleep(interval) => {
					tracing::info!("writer statistics: {}", shared.stats.snapshot());
				}
				changed = shutdown.changed() => {
					if changed.is_err() || *shutdown.borrow() {
						break;
					}
				}
			}
		}
	})
}
