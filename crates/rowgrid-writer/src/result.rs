// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use parking_lot::Mutex;
use rowgrid_type::RowChange;
use tokio::sync::oneshot;

use crate::error::RowError;

/// Receives the terminal outcome of rows submitted fire-and-forget.
///
/// Installed with [`Writer::set_result_callback`](crate::Writer::set_result_callback)
/// and invoked from the result demultiplexer: exactly once per row, however
/// the underlying requests were batched. Implementations must not block.
pub trait WriterCallback: Send + Sync + 'static {
	fn on_completed(&self, change: &RowChange);

	fn on_failed(&self, change: &RowChange, error: &RowError);
}

/// Where a row's terminal outcome is delivered.
pub(crate) enum ResultSink {
	/// Fire into the writer's installed [`WriterCallback`], if any.
	Callback,
	/// Fill this row's slot in the owning submission group.
	Group(Arc<ResultGroup>),
}

/// Shared completion state for one `add_row_change*_with_future` call.
///
/// The rows of one submission may be split across many outbound requests
/// dispatched at different times; the group completes its future exactly
/// when the last member row settles.
pub(crate) struct ResultGroup {
	total: usize,
	state: Mutex<GroupState>,
}

struct GroupState {
	succeeded: Vec<RowChange>,
	failed: Vec<(RowChange, RowError)>,
	sender: Option<oneshot::Sender<WriterResult>>,
}

impl ResultGroup {
	pub(crate) fn channel(total: usize) -> (Arc<Self>, ResultFuture) {
		let (sender, receiver) = oneshot::channel();
		let group = Arc::new(Self {
			total,
			state: Mutex::new(GroupState {
				succeeded: Vec::new(),
				failed: Vec::new(),
				sender: Some(sender),
			}),
		});
		if total == 0 {
			group.try_complete(&mut group.state.lock());
		}
		(
			group,
			ResultFuture {
				total,
				receiver,
			},
		)
	}

	pub(crate) fn resolve(&self, change: RowChange, outcome: Result<(), RowError>) {
		let mut state = self.state.lock();
		match outcome {
			Ok(()) => state.succeeded.push(change),
			Err(error) => state.failed.push((change, error)),
		}
		if state.succeeded.len() + state.failed.len() == self.total {
			self.try_complete(&mut state);
		}
	}

	fn try_complete(&self, state: &mut GroupState) {
		if let Some(sender) = state.sender.take() {
			let result = WriterResult {
				total: self.total,
				succeeded: std::mem::take(&mut state.succeeded),
				failed: std::mem::take(&mut state.failed),
			};
			let _ = sender.send(result);
		}
	}
}

/// The itemized outcome of one submission.
#[derive(Clone, Debug)]
pub struct WriterResult {
	total: usize,
	succeeded: Vec<RowChange>,
	failed: Vec<(RowChange, RowError)>,
}

impl WriterResult {
	fn unfinished(total: usize) -> Self {
		Self {
			total,
			succeeded: Vec::new(),
			failed: Vec::new(),
		}
	}

	/// Number of rows in the submission.
	pub fn total_count(&self) -> usize {
		self.total
	}

	/// Whether every member row reached a terminal outcome. Only `false`
	/// when the writer was torn down before the submission resolved.
	pub fn is_finished(&self) -> bool {
		self.succeeded.len() + self.failed.len() == self.total
	}

	/// Whether the submission finished with no failed rows.
	pub fn all_succeeded(&self) -> bool {
		self.is_finished() && self.failed.is_empty()
	}

	pub fn succeeded(&self) -> &[RowChange] {
		&self.succeeded
	}

	/// The failed rows, each paired with its terminal error.
	pub fn failed(&self) -> &[(RowChange, RowError)] {
		&self.failed
	}
}

/// Resolves to the submission's [`WriterResult`] once every member row has
/// a terminal outcome.
pub struct ResultFuture {
	total: usize,
	receiver: oneshot::Receiver<WriterResult>,
}

impl Future for ResultFuture {
	type Output = WriterResult;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match Pin::new(&mut this.receiver).poll(cx) {
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			// writer torn down without settling the submission
			Poll::Ready(Err(_)) => Poll::Ready(WriterResult::unfinished(this.total)),
			Poll::Pending => Poll::Pending,
		}
	}
}
