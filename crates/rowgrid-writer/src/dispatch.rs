// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use rowgrid_type::RowChange;

use crate::{
	batch::OutboundBatch,
	error::RowError,
	result::ResultSink,
	writer::Shared,
};

/// Send one batch through the transport and route every outcome back to
/// its row's sink, in drain order.
///
/// Every row of the batch reaches a terminal outcome before this returns
/// control of the gate permit: a transport-level failure fans out to all
/// rows, and a short outcome list resolves the remainder with an internal
/// error rather than leaving rows pending.
pub(crate) async fn send_and_resolve(shared: &Shared, batch: OutboundBatch) {
	let OutboundBatch {
		rows,
		sinks,
		bytes,
		single,
	} = batch;

	shared.stats.inc_requests();
	if single {
		shared.stats.inc_single_row_requests();
	}
	tracing::debug!("dispatching {} row(s), {} bytes", rows.len(), bytes);

	if single {
		let (Some(change), Some(sink)) = (rows.into_iter().next(), sinks.into_iter().next()) else {
			return;
		};
		let outcome = match shared.transport.send_row(&change).await {
			Ok(outcome) => outcome,
			Err(error) => {
				tracing::warn!("single-row request failed: {}", error);
				Err(RowError::Transport(error))
			}
		};
		settle(shared, change, sink, outcome);
		return;
	}

	match shared.transport.send_batch(shared.config.request_type, &rows).await {
		Ok(outcomes) => {
			if outcomes.len() != rows.len() {
				tracing::warn!(
					"transport returned {} outcomes for {} rows",
					outcomes.len(),
					rows.len()
				);
			}
			let mut outcomes = outcomes.into_iter();
			for (change, sink) in rows.into_iter().zip(sinks) {
				let outcome = outcomes.next().unwrap_or(Err(RowError::MissingOutcome));
				settle(shared, change, sink, outcome);
			}
		}
		Err(error) => {
			tracing::warn!("batch request failed: {}", error);
			for (change, sink) in rows.into_iter().zip(sinks) {
				settle(shared, change, sink, Err(RowError::Transport(error.clone())));
			}
		}
	}
}

fn settle(shared: &Shared, change: RowChange, sink: ResultSink, outcome: Result<(), RowError>) {
	resolve_row(shared, change, sink, outcome);
	shared.row_settled();
}

/// Deliver one terminal outcome: bump the counters, then fire the callback
/// or fill the submission-group slot. Also used by the admission path for
/// rows rejected client-side (which never count as outstanding).
pub(crate) fn resolve_row(
	shared: &Shared,
	change: RowChange,
	sink: ResultSink,
	outcome: Result<(), RowError>,
) {
	match &outcome {
		Ok(()) => shared.stats.inc_succeeded_rows(),
		Err(error) => {
			shared.stats.inc_failed_rows();
			tracing::debug!("row for table `{}` failed: {}", change.table(), error);
		}
	}
	match sink {
		ResultSink::Callback => {
			// clone the handle out so a callback may replace itself
			// through `set_result_callback` without deadlocking
			let callback = shared.callback.read().clone();
			if let Some(callback) = callback {
				match outcome {
					Ok(()) => callback.on_completed(&change),
					Err(error) => callback.on_failed(&change, &error),
				}
			}
		}
		ResultSink::Group(group) => group.resolve(change, outcome),
	}
}
