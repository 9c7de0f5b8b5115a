// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use thiserror::Error;

/// Synchronous usage errors returned directly from writer calls.
///
/// These never describe the fate of an individual row; per-row outcomes are
/// delivered through the row's own callback or future as a [`RowError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriterError {
	#[error("the writer has been closed")]
	Closed,

	#[error("the writer has already been closed")]
	AlreadyClosed,

	#[error("invalid writer configuration: {reason}")]
	InvalidConfig {
		reason: String,
	},
}

/// The terminal failure of a single row mutation.
///
/// Row errors are never retried by the writer: retryable transport
/// conditions are exhausted below the transport seam, so everything that
/// reaches a row's result sink is final. `Clone` because one transport-level
/// failure fans out to every row of the affected batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
	#[error("condition check failed: {message}")]
	ConditionCheckFailed {
		message: String,
	},

	#[error("attribute column `{column}` is {size} bytes, exceeding the {limit} byte limit")]
	AttributeTooLarge {
		column: String,
		size: usize,
		limit: usize,
	},

	#[error("malformed row: {reason}")]
	MalformedRow {
		reason: String,
	},

	#[error("the writer was closed before the row could be dispatched")]
	WriterClosed,

	#[error("the transport returned no outcome for this row")]
	MissingOutcome,

	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// A transport-level failure affecting a whole request.
///
/// The transport applies its own retry policy before surfacing one of
/// these, so the writer treats them as terminal for every row in the
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
	#[error("request timed out: {0}")]
	Timeout(String),

	#[error("request was throttled: {0}")]
	Throttled(String),

	#[error("connection failed: {0}")]
	Connection(String),
}
