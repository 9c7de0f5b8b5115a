// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use async_trait::async_trait;
use rowgrid_type::RowChange;

use crate::{
	config::RequestType,
	error::{RowError, TransportError},
};

/// The terminal outcome of one row within a request.
pub type RowOutcome = Result<(), RowError>;

/// The RPC seam between the writer and the service client.
///
/// Implementations own connection management, serialization, and the retry
/// policy for retryable conditions (timeouts, throttling): by the time a
/// call returns, every reported outcome is terminal. `Err` fails the whole
/// request and with it every row it carried.
///
/// Outcomes must be returned in the order the rows were given.
#[async_trait]
pub trait WriteTransport: Send + Sync + 'static {
	/// Issue a multi-row request. `request_type` selects the transactional
	/// batch call or the relaxed bulk-import call.
	async fn send_batch(
		&self,
		request_type: RequestType,
		rows: &[RowChange],
	) -> Result<Vec<RowOutcome>, TransportError>;

	/// Issue a single-row request. Used for rows too large to share a
	/// batch with anything else.
	async fn send_row(&self, row: &RowChange) -> Result<RowOutcome, TransportError>;
}
