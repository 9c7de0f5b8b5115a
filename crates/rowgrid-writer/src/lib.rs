// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

//! Buffered batch row writer for the RowGrid row store.
//!
//! Callers submit individual row mutations at arbitrary rate and
//! concurrency; the writer turns them into bounded multi-row requests
//! without giving up per-key ordering.
//!
//! # Architecture
//!
//! - Rows are routed to one of `bucket_count` buckets by a stable hash of
//!   their primary key. Each bucket is a FIFO queue owned by a single
//!   worker task, which is what keeps mutations of one key in submission
//!   order.
//! - A bucket emits a batch when it holds enough rows or bytes, when its
//!   oldest pending row has waited `flush_interval`, or when `flush`/
//!   `close` forces a drain. A row too large to share a batch goes out
//!   alone through the single-row call.
//! - A semaphore of `concurrency` permits bounds the requests in flight
//!   across all buckets; a second semaphore of `buffer_size` permits
//!   pushes back on admission while the pending queues are full.
//! - The demultiplexer pairs response outcomes with their rows in drain
//!   order and resolves either the installed [`WriterCallback`] or the
//!   submission's [`ResultFuture`], updating the lifetime statistics.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rowgrid_writer::{PrimaryKey, RowChange, Writer, WriterConfig};
//!
//! let writer = Writer::new(transport, WriterConfig::default())?;
//!
//! let change = RowChange::put("users", PrimaryKey::new().column("id", 7i64))
//! 	.column("name", "alice");
//! let result = writer.add_row_change_with_future(change).await?.await;
//! assert!(result.all_succeeded());
//!
//! writer.close().await?;
//! ```

mod accumulator;
mod batch;
mod bucket;
mod config;
mod dispatch;
mod error;
mod result;
mod row;
mod stats;
mod transport;
mod writer;

pub use config::{MAX_ATTRIBUTE_VALUE_SIZE, MAX_ROWS_PER_REQUEST, RequestType, WriteMode, WriterConfig};
pub use error::{RowError, TransportError, WriterError};
pub use result::{ResultFuture, WriterCallback, WriterResult};
// the writer's view of the data model, re-exported for convenience
pub use rowgrid_type::{
	Column, Condition, PrimaryKey, PrimaryKeyColumn, PrimaryKeyValue, RowChange, RowOperation, Value,
};
pub use stats::StatisticsSnapshot;
pub use transport::{RowOutcome, WriteTransport};
pub use writer::Writer;
