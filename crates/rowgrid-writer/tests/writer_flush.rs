// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

//! Flush behavior, batch assembly limits, and statistics accounting.

mod common;

use common::{MockTransport, big_row, id_of, poison_row, quiet_config, row, seq_of};
use rowgrid_writer::{RequestType, Writer, WriterConfig};

#[tokio::test]
async fn test_buffered_rows_coalesce_into_one_request() {
	let transport = MockTransport::new();
	let config = WriterConfig {
		concurrency: 100,
		buffer_size: 4096,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	for id in 0..100 {
		writer.add_row_change(row("t", id, 0)).await.unwrap();
	}
	writer.flush().await.unwrap();

	let stats = writer.statistics();
	assert_eq!(stats.total_rows_count, 100);
	assert_eq!(stats.total_succeeded_rows_count, 100);
	assert_eq!(stats.total_failed_rows_count, 0);
	assert_eq!(stats.total_request_count, 1);
	assert_eq!(stats.total_single_row_request_count, 0);

	let requests = transport.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].rows.len(), 100);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_statistics_add_up_after_flush() {
	let transport = MockTransport::new();
	let writer = Writer::new(transport.clone(), quiet_config()).unwrap();

	for id in 0..8 {
		writer.add_row_change(row("t", id, 0)).await.unwrap();
	}
	writer.add_row_change(poison_row(100)).await.unwrap();
	writer.add_row_change(poison_row(101)).await.unwrap();
	writer.flush().await.unwrap();

	let stats = writer.statistics();
	assert_eq!(stats.total_rows_count, 10);
	assert_eq!(stats.total_succeeded_rows_count, 8);
	assert_eq!(stats.total_failed_rows_count, 2);
	assert_eq!(stats.total_succeeded_rows_count + stats.total_failed_rows_count, stats.total_rows_count);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_batches_split_by_row_count() {
	let transport = MockTransport::new();
	let config = WriterConfig {
		max_batch_rows: 10,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	for id in 0..25 {
		writer.add_row_change(row("t", id, 0)).await.unwrap();
	}
	writer.flush().await.unwrap();

	let sizes: Vec<usize> = transport.requests().iter().map(|r| r.rows.len()).collect();
	assert_eq!(sizes.iter().sum::<usize>(), 25);
	assert!(sizes.iter().all(|&len| len <= 10), "oversized batch in {:?}", sizes);
	assert_eq!(writer.statistics().total_request_count, 3);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_batches_split_by_byte_size() {
	let transport = MockTransport::new();
	// each test row accounts for 22 bytes, so 50 bytes fit two rows
	let config = WriterConfig {
		max_batch_size: 50,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	for id in 0..5 {
		writer.add_row_change(row("t", id, 0)).await.unwrap();
	}
	writer.flush().await.unwrap();

	let sizes: Vec<usize> = transport.requests().iter().map(|r| r.rows.len()).collect();
	assert_eq!(sizes.iter().sum::<usize>(), 5);
	assert!(sizes.iter().all(|&len| len <= 2), "batch over the byte limit in {:?}", sizes);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_oversized_row_uses_single_row_request() {
	let transport = MockTransport::new();
	let config = WriterConfig {
		max_batch_size: 64,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	writer.add_row_change(row("t", 1, 0)).await.unwrap();
	writer.add_row_change(big_row(2, 200)).await.unwrap();
	writer.add_row_change(row("t", 3, 0)).await.unwrap();
	writer.flush().await.unwrap();

	let stats = writer.statistics();
	assert_eq!(stats.total_succeeded_rows_count, 3);
	assert_eq!(stats.total_request_count, 3);
	assert_eq!(stats.total_single_row_request_count, 1);

	let requests = transport.requests();
	// the oversized row neither joined a batch nor held up its bucket
	assert_eq!(requests.iter().filter(|r| r.single).count(), 1);
	let degenerate = requests.iter().find(|r| r.single).unwrap();
	assert_eq!(id_of(&degenerate.rows[0]), 2);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_same_key_never_shares_a_request() {
	let transport = MockTransport::new();
	let writer = Writer::new(transport.clone(), quiet_config()).unwrap();

	writer.add_row_change(row("t", 7, 0)).await.unwrap();
	writer.add_row_change(row("t", 8, 0)).await.unwrap();
	writer.add_row_change(row("t", 7, 1)).await.unwrap();
	writer.flush().await.unwrap();

	let requests = transport.requests();
	assert_eq!(requests.len(), 2);
	for request in &requests {
		let mut seen = std::collections::HashSet::new();
		for change in &request.rows {
			assert!(seen.insert(id_of(change)), "request carries key {} twice", id_of(change));
		}
	}
	// the duplicate went out later, preserving submission order
	assert_eq!(seq_of(&requests[1].rows[0]), 1);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_keys_share_a_request_when_allowed() {
	let transport = MockTransport::new();
	let config = WriterConfig {
		allow_duplicate_rows: true,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	writer.add_row_change(row("t", 7, 0)).await.unwrap();
	writer.add_row_change(row("t", 7, 1)).await.unwrap();
	writer.flush().await.unwrap();

	let requests = transport.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].rows.len(), 2);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_bulk_import_mode_reaches_the_transport() {
	let transport = MockTransport::new();
	let config = WriterConfig {
		request_type: RequestType::BulkImport,
		allow_duplicate_rows: true,
		..quiet_config()
	};
	let writer = Writer::new(transport.clone(), config).unwrap();

	for id in 0..4 {
		writer.add_row_change(row("t", id, 0)).await.unwrap();
	}
	writer.flush().await.unwrap();

	let requests = transport.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].request_type, RequestType::BulkImport);

	writer.close().await.unwrap();
}

#[tokio::test]
async fn test_flush_on_empty_writer_is_a_no_op() {
	let transport = MockTransport::new();
	let writer = Writer::new(transport.clone(), quiet_config()).unwrap();

	writer.flush().await.unwrap();
	assert_eq!(writer.statistics().total_request_count, 0);
	assert_eq!(transport.request_count(), 0);

	writer.close().await.unwrap();
}
