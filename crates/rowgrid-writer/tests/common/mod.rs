// Copyright (c) rowgrid.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{
	collections::HashSet,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use async_trait::async_trait;
use rowgrid_writer::{
	PrimaryKey, PrimaryKeyValue, RequestType, RowChange, RowError, RowOperation, RowOutcome,
	TransportError, Value, WriteTransport, WriterCallback, WriterConfig,
};

/// What one transport call carried.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct RecordedRequest {
	pub request_type: RequestType,
	pub rows: Vec<RowChange>,
	pub single: bool,
}

/// In-memory transport: records every request in arrival order, succeeds
/// rows unless they carry a column named `poison`, and can fail whole
/// requests by sequence number.
#[derive(Default)]
pub struct MockTransport {
	latency: Option<Duration>,
	requests: Mutex<Vec<RecordedRequest>>,
	fail_requests: Mutex<HashSet<usize>>,
	sequence: AtomicUsize,
	active: AtomicUsize,
	max_active: AtomicUsize,
}

#[allow(dead_code)]
impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_latency(latency: Duration) -> Arc<Self> {
		Arc::new(Self {
			latency: Some(latency),
			..Self::default()
		})
	}

	/// Fail the n-th request (0-based, counting both call kinds) with a
	/// transport-level timeout.
	pub fn fail_request(&self, sequence: usize) {
		self.fail_requests.lock().unwrap().insert(sequence);
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().unwrap().clone()
	}

	pub fn request_count(&self) -> usize {
		self.requests.lock().unwrap().len()
	}

	/// Highest number of requests that were in flight at the same moment.
	pub fn max_active(&self) -> usize {
		self.max_active.load(Ordering::SeqCst)
	}

	async fn enter(&self) -> usize {
		let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
		let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_active.fetch_max(active, Ordering::SeqCst);
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
		sequence
	}

	fn leave(&self) {
		self.active.fetch_sub(1, Ordering::SeqCst);
	}

	fn should_fail(&self, sequence: usize) -> bool {
		self.fail_requests.lock().unwrap().contains(&sequence)
	}

	fn outcome(row: &RowChange) -> RowOutcome {
		let columns = match row.operation() {
			RowOperation::Put {
				columns,
			} => columns.as_slice(),
			RowOperation::Update {
				puts, ..
			} => puts.as_slice(),
			RowOperation::Delete => &[],
		};
		if columns.iter().any(|c| c.name == "poison") {
			Err(RowError::ConditionCheckFailed {
				message: "poisoned row".to_string(),
			})
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl WriteTransport for MockTransport {
	async fn send_batch(
		&self,
		request_type: RequestType,
		rows: &[RowChange],
	) -> Result<Vec<RowOutcome>, TransportError> {
		let sequence = self.enter().await;
		self.requests.lock().unwrap().push(RecordedRequest {
			request_type,
			rows: rows.to_vec(),
			single: false,
		});
		let result = if self.should_fail(sequence) {
			Err(TransportError::Timeout("injected failure".to_string()))
		} else {
			Ok(rows.iter().map(Self::outcome).collect())
		};
		self.leave();
		result
	}

	async fn send_row(&self, row: &RowChange) -> Result<RowOutcome, TransportError> {
		let sequence = self.enter().await;
		self.requests.lock().unwrap().push(RecordedRequest {
			request_type: RequestType::BatchWrite,
			rows: vec![row.clone()],
			single: true,
		});
		let result = if self.should_fail(sequence) {
			Err(TransportError::Timeout("injected failure".to_string()))
		} else {
			Ok(Self::outcome(row))
		};
		self.leave();
		result
	}
}

/// Callback counting terminal outcomes.
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingCallback {
	pub completed: AtomicUsize,
	pub failed: AtomicUsize,
}

impl WriterCallback for CountingCallback {
	fn on_completed(&self, _change: &RowChange) {
		self.completed.fetch_add(1, Ordering::SeqCst);
	}

	fn on_failed(&self, _change: &RowChange, _error: &RowError) {
		self.failed.fetch_add(1, Ordering::SeqCst);
	}
}

/// A config that never flushes on its own: one bucket, an effectively
/// infinite flush interval, and no statistics reporter.
#[allow(dead_code)]
pub fn quiet_config() -> WriterConfig {
	WriterConfig {
		bucket_count: 1,
		flush_interval: Duration::from_secs(3600),
		log_interval: None,
		..WriterConfig::default()
	}
}

#[allow(dead_code)]
pub fn row(table: &str, id: i64, seq: i64) -> RowChange {
	RowChange::put(table, PrimaryKey::new().column("id", id)).column("seq", seq)
}

#[allow(dead_code)]
pub fn poison_row(id: i64) -> RowChange {
	RowChange::put("t", PrimaryKey::new().column("id", id)).column("poison", true)
}

#[allow(dead_code)]
pub fn big_row(id: i64, bytes: usize) -> RowChange {
	RowChange::put("t", PrimaryKey::new().column("id", id)).column("payload", vec![0u8; bytes])
}

#[allow(dead_code)]
pub fn id_of(change: &RowChange) -> i64 {
	match &change.primary_key().columns()[0].value {
		PrimaryKeyValue::Int8(v) => *v,
		other => panic!("unexpected primary key value {:?}", other),
	}
}

#[allow(dead_code)]
pub fn seq_of(change: &RowChange) -> i64 {
	let RowOperation::Put {
		columns,
	} = change.operation()
	else {
		panic!("expected a put");
	};
	let column = columns.iter().find(|c| c.name == "seq").expect("row has no seq column");
	match &column.value {
		Value::Int8(v) => *v,
		other => panic!("unexpected seq value {:?}", other),
	}
}
