//! Compress tool session.
//!
//! Owns a batch of records and drives each Pending record through the
//! compress transform, one at a time in list order. One record's failure
//! never aborts the batch.

use crate::cancel::{self, CancelToken, CANCELLED_MESSAGE};
use crate::policy::{InputPolicy, PolicyError};
use crate::record::{FileRecord, RecordId, RecordStatus};
use snappdf_core::{compress_document, filename};
use tracing::warn;

pub struct CompressSession {
    records: Vec<FileRecord>,
    next_id: RecordId,
    policy: InputPolicy,
}

impl CompressSession {
    pub fn new() -> Self {
        Self::with_policy(InputPolicy::pdf())
    }

    pub fn with_policy(policy: InputPolicy) -> Self {
        Self {
            records: Vec::new(),
            next_id: 0,
            policy,
        }
    }

    /// Accept a file and create its Pending record.
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<RecordId, PolicyError> {
        let media_type = self.policy.check(name, bytes.len() as u64)?;
        let id = self.next_id;
        self.next_id += 1;
        self.records
            .push(FileRecord::new(id, name.to_string(), media_type, bytes));
        Ok(id)
    }

    /// Remove a record. Settled or not, removal is the only way a record
    /// leaves the list.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() < before
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status() == RecordStatus::Pending)
            .count()
    }

    /// Default output name for a record: `<stem>-compressed.pdf`.
    pub fn output_name(&self, id: RecordId) -> Option<String> {
        self.record(id).map(|r| filename::compressed_name(&r.name))
    }

    /// Process every Pending record in list order.
    pub async fn process_pending(&mut self) -> usize {
        self.process_pending_with(cancel::never()).await
    }

    /// Process the first Pending record, if any.
    pub async fn process_next(&mut self) -> Option<RecordId> {
        let idx = self.first_pending()?;
        let id = self.records[idx].id;
        self.process_record(idx, &cancel::never()).await;
        Some(id)
    }

    /// Process Pending records until the list is drained or the batch is
    /// cancelled. Cancellation between records leaves the rest Pending; an
    /// in-flight record settles as Error and its late result is discarded.
    pub async fn process_pending_with(&mut self, cancel: CancelToken) -> usize {
        let mut processed = 0;
        while !cancel.is_cancelled() {
            let Some(idx) = self.first_pending() else {
                break;
            };
            let interrupted = self.process_record(idx, &cancel).await;
            processed += 1;
            if interrupted {
                break;
            }
        }
        processed
    }

    fn first_pending(&self) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.status() == RecordStatus::Pending)
    }

    /// Returns true if the batch was cancelled while this record ran.
    async fn process_record(&mut self, idx: usize, cancel: &CancelToken) -> bool {
        self.records[idx].start();

        let bytes = self.records[idx].bytes().to_vec();
        let mut work = tokio::task::spawn_blocking(move || compress_document(&bytes));
        let mut wait = cancel.clone();

        let outcome = tokio::select! {
            res = &mut work => Some(res),
            _ = wait.cancelled() => None,
        };

        match outcome {
            Some(Ok(Ok(result))) => {
                self.records[idx].settle_ok(result);
                false
            }
            Some(Ok(Err(e))) => {
                warn!(file = %self.records[idx].name, error = %e, "compression failed");
                self.records[idx].settle_err(e.to_string());
                false
            }
            Some(Err(join_err)) => {
                self.records[idx].settle_err(format!("Compression task failed: {}", join_err));
                false
            }
            None => {
                self.records[idx].settle_err(CANCELLED_MESSAGE.to_string());
                true
            }
        }
    }
}

impl Default for CompressSession {
    fn default() -> Self {
        Self::new()
    }
}
