//! Merge tool session.
//!
//! Holds an ordered list of source files; order defines output page order.
//! The merge is one atomic job with a cached result; any change to the list
//! invalidates the cache.

use crate::policy::{InputPolicy, PolicyError};
use crate::record::{RecordId, SourceFile};
use crate::SessionError;
use snappdf_core::{filename, merge_documents, ConversionResult, JobMetrics};
use std::time::Instant;
use tracing::warn;

/// Files required before a merge may run.
pub const MIN_MERGE_FILES: usize = 2;

pub struct MergeSession {
    files: Vec<SourceFile>,
    next_id: RecordId,
    policy: InputPolicy,
    result: Option<ConversionResult>,
    error: Option<String>,
    metrics: Option<JobMetrics>,
}

impl MergeSession {
    pub fn new() -> Self {
        Self::with_policy(InputPolicy::pdf())
    }

    pub fn with_policy(policy: InputPolicy) -> Self {
        Self {
            files: Vec::new(),
            next_id: 0,
            policy,
            result: None,
            error: None,
            metrics: None,
        }
    }

    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<RecordId, PolicyError> {
        let media_type = self.policy.check(name, bytes.len() as u64)?;
        let id = self.next_id;
        self.next_id += 1;
        self.files
            .push(SourceFile::new(id, name.to_string(), media_type, bytes));
        self.invalidate();
        Ok(id)
    }

    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        let removed = self.files.len() < before;
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Swap a file one slot toward the front of the list.
    pub fn move_up(&mut self, id: RecordId) -> bool {
        match self.position(id) {
            Some(i) if i > 0 => {
                self.files.swap(i, i - 1);
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Swap a file one slot toward the back of the list.
    pub fn move_down(&mut self, id: RecordId) -> bool {
        match self.position(id) {
            Some(i) if i + 1 < self.files.len() => {
                self.files.swap(i, i + 1);
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Rearrange the whole list. `new_order` holds current indices in the
    /// desired order and must be a permutation of them.
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), SessionError> {
        if new_order.len() != self.files.len() {
            return Err(SessionError::InvalidOrder(
                "wrong number of indices".into(),
            ));
        }

        let mut seen = vec![false; self.files.len()];
        for &idx in new_order {
            if idx >= self.files.len() {
                return Err(SessionError::InvalidOrder("index out of bounds".into()));
            }
            if seen[idx] {
                return Err(SessionError::InvalidOrder("duplicate index".into()));
            }
            seen[idx] = true;
        }

        let mut reordered = Vec::with_capacity(self.files.len());
        for &idx in new_order {
            reordered.push(std::mem::take(&mut self.files[idx]));
        }
        self.files = reordered;
        self.invalidate();
        Ok(())
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn can_merge(&self) -> bool {
        self.files.len() >= MIN_MERGE_FILES
    }

    /// Cached result of the last successful merge, if still valid.
    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn metrics(&self) -> Option<&JobMetrics> {
        self.metrics.as_ref()
    }

    pub fn output_name(&self) -> &'static str {
        filename::MERGED_NAME
    }

    /// Run the merge, or return the still-valid cached result.
    pub async fn merge(&mut self) -> Result<&ConversionResult, SessionError> {
        if self.result.is_none() {
            if !self.can_merge() {
                return Err(SessionError::NotReady {
                    required: MIN_MERGE_FILES,
                    actual: self.files.len(),
                });
            }

            let inputs: Vec<Vec<u8>> = self.files.iter().map(|f| f.bytes().to_vec()).collect();
            let input_size: u64 = inputs.iter().map(|b| b.len() as u64).sum();
            let started = Instant::now();

            let joined = tokio::task::spawn_blocking(move || merge_documents(inputs)).await;
            let result = match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    let message = e.to_string();
                    warn!(error = %message, "merge failed");
                    self.error = Some(message.clone());
                    return Err(SessionError::Job(message));
                }
                Err(join_err) => {
                    let message = format!("Merge task failed: {}", join_err);
                    self.error = Some(message.clone());
                    return Err(SessionError::Job(message));
                }
            };

            self.metrics = Some(JobMetrics {
                input_size_bytes: input_size,
                output_size_bytes: result.len(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
            self.error = None;
            self.result = Some(result);
        }

        self.result
            .as_ref()
            .ok_or_else(|| SessionError::Job("merge produced no result".into()))
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.files.iter().position(|f| f.id == id)
    }

    fn invalidate(&mut self) {
        self.result = None;
        self.error = None;
        self.metrics = None;
    }
}

impl Default for MergeSession {
    fn default() -> Self {
        Self::new()
    }
}
