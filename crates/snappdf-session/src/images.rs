//! Image pack tool session.
//!
//! Same atomic-job shape as the merge tool: an ordered list of images, one
//! combined PDF result, cache invalidated by any list change.

use crate::policy::{InputPolicy, PolicyError};
use crate::record::{RecordId, SourceFile};
use crate::SessionError;
use snappdf_core::{filename, images_to_pdf, ConversionResult, ImageFile, JobMetrics};
use std::time::Instant;
use tracing::warn;

pub struct ImagePackSession {
    files: Vec<SourceFile>,
    next_id: RecordId,
    policy: InputPolicy,
    result: Option<ConversionResult>,
    error: Option<String>,
    metrics: Option<JobMetrics>,
}

impl ImagePackSession {
    pub fn new() -> Self {
        Self::with_policy(InputPolicy::images())
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

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn can_convert(&self) -> bool {
        !self.files.is_empty()
    }

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
        filename::IMAGE_PACK_NAME
    }

    /// Pack the images into one PDF, or return the still-valid cached result.
    pub async fn convert(&mut self) -> Result<&ConversionResult, SessionError> {
        if self.result.is_none() {
            if !self.can_convert() {
                return Err(SessionError::NotReady {
                    required: 1,
                    actual: 0,
                });
            }

            let inputs: Vec<ImageFile> = self
                .files
                .iter()
                .map(|f| ImageFile {
                    name: f.name.clone(),
                    media_type: f.media_type,
                    bytes: f.bytes().to_vec(),
                })
                .collect();
            let input_size: u64 = inputs.iter().map(|i| i.bytes.len() as u64).sum();
            let started = Instant::now();

            let joined = tokio::task::spawn_blocking(move || images_to_pdf(&inputs)).await;
            let result = match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    let message = e.to_string();
                    warn!(error = %message, "image pack failed");
                    self.error = Some(message.clone());
                    return Err(SessionError::Job(message));
                }
                Err(join_err) => {
                    let message = format!("Image pack task failed: {}", join_err);
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
            .ok_or_else(|| SessionError::Job("image pack produced no result".into()))
    }

    fn invalidate(&mut self) {
        self.result = None;
        self.error = None;
        self.metrics = None;
    }
}

impl Default for ImagePackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::png_bytes;
    use lopdf::Document;

    #[tokio::test]
    async fn test_empty_session_is_not_ready() {
        let mut session = ImagePackSession::new();
        assert!(!session.can_convert());
        assert!(session.convert().await.is_err());
    }

    #[tokio::test]
    async fn test_one_page_per_image() {
        let mut session = ImagePackSession::new();
        session.add_file("a.png", png_bytes(30, 20)).unwrap();
        session.add_file("b.png", png_bytes(10, 10)).unwrap();

        let result = session.convert().await.unwrap();
        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(session.output_name(), "images.pdf");
    }

    #[tokio::test]
    async fn test_remove_invalidates_cached_result() {
        let mut session = ImagePackSession::new();
        let a = session.add_file("a.png", png_bytes(8, 8)).unwrap();
        session.add_file("b.png", png_bytes(8, 8)).unwrap();

        session.convert().await.unwrap();
        assert!(session.result().is_some());

        assert!(session.remove(a));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_image_stores_error() {
        let mut session = ImagePackSession::new();
        session
            .add_file("broken.gif", b"GIF89a broken".to_vec())
            .unwrap();

        let err = session.convert().await.unwrap_err();
        assert!(matches!(err, SessionError::Job(_)));
        assert!(session.error().unwrap().contains("broken.gif"));
    }

    #[test]
    fn test_policy_rejects_pdf_input() {
        let mut session = ImagePackSession::new();
        assert!(session.add_file("doc.pdf", vec![0; 4]).is_err());
        assert!(session.files().is_empty());
    }
}
