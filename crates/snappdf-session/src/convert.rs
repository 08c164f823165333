//! Remote conversion tool session.
//!
//! Single-slot: the PDF↔Word tools hold one file at a time. The slot record
//! follows the same forward-only lifecycle as batch records, around one
//! round trip to the conversion service.

use crate::cancel::{self, CancelToken, CANCELLED_MESSAGE};
use crate::policy::{InputPolicy, PolicyError};
use crate::record::{FileRecord, RecordId, RecordStatus};
use snappdf_core::filename;
use snappdf_remote::{Direction, RemoteConverter};
use tracing::warn;

pub struct ConvertSession {
    converter: RemoteConverter,
    direction: Direction,
    slot: Option<FileRecord>,
    next_id: RecordId,
    policy: InputPolicy,
}

impl ConvertSession {
    pub fn new(converter: RemoteConverter, direction: Direction) -> Self {
        let policy = match direction {
            Direction::PdfToWord => InputPolicy::pdf(),
            Direction::WordToPdf => InputPolicy::word(),
        };
        Self {
            converter,
            direction,
            slot: None,
            next_id: 0,
            policy,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Accept a file into the slot, replacing whatever was there.
    pub fn set_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<RecordId, PolicyError> {
        let media_type = self.policy.check(name, bytes.len() as u64)?;
        let id = self.next_id;
        self.next_id += 1;
        self.slot = Some(FileRecord::new(id, name.to_string(), media_type, bytes));
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn record(&self) -> Option<&FileRecord> {
        self.slot.as_ref()
    }

    /// Default output name: input stem with the direction's extension.
    pub fn output_name(&self) -> Option<String> {
        self.slot
            .as_ref()
            .map(|r| filename::with_extension(&r.name, self.direction.output_extension()))
    }

    /// Convert the slot file. Returns the status the record settled in, or
    /// `None` when the slot is empty. A settled record is left untouched.
    pub async fn convert(&mut self) -> Option<RecordStatus> {
        self.convert_with(cancel::never()).await
    }

    /// Like [`convert`](Self::convert), racing the upload against a
    /// cancellation token; cancelling drops the in-flight request.
    pub async fn convert_with(&mut self, cancel: CancelToken) -> Option<RecordStatus> {
        let (name, bytes) = {
            let record = self.slot.as_mut()?;
            if record.status() != RecordStatus::Pending {
                return Some(record.status());
            }
            record.start();
            (record.name.clone(), record.bytes().to_vec())
        };

        let mut wait = cancel.clone();
        let outcome = tokio::select! {
            res = self.converter.convert(&name, bytes, self.direction) => Some(res),
            _ = wait.cancelled() => None,
        };

        let record = self.slot.as_mut()?;
        match outcome {
            Some(Ok(result)) => record.settle_ok(result),
            Some(Err(e)) => {
                warn!(file = %record.name, error = %e, "remote conversion failed");
                record.settle_err(e.to_string());
            }
            None => record.settle_err(CANCELLED_MESSAGE.to_string()),
        }
        Some(record.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snappdf_remote::RemoteConfig;

    fn session(direction: Direction) -> ConvertSession {
        let converter = RemoteConverter::new(RemoteConfig::new("http://localhost:9")).unwrap();
        ConvertSession::new(converter, direction)
    }

    #[test]
    fn test_policy_follows_direction() {
        let mut pdf_to_word = session(Direction::PdfToWord);
        assert!(pdf_to_word.set_file("report.pdf", vec![0; 4]).is_ok());
        assert!(pdf_to_word.set_file("letter.docx", vec![0; 4]).is_err());

        let mut word_to_pdf = session(Direction::WordToPdf);
        assert!(word_to_pdf.set_file("letter.docx", vec![0; 4]).is_ok());
        assert!(word_to_pdf.set_file("report.pdf", vec![0; 4]).is_err());
    }

    #[test]
    fn test_set_file_replaces_slot() {
        let mut s = session(Direction::PdfToWord);
        let first = s.set_file("one.pdf", vec![0; 4]).unwrap();
        let second = s.set_file("two.pdf", vec![0; 4]).unwrap();
        assert_ne!(first, second);
        assert_eq!(s.record().unwrap().name, "two.pdf");
    }

    #[test]
    fn test_output_name_substitutes_extension() {
        let mut s = session(Direction::PdfToWord);
        s.set_file("contract.pdf", vec![0; 4]).unwrap();
        assert_eq!(s.output_name().as_deref(), Some("contract.docx"));

        let mut s = session(Direction::WordToPdf);
        s.set_file("contract.docx", vec![0; 4]).unwrap();
        assert_eq!(s.output_name().as_deref(), Some("contract.pdf"));
    }

    #[tokio::test]
    async fn test_convert_with_empty_slot_is_none() {
        let mut s = session(Direction::PdfToWord);
        assert!(s.convert().await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_settles_error() {
        // Port 9 (discard) refuses connections; the record must settle as
        // Error with a stored message rather than staying Processing.
        let mut s = session(Direction::PdfToWord);
        s.set_file("report.pdf", b"%PDF-1.7 fake".to_vec()).unwrap();

        let status = s.convert().await;

        assert_eq!(status, Some(RecordStatus::Error));
        assert!(s.record().unwrap().error().is_some());
    }

    #[tokio::test]
    async fn test_settled_slot_is_not_reconverted() {
        let mut s = session(Direction::PdfToWord);
        s.set_file("report.pdf", b"%PDF-1.7 fake".to_vec()).unwrap();

        assert_eq!(s.convert().await, Some(RecordStatus::Error));
        // Second call reports the terminal status without a new request.
        assert_eq!(s.convert().await, Some(RecordStatus::Error));
    }
}
