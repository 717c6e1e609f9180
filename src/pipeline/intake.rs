//! The intake pipeline: one pass over all discovered application emails.
//!
//! Per message: fetch → extract → classify → (structure | reject) → sink.
//! Failures are isolated per message; the batch continues. Only a failed
//! discovery (the search call) ends a pass early, and that surfaces to
//! the Scheduler as a retryable attempt failure.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::error::{Error, PipelineError};
use crate::extract::DocumentExtractor;
use crate::llm::Reasoner;
use crate::mailbox::Mailbox;
use crate::pipeline::types::{Classification, ExtractedDocument, InboundMessage, PassSummary};
use crate::sink::SinkRouter;

/// Fixed reason written for documents that fail the acceptance policy.
pub const REJECTION_REASON: &str = "Failed resume validation check";

/// Document-type label for attachments that could not be read at all.
pub const UNREADABLE_TYPE: &str = "unreadable";

/// Outcome of processing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOutcome {
    /// A candidate record was written to the accepted sheet.
    Accepted,
    /// A rejection row was written.
    Rejected,
    /// Nothing to process (no attachments).
    Skipped,
}

/// A unit of schedulable work, so the Scheduler can run against a test
/// double instead of the full pipeline.
#[async_trait]
pub trait IntakeTask: Send + Sync {
    async fn run_once(&self) -> Result<PassSummary, PipelineError>;
}

/// Drives one message at a time through extraction, classification,
/// structured extraction, and sink routing.
pub struct IntakePipeline {
    mailbox: Arc<dyn Mailbox>,
    extractor: Arc<dyn DocumentExtractor>,
    reasoner: Arc<dyn Reasoner>,
    sink: Arc<SinkRouter>,
    search_query: String,
}

impl IntakePipeline {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        extractor: Arc<dyn DocumentExtractor>,
        reasoner: Arc<dyn Reasoner>,
        sink: Arc<SinkRouter>,
        search_query: impl Into<String>,
    ) -> Self {
        Self {
            mailbox,
            extractor,
            reasoner,
            sink,
            search_query: search_query.into(),
        }
    }

    /// One full pass: discover matching messages and process each to
    /// completion independently.
    pub async fn run_once(&self) -> Result<PassSummary, PipelineError> {
        let ids = self
            .mailbox
            .search(&self.search_query)
            .await
            .map_err(PipelineError::Discovery)?;

        let mut summary = PassSummary {
            discovered: ids.len(),
            ..Default::default()
        };

        if ids.is_empty() {
            info!("No new application emails found");
            return Ok(summary);
        }

        info!(count = ids.len(), "Processing application emails");

        for id in &ids {
            let message = match self.mailbox.read(id).await {
                Ok(message) => message,
                Err(e) => {
                    error!(id, error = %e, "Failed to read message, skipping");
                    summary.failed += 1;
                    continue;
                }
            };

            match self.process_message(&message).await {
                Ok(MessageOutcome::Accepted) => summary.accepted += 1,
                Ok(MessageOutcome::Rejected) => summary.rejected += 1,
                Ok(MessageOutcome::Skipped) => summary.failed += 1,
                Err(e) => {
                    // Per-message boundary: log with enough context to
                    // diagnose, then continue with the next message.
                    error!(
                        id = %message.id,
                        sender = %message.sender,
                        error = %e,
                        "Error processing message"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            discovered = summary.discovered,
            accepted = summary.accepted,
            rejected = summary.rejected,
            failed = summary.failed,
            "Completed processing all emails in this batch"
        );
        Ok(summary)
    }

    /// Process one message: Fetched → Extracted → Classified →
    /// {Structured | Rejected} → Sunk.
    async fn process_message(&self, message: &InboundMessage) -> Result<MessageOutcome, Error> {
        info!(
            id = %message.id,
            sender = %message.sender,
            subject = %message.subject,
            "Processing email"
        );

        // Only the first attachment is examined.
        let Some(attachment) = message.attachments.first() else {
            warn!(id = %message.id, sender = %message.sender, "No attachments, skipping");
            return Ok(MessageOutcome::Skipped);
        };
        if message.attachments.len() > 1 {
            debug!(
                id = %message.id,
                ignored = message.attachments.len() - 1,
                "Multiple attachments; only the first is processed"
            );
        }

        let bytes = self
            .mailbox
            .fetch_attachment(&message.id, &attachment.handle)
            .await?;

        let text = match self.extractor.extract(&bytes) {
            ExtractedDocument::Text(text) => text,
            ExtractedDocument::Unreadable(reason) => {
                warn!(
                    id = %message.id,
                    filename = %attachment.filename,
                    reason,
                    "Attachment unreadable, logging rejection"
                );
                self.sink
                    .record_rejection(&message.sender, UNREADABLE_TYPE, &reason)
                    .await?;
                return Ok(MessageOutcome::Rejected);
            }
        };

        // Classifier failure is a safe-reject, never a pipeline abort.
        let classification = match self.reasoner.classify(&text, &message.body).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(id = %message.id, error = %e, "Classification failed, safe-rejecting");
                Classification::safe_reject(format!("Validation error: {e}"))
            }
        };

        info!(
            id = %message.id,
            is_resume = classification.is_resume,
            confidence = ?classification.confidence,
            document_type = %classification.document_type,
            "Classification result"
        );

        if !classification.accepts() {
            warn!(
                id = %message.id,
                sender = %message.sender,
                document_type = %classification.document_type,
                "Application rejected, not a valid resume"
            );
            self.sink
                .record_rejection(&message.sender, &classification.document_type, REJECTION_REASON)
                .await?;
            return Ok(MessageOutcome::Rejected);
        }

        let record = match self.reasoner.extract_candidate(&text, &message.body).await {
            Ok(record) => record.normalized(),
            Err(e) => {
                warn!(id = %message.id, error = %e, "Structured extraction failed, rejecting");
                self.sink
                    .record_rejection(
                        &message.sender,
                        &classification.document_type,
                        "Structured extraction failed",
                    )
                    .await?;
                return Ok(MessageOutcome::Rejected);
            }
        };

        self.sink.record_candidate(&record).await?;
        info!(
            id = %message.id,
            candidate = %record.name,
            sender = %message.sender,
            "Successfully processed application"
        );
        Ok(MessageOutcome::Accepted)
    }
}

#[async_trait]
impl IntakeTask for IntakePipeline {
    async fn run_once(&self) -> Result<PassSummary, PipelineError> {
        IntakePipeline::run_once(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{LlmError, MailboxError, SinkError};
    use crate::pipeline::types::{AttachmentRef, CandidateRecord, Confidence};
    use crate::sheets::{SheetId, SheetPort};

    // ── Test doubles ────────────────────────────────────────────────

    struct FakeMailbox {
        messages: Vec<InboundMessage>,
    }

    #[async_trait]
    impl Mailbox for FakeMailbox {
        async fn search(&self, _query: &str) -> Result<Vec<String>, MailboxError> {
            Ok(self.messages.iter().map(|m| m.id.clone()).collect())
        }

        async fn read(&self, message_id: &str) -> Result<InboundMessage, MailboxError> {
            self.messages
                .iter()
                .find(|m| m.id == message_id)
                .cloned()
                .ok_or_else(|| MailboxError::ReadFailed {
                    id: message_id.to_string(),
                    reason: "not found".into(),
                })
        }

        async fn fetch_attachment(
            &self,
            _message_id: &str,
            handle: &str,
        ) -> Result<Vec<u8>, MailboxError> {
            Ok(handle.as_bytes().to_vec())
        }
    }

    /// Extractor double: bytes are interpreted as UTF-8 text; the marker
    /// "BROKEN" simulates an unreadable PDF.
    struct FakeExtractor;

    impl DocumentExtractor for FakeExtractor {
        fn extract(&self, bytes: &[u8]) -> ExtractedDocument {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if text.contains("BROKEN") {
                ExtractedDocument::Unreadable("failed to parse PDF".into())
            } else {
                ExtractedDocument::Text(text)
            }
        }
    }

    /// Reasoner spy: classifies by keyword, counts extraction calls.
    struct SpyReasoner {
        classification: Classification,
        classify_fails: bool,
        extract_calls: AtomicUsize,
    }

    impl SpyReasoner {
        fn classifying(classification: Classification) -> Self {
            Self {
                classification,
                classify_fails: false,
                extract_calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                classification: Classification::safe_reject("unused"),
                classify_fails: true,
                extract_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Reasoner for SpyReasoner {
        async fn classify(
            &self,
            _document: &str,
            _context: &str,
        ) -> Result<Classification, LlmError> {
            if self.classify_fails {
                return Err(LlmError::RequestFailed("timeout".into()));
            }
            Ok(self.classification.clone())
        }

        async fn extract_candidate(
            &self,
            _document: &str,
            _context: &str,
        ) -> Result<CandidateRecord, LlmError> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CandidateRecord {
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                phone: "N/A".into(),
                skills: vec!["Python".into()],
                experience: "2 years".into(),
                status: "New".into(),
                summary: "S.".into(),
                questions: vec!["Q?".into()],
            })
        }
    }

    #[derive(Default)]
    struct MemorySheets {
        sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl SheetPort for MemorySheets {
        async fn open(&self, name: &str) -> Result<Option<SheetId>, SinkError> {
            Ok(self
                .sheets
                .lock()
                .unwrap()
                .contains_key(name)
                .then(|| name.to_string()))
        }

        async fn create(&self, name: &str) -> Result<SheetId, SinkError> {
            self.sheets
                .lock()
                .unwrap()
                .insert(name.to_string(), Vec::new());
            Ok(name.to_string())
        }

        async fn append_row(&self, sheet: &SheetId, row: &[String]) -> Result<(), SinkError> {
            self.sheets
                .lock()
                .unwrap()
                .get_mut(sheet)
                .unwrap()
                .push(row.to_vec());
            Ok(())
        }

        async fn share(&self, _: &SheetId, _: &str, _: &str) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn message(id: &str, attachment_text: &str) -> InboundMessage {
        InboundMessage {
            id: id.into(),
            sender: format!("{id}@example.com"),
            subject: "application".into(),
            body: "Please find my resume attached.".into(),
            attachments: vec![AttachmentRef {
                filename: "resume.pdf".into(),
                handle: attachment_text.into(),
            }],
        }
    }

    fn pipeline(
        messages: Vec<InboundMessage>,
        reasoner: Arc<SpyReasoner>,
        sheets: Arc<MemorySheets>,
    ) -> IntakePipeline {
        let sink = Arc::new(SinkRouter::new(
            Arc::clone(&sheets) as Arc<dyn SheetPort>,
            "candidates",
            "rejected_applications",
            None,
        ));
        IntakePipeline::new(
            Arc::new(FakeMailbox { messages }),
            Arc::new(FakeExtractor),
            reasoner,
            sink,
            "subject:application has:attachment",
        )
    }

    fn resume_classification(confidence: Confidence) -> Classification {
        Classification {
            is_resume: true,
            confidence,
            document_type: "resume".into(),
            reason: "contact info, experience and skills present".into(),
        }
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn non_resume_never_reaches_extractor() {
        let reasoner = Arc::new(SpyReasoner::classifying(Classification {
            is_resume: false,
            confidence: Confidence::High,
            document_type: "cover_letter".into(),
            reason: "addresses a hiring manager".into(),
        }));
        let sheets = Arc::new(MemorySheets::default());
        let pipeline = pipeline(
            vec![message("m1", "Dear Hiring Manager")],
            Arc::clone(&reasoner),
            Arc::clone(&sheets),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(reasoner.extract_calls.load(Ordering::SeqCst), 0);

        let stores = sheets.sheets.lock().unwrap();
        assert_eq!(stores["rejected_applications"].len(), 2); // header + row
        assert!(!stores.contains_key("candidates"));
    }

    #[tokio::test]
    async fn low_confidence_resume_is_rejected() {
        let reasoner = Arc::new(SpyReasoner::classifying(resume_classification(
            Confidence::Low,
        )));
        let sheets = Arc::new(MemorySheets::default());
        let pipeline = pipeline(
            vec![message("m1", "sparse resume text")],
            Arc::clone(&reasoner),
            Arc::clone(&sheets),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.accepted, 0);
        assert_eq!(reasoner.extract_calls.load(Ordering::SeqCst), 0);

        let stores = sheets.sheets.lock().unwrap();
        let rejection = &stores["rejected_applications"][1];
        assert_eq!(rejection[3], REJECTION_REASON);
    }

    #[tokio::test]
    async fn classifier_failure_is_a_safe_reject() {
        let reasoner = Arc::new(SpyReasoner::failing());
        let sheets = Arc::new(MemorySheets::default());
        let pipeline = pipeline(
            vec![message("m1", "resume text")],
            Arc::clone(&reasoner),
            Arc::clone(&sheets),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(reasoner.extract_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_resume_reaches_candidate_sheet() {
        let reasoner = Arc::new(SpyReasoner::classifying(resume_classification(
            Confidence::High,
        )));
        let sheets = Arc::new(MemorySheets::default());
        let pipeline = pipeline(
            vec![message("m1", "Jane Doe Experience Skills")],
            Arc::clone(&reasoner),
            Arc::clone(&sheets),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.accepted, 1);
        assert_eq!(reasoner.extract_calls.load(Ordering::SeqCst), 1);

        let stores = sheets.sheets.lock().unwrap();
        let row = &stores["candidates"][1];
        assert_eq!(row[0], "Jane Doe");
        assert_eq!(row[5], "New");
    }

    #[tokio::test]
    async fn unreadable_attachment_goes_to_rejection_sheet() {
        let reasoner = Arc::new(SpyReasoner::classifying(resume_classification(
            Confidence::High,
        )));
        let sheets = Arc::new(MemorySheets::default());
        let pipeline = pipeline(
            vec![message("m1", "BROKEN")],
            Arc::clone(&reasoner),
            Arc::clone(&sheets),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.rejected, 1);

        let stores = sheets.sheets.lock().unwrap();
        assert_eq!(stores["rejected_applications"][1][2], UNREADABLE_TYPE);
    }

    #[tokio::test]
    async fn message_without_attachments_is_skipped() {
        let reasoner = Arc::new(SpyReasoner::classifying(resume_classification(
            Confidence::High,
        )));
        let sheets = Arc::new(MemorySheets::default());
        let mut msg = message("m1", "text");
        msg.attachments.clear();
        let pipeline = pipeline(vec![msg], Arc::clone(&reasoner), Arc::clone(&sheets));

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.accepted + summary.rejected, 0);
        assert!(sheets.sheets.lock().unwrap().is_empty());
    }
}
