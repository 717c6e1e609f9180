//! LLM integration: the reasoning collaborator behind classification
//! and structured extraction.
//!
//! The pipeline only sees the `Reasoner` trait; the production
//! implementation talks to Groq's OpenAI-compatible chat-completions
//! endpoint (`GroqReasoner`). Both operations are allowed to fail;
//! callers treat any failure as a safe-reject, never a pipeline abort.

pub mod groq;
pub(crate) mod prompts;

pub use groq::GroqReasoner;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::pipeline::types::{CandidateRecord, Classification};

/// Capability interface for the reasoning collaborator.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Decide whether the document is a resume.
    ///
    /// `document` is the extracted attachment text, `context` the
    /// originating message body. Only bounded prefixes are sent to the
    /// model (first ~1000 / ~500 chars) to bound cost.
    async fn classify(&self, document: &str, context: &str) -> Result<Classification, LlmError>;

    /// Produce a structured candidate record from the full document text
    /// and full message body. Only invoked after the acceptance policy
    /// passed.
    async fn extract_candidate(
        &self,
        document: &str,
        context: &str,
    ) -> Result<CandidateRecord, LlmError>;
}
