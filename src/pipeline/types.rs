//! Shared types for the intake pipeline.

use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// One application email, as read from the mailbox.
///
/// Read-only to the pipeline; lives only for the duration of one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Mailbox-native message ID.
    pub id: String,
    /// Sender address (From header).
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Attachments in message order.
    pub attachments: Vec<AttachmentRef>,
}

/// Reference to one attachment, resolved to bytes on demand and never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    /// Opaque mailbox attachment handle.
    pub handle: String,
}

// ── Extracted document ──────────────────────────────────────────────

/// Plain text derived from one attachment, or a tagged failure.
///
/// Extraction never errors past this boundary; callers route
/// `Unreadable` to the rejection log instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedDocument {
    /// Whitespace-normalized full text, all pages concatenated.
    Text(String),
    /// The bytes were not a readable document; carries a human-readable reason.
    Unreadable(String),
}

// ── Classification ──────────────────────────────────────────────────

/// Classifier confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Result of the is-this-a-resume check. Produced once per document;
/// drives the accept/reject branch and is never re-derived within a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub is_resume: bool,
    pub confidence: Confidence,
    /// Free-text label: resume, cover_letter, portfolio, invoice, other, junk.
    pub document_type: String,
    /// One-sentence rationale.
    pub reason: String,
}

impl Classification {
    /// Acceptance policy: a document proceeds to structured extraction
    /// only if it is a resume AND confidence is not low.
    pub fn accepts(&self) -> bool {
        self.is_resume && self.confidence != Confidence::Low
    }

    /// Conservative reject used when the classifier itself fails;
    /// classification failure must never crash the pipeline.
    pub fn safe_reject(reason: impl Into<String>) -> Self {
        Self {
            is_resume: false,
            confidence: Confidence::Low,
            document_type: "unknown".to_string(),
            reason: reason.into(),
        }
    }
}

// ── Candidate record ────────────────────────────────────────────────

/// Structured candidate data extracted from a validated resume.
///
/// Only ever constructed for documents that passed the acceptance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Full name, or "N/A".
    #[serde(default = "not_found")]
    pub name: String,
    /// Email address, or "N/A".
    #[serde(default = "not_found")]
    pub email: String,
    /// Phone number as a string, or "N/A".
    #[serde(default = "not_found")]
    pub phone: String,
    /// Top technical skills, at most 5.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Total experience descriptor, e.g. "2 years", "Fresher".
    #[serde(default = "default_experience")]
    pub experience: String,
    /// Always "New" for freshly produced records.
    #[serde(default = "default_status")]
    pub status: String,
    /// Concise 2-sentence profile summary.
    #[serde(default)]
    pub summary: String,
    /// 3 to 5 interview questions targeting candidate weaknesses.
    #[serde(default)]
    pub questions: Vec<String>,
}

fn not_found() -> String {
    "N/A".to_string()
}

fn default_experience() -> String {
    "0 years".to_string()
}

fn default_status() -> String {
    "New".to_string()
}

impl CandidateRecord {
    /// Enforce the schema defaults regardless of what the LLM returned:
    /// "N/A" for blank contact fields, "0 years" experience, skills
    /// capped at 5 entries, status always "New".
    pub fn normalized(mut self) -> Self {
        for field in [&mut self.name, &mut self.email, &mut self.phone] {
            if field.trim().is_empty() {
                *field = not_found();
            }
        }
        if self.experience.trim().is_empty() {
            self.experience = default_experience();
        }
        self.skills.retain(|s| !s.trim().is_empty());
        self.skills.truncate(5);
        self.questions.truncate(5);
        self.status = default_status();
        self
    }

    /// Serialize to a sheet row: skills comma-joined, questions joined
    /// with "; ". Field order matches the accepted-candidates header.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.skills.join(", "),
            self.experience.clone(),
            self.status.clone(),
            self.summary.clone(),
            self.questions.join("; "),
        ]
    }
}

// ── Pass summary ────────────────────────────────────────────────────

/// Tally for one pipeline pass, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Messages discovered by the search.
    pub discovered: usize,
    /// Candidate records written to the accepted sink.
    pub accepted: usize,
    /// Rejection rows written (non-resume, low confidence, unreadable).
    pub rejected: usize,
    /// Messages that failed mid-processing and were skipped.
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CandidateRecord {
        CandidateRecord {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+1-555-0100".into(),
            skills: vec!["Python".into(), "SQL".into(), "Go".into()],
            experience: "2 years".into(),
            status: "New".into(),
            summary: "Backend developer. Strong data background.".into(),
            questions: vec!["Q1?".into(), "Q2?".into(), "Q3?".into()],
        }
    }

    #[test]
    fn acceptance_policy_gates_on_flag_and_confidence() {
        let accept = Classification {
            is_resume: true,
            confidence: Confidence::Medium,
            document_type: "resume".into(),
            reason: "looks like a CV".into(),
        };
        assert!(accept.accepts());

        let low = Classification {
            confidence: Confidence::Low,
            ..accept.clone()
        };
        assert!(!low.accepts());

        let not_resume = Classification {
            is_resume: false,
            confidence: Confidence::High,
            ..accept
        };
        assert!(!not_resume.accepts());
    }

    #[test]
    fn safe_reject_is_never_accepted() {
        let c = Classification::safe_reject("classifier timed out");
        assert!(!c.accepts());
        assert_eq!(c.document_type, "unknown");
    }

    #[test]
    fn confidence_deserializes_lowercase() {
        let c: Confidence = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(c, Confidence::Medium);
    }

    #[test]
    fn skills_round_trip_to_row() {
        let row = record().to_row();
        assert_eq!(row[3], "Python, SQL, Go");
        assert_eq!(row.len(), 8);
    }

    #[test]
    fn normalized_fills_missing_contact_fields() {
        let mut r = record();
        r.name = "  ".into();
        r.email = String::new();
        r.experience = String::new();
        let r = r.normalized();
        assert_eq!(r.name, "N/A");
        assert_eq!(r.email, "N/A");
        assert_eq!(r.phone, "+1-555-0100");
        assert_eq!(r.experience, "0 years");
    }

    #[test]
    fn normalized_caps_skills_at_five() {
        let mut r = record();
        r.skills = (1..=8).map(|i| format!("skill{i}")).collect();
        assert_eq!(r.normalized().skills.len(), 5);
    }

    #[test]
    fn normalized_forces_status_new() {
        let mut r = record();
        r.status = "Old".into();
        assert_eq!(r.normalized().status, "New");
    }

    #[test]
    fn candidate_record_deserializes_with_defaults() {
        let r: CandidateRecord = serde_json::from_str(r#"{"name":"Bob"}"#).unwrap();
        assert_eq!(r.name, "Bob");
        assert_eq!(r.email, "N/A");
        assert_eq!(r.experience, "0 years");
        assert_eq!(r.status, "New");
        assert!(r.skills.is_empty());
    }
}
