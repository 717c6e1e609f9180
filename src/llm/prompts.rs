//! Prompt construction and response parsing for the two reasoning calls.
//!
//! The model is asked to respond with ONLY a JSON object; parsing
//! tolerates markdown fencing and surrounding prose.

use serde::Deserialize;

use crate::error::LlmError;
use crate::pipeline::types::{CandidateRecord, Classification, Confidence};

/// Document prefix sent to the classifier (bounds token cost).
const CLASSIFY_DOC_CHARS: usize = 1000;

/// Message-body prefix sent as classifier context.
const CLASSIFY_CONTEXT_CHARS: usize = 500;

// ── Classification ──────────────────────────────────────────────────

pub fn build_classify_system_prompt() -> String {
    "You are a document classifier. Your job is to determine if a document is a RESUME/CV.\n\n\
     A RESUME typically contains:\n\
     - Personal information (name, contact)\n\
     - Work experience or education history\n\
     - Skills section\n\
     - Professional summary or objective\n\n\
     NOT a resume:\n\
     - Cover letters (focus on why applying, company-specific)\n\
     - Portfolios (collection of work samples, projects)\n\
     - Invoices, receipts, financial documents\n\
     - Company brochures or marketing materials\n\
     - Random PDFs, junk documents\n\n\
     Be strict: if it doesn't clearly look like a resume, mark is_resume false.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"is_resume\": true, \"confidence\": \"high|medium|low\", \
     \"document_type\": \"resume|cover_letter|portfolio|invoice|other|junk\", \
     \"reason\": \"one sentence\"}"
        .to_string()
}

pub fn build_classify_user_prompt(document: &str, context: &str) -> String {
    let doc_preview: String = document.chars().take(CLASSIFY_DOC_CHARS).collect();
    let context_preview: String = context.chars().take(CLASSIFY_CONTEXT_CHARS).collect();

    format!(
        "Classify this document:\n\n\
         === EMAIL CONTEXT ===\n{context_preview}\n\n\
         === DOCUMENT TEXT (first {CLASSIFY_DOC_CHARS} chars) ===\n{doc_preview}\n\n\
         Is this a resume/CV?"
    )
}

/// Classifier response structure.
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    is_resume: bool,
    confidence: String,
    #[serde(default)]
    document_type: String,
    #[serde(default)]
    reason: String,
}

/// Parse the classifier response into a `Classification`.
pub fn parse_classify_response(raw: &str) -> Result<Classification, LlmError> {
    let json_str = extract_json_object(raw);
    let response: ClassifyResponse = serde_json::from_str(&json_str)?;

    let confidence = match response.confidence.to_lowercase().as_str() {
        "high" => Confidence::High,
        "medium" => Confidence::Medium,
        "low" => Confidence::Low,
        other => {
            return Err(LlmError::InvalidResponse(format!(
                "unknown confidence level: '{other}'"
            )));
        }
    };

    Ok(Classification {
        is_resume: response.is_resume,
        confidence,
        document_type: if response.document_type.is_empty() {
            "unknown".into()
        } else {
            response.document_type
        },
        reason: response.reason,
    })
}

// ── Candidate extraction ────────────────────────────────────────────

pub fn build_extract_system_prompt() -> String {
    "You are an expert resume parser for a hiring agency. \
     Extract structured candidate data from their email and resume.\n\n\
     RULES:\n\
     1. Prioritize information found in the RESUME. Use EMAIL content as backup.\n\
     2. If a field is missing, use its default: \"N/A\" for name/email/phone, \"0 years\" for experience.\n\
     3. For skills, extract the top 5 most relevant technical skills.\n\
     4. Always set status to \"New\".\n\
     5. Write a concise 2-sentence summary of the candidate's profile.\n\
     6. Write 3 to 5 interview questions targeting the candidate's weaknesses, \
     for the recruiter to ask in the interview.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"name\": \"...\", \"email\": \"...\", \"phone\": \"...\", \
     \"skills\": [\"...\"], \"experience\": \"...\", \"status\": \"New\", \
     \"summary\": \"...\", \"questions\": [\"...\"]}"
        .to_string()
}

pub fn build_extract_user_prompt(document: &str, context: &str) -> String {
    format!(
        "Here is the candidate data:\n\n\
         === EMAIL BODY ===\n{context}\n\n\
         === RESUME TEXT ===\n{document}"
    )
}

/// Parse the extractor response into a normalized `CandidateRecord`.
pub fn parse_extract_response(raw: &str) -> Result<CandidateRecord, LlmError> {
    let json_str = extract_json_object(raw);
    let record: CandidateRecord = serde_json::from_str(&json_str)?;
    Ok(record.normalized())
}

// ── JSON extraction ─────────────────────────────────────────────────

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Prompt construction ─────────────────────────────────────────

    #[test]
    fn classify_system_prompt_names_criteria() {
        let prompt = build_classify_system_prompt();
        assert!(prompt.contains("RESUME"));
        assert!(prompt.contains("Cover letters"));
        assert!(prompt.contains("Invoices"));
        assert!(prompt.contains("is_resume"));
    }

    #[test]
    fn classify_user_prompt_truncates_document() {
        let long_doc = "x".repeat(5000);
        let prompt = build_classify_user_prompt(&long_doc, "short body");
        assert!(prompt.len() < 2000);
        assert!(prompt.contains("short body"));
    }

    #[test]
    fn classify_user_prompt_truncates_context() {
        let long_body = "y".repeat(3000);
        let prompt = build_classify_user_prompt("doc text", &long_body);
        assert!(!prompt.contains(&"y".repeat(501)));
    }

    #[test]
    fn extract_user_prompt_is_unbounded() {
        let long_doc = "z".repeat(5000);
        let prompt = build_extract_user_prompt(&long_doc, "body");
        assert!(prompt.contains(&long_doc));
    }

    // ── Classification parsing ──────────────────────────────────────

    #[test]
    fn parse_classify_plain_json() {
        let c = parse_classify_response(
            r#"{"is_resume": true, "confidence": "high", "document_type": "resume", "reason": "has skills and experience sections"}"#,
        )
        .unwrap();
        assert!(c.is_resume);
        assert_eq!(c.confidence, Confidence::High);
        assert_eq!(c.document_type, "resume");
    }

    #[test]
    fn parse_classify_markdown_wrapped() {
        let raw = "Sure, here's the classification:\n```json\n{\"is_resume\": false, \"confidence\": \"medium\", \"document_type\": \"cover_letter\", \"reason\": \"addresses a hiring manager\"}\n```";
        let c = parse_classify_response(raw).unwrap();
        assert!(!c.is_resume);
        assert_eq!(c.document_type, "cover_letter");
    }

    #[test]
    fn parse_classify_uppercase_confidence() {
        let c = parse_classify_response(
            r#"{"is_resume": true, "confidence": "HIGH", "document_type": "resume", "reason": "r"}"#,
        )
        .unwrap();
        assert_eq!(c.confidence, Confidence::High);
    }

    #[test]
    fn parse_classify_unknown_confidence_errors() {
        let err = parse_classify_response(
            r#"{"is_resume": true, "confidence": "certain", "document_type": "resume", "reason": "r"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_classify_missing_type_defaults_unknown() {
        let c = parse_classify_response(r#"{"is_resume": false, "confidence": "low"}"#).unwrap();
        assert_eq!(c.document_type, "unknown");
    }

    #[test]
    fn parse_classify_garbage_errors() {
        assert!(parse_classify_response("I can't classify this.").is_err());
    }

    // ── Candidate parsing ───────────────────────────────────────────

    #[test]
    fn parse_extract_full_record() {
        let raw = r#"{"name":"Jane Doe","email":"jane@example.com","phone":"+1-555-0100",
            "skills":["Python","SQL","Go"],"experience":"2 years","status":"New",
            "summary":"Backend developer. Strong data background.",
            "questions":["Q1?","Q2?","Q3?"]}"#;
        let r = parse_extract_response(raw).unwrap();
        assert_eq!(r.name, "Jane Doe");
        assert_eq!(r.skills, vec!["Python", "SQL", "Go"]);
        assert_eq!(r.status, "New");
    }

    #[test]
    fn parse_extract_applies_defaults_and_caps() {
        let raw = r#"{"name":"Bob","skills":["a","b","c","d","e","f","g"],"status":"Old"}"#;
        let r = parse_extract_response(raw).unwrap();
        assert_eq!(r.email, "N/A");
        assert_eq!(r.experience, "0 years");
        assert_eq!(r.skills.len(), 5);
        assert_eq!(r.status, "New");
    }

    #[test]
    fn parse_extract_prose_around_object() {
        let raw = "Here is the extracted data: {\"name\":\"Amy\"} — let me know if you need more.";
        let r = parse_extract_response(raw).unwrap();
        assert_eq!(r.name, "Amy");
    }
}
