//! Gmail REST API v1 adapter for the `Mailbox` port.
//!
//! Three calls: `messages.list` (search), `messages.get` (read) and
//! `messages.attachments.get` (bytes). Bodies and attachments arrive
//! URL-safe base64 encoded; multipart messages are walked recursively
//! preferring the `text/plain` part.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::MailboxError;
use crate::mailbox::Mailbox;
use crate::pipeline::types::{AttachmentRef, InboundMessage};

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail mailbox adapter.
pub struct GmailMailbox {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl GmailMailbox {
    pub fn new(client: reqwest::Client, token: SecretString) -> Self {
        Self {
            client,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, MailboxError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailboxError::Http(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MailboxError::Http(e.to_string()))
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn search(&self, query: &str) -> Result<Vec<String>, MailboxError> {
        let listing: MessageList = self
            .get_json(format!("{}/messages", self.base_url), &[("q", query)])
            .await
            .map_err(|e| MailboxError::SearchFailed(e.to_string()))?;

        let ids: Vec<String> = listing.messages.into_iter().map(|m| m.id).collect();
        debug!(count = ids.len(), query, "Mailbox search complete");
        Ok(ids)
    }

    async fn read(&self, message_id: &str) -> Result<InboundMessage, MailboxError> {
        let message: Message = self
            .get_json(
                format!("{}/messages/{}", self.base_url, message_id),
                &[("format", "full")],
            )
            .await
            .map_err(|e| MailboxError::ReadFailed {
                id: message_id.to_string(),
                reason: e.to_string(),
            })?;

        let payload = message.payload.unwrap_or_default();
        let subject = header_value(&payload.headers, "Subject").unwrap_or("No Subject");
        let sender = header_value(&payload.headers, "From").unwrap_or("Unknown");

        Ok(InboundMessage {
            id: message_id.to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body_text(&payload).unwrap_or_default(),
            attachments: collect_attachments(&payload),
        })
    }

    async fn fetch_attachment(
        &self,
        message_id: &str,
        handle: &str,
    ) -> Result<Vec<u8>, MailboxError> {
        let body: AttachmentBody = self
            .get_json(
                format!(
                    "{}/messages/{}/attachments/{}",
                    self.base_url, message_id, handle
                ),
                &[],
            )
            .await
            .map_err(|e| MailboxError::AttachmentFetchFailed {
                id: message_id.to_string(),
                handle: handle.to_string(),
                reason: e.to_string(),
            })?;

        let data = body
            .data
            .ok_or_else(|| MailboxError::Decode("attachment has no data".into()))?;
        decode_base64url(&data)
    }
}

// ── Payload walking ─────────────────────────────────────────────────

fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Extract the plain-text body from a message payload.
///
/// Prefers inline body data, then recursively searches parts for the
/// first `text/plain` part.
fn body_text(payload: &MessagePart) -> Option<String> {
    if let Some(data) = payload.body.data.as_deref()
        && payload.filename.is_empty()
        && !payload.mime_type.starts_with("multipart/")
    {
        return decode_base64url(data)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    }

    // Prefer text/plain over HTML for simplicity.
    for part in &payload.parts {
        if part.mime_type == "text/plain"
            && let Some(data) = part.body.data.as_deref()
        {
            return decode_base64url(data)
                .ok()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    for part in &payload.parts {
        if let Some(text) = body_text(part) {
            return Some(text);
        }
    }

    None
}

/// Collect attachment refs: any part with a filename and an attachment ID.
fn collect_attachments(payload: &MessagePart) -> Vec<AttachmentRef> {
    let mut found = Vec::new();
    walk_attachments(payload, &mut found);
    found
}

fn walk_attachments(part: &MessagePart, found: &mut Vec<AttachmentRef>) {
    if !part.filename.is_empty()
        && let Some(handle) = part.body.attachment_id.as_deref()
    {
        found.push(AttachmentRef {
            filename: part.filename.clone(),
            handle: handle.to_string(),
        });
    }
    for child in &part.parts {
        walk_attachments(child, found);
    }
}

/// Gmail uses the URL-safe alphabet; padding varies by endpoint.
fn decode_base64url(data: &str) -> Result<Vec<u8>, MailboxError> {
    URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .map_err(|e| MailboxError::Decode(e.to_string()))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageId>,
}

#[derive(Debug, Deserialize)]
struct MessageId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: PartBody,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    attachment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentBody {
    #[serde(default)]
    data: Option<String>,
}
