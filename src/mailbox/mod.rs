//! Mailbox access port.
//!
//! The pipeline only depends on this trait; the production adapter is
//! the Gmail REST implementation in `gmail`. Pure I/O, no triage logic.

pub mod gmail;

pub use gmail::GmailMailbox;

use async_trait::async_trait;

use crate::error::MailboxError;
use crate::pipeline::types::InboundMessage;

/// Mailbox search/read/fetch operations.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Find message IDs matching a mailbox-native query
    /// (e.g. `subject:application has:attachment`).
    async fn search(&self, query: &str) -> Result<Vec<String>, MailboxError>;

    /// Read one message: sender, subject, body text, attachment refs.
    async fn read(&self, message_id: &str) -> Result<InboundMessage, MailboxError>;

    /// Resolve an attachment handle to raw bytes. Never cached.
    async fn fetch_attachment(
        &self,
        message_id: &str,
        handle: &str,
    ) -> Result<Vec<u8>, MailboxError>;
}
