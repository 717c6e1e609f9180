//! Sink routing: appends accepted and rejected records to their sheets,
//! creating a sheet with its header row (and optional share grant) on
//! first use.
//!
//! Writes are fire-and-forget from the pipeline's perspective, but write
//! errors propagate: a silently lost accepted-candidate row is worse than
//! failing that message.

use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::error::SinkError;
use crate::pipeline::types::CandidateRecord;
use crate::sheets::{SheetId, SheetPort};

/// Header row for the accepted-candidates sheet.
pub const ACCEPTED_HEADER: [&str; 8] = [
    "Name",
    "Email",
    "Phone",
    "Skills",
    "Experience",
    "Status",
    "Summary",
    "Questions",
];

/// Header row for the rejected-applications sheet.
pub const REJECTED_HEADER: [&str; 4] = ["Timestamp", "Sender", "DocumentType", "RejectionReason"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Routes records to the accepted or rejected sheet.
pub struct SinkRouter {
    port: Arc<dyn SheetPort>,
    accepted_sheet: String,
    rejected_sheet: String,
    /// Identity granted write access to newly created sheets.
    share_with: Option<String>,
}

impl SinkRouter {
    pub fn new(
        port: Arc<dyn SheetPort>,
        accepted_sheet: impl Into<String>,
        rejected_sheet: impl Into<String>,
        share_with: Option<String>,
    ) -> Self {
        Self {
            port,
            accepted_sheet: accepted_sheet.into(),
            rejected_sheet: rejected_sheet.into(),
            share_with,
        }
    }

    /// Append one row to the accepted-candidates sheet.
    pub async fn record_candidate(&self, record: &CandidateRecord) -> Result<(), SinkError> {
        let sheet = self
            .open_or_create(&self.accepted_sheet, &ACCEPTED_HEADER)
            .await?;
        self.port.append_row(&sheet, &record.to_row()).await?;
        info!(
            candidate = %record.name,
            sheet = %self.accepted_sheet,
            "Recorded accepted candidate"
        );
        Ok(())
    }

    /// Append one timestamped row to the rejected-applications sheet.
    pub async fn record_rejection(
        &self,
        sender: &str,
        document_type: &str,
        reason: &str,
    ) -> Result<(), SinkError> {
        let sheet = self
            .open_or_create(&self.rejected_sheet, &REJECTED_HEADER)
            .await?;
        let row = vec![
            Local::now().format(TIMESTAMP_FORMAT).to_string(),
            sender.to_string(),
            document_type.to_string(),
            reason.to_string(),
        ];
        self.port.append_row(&sheet, &row).await?;
        info!(
            sender,
            document_type,
            sheet = %self.rejected_sheet,
            "Logged rejected application"
        );
        Ok(())
    }

    /// Open the named sheet, creating it (header first, optional share
    /// grant) if absent.
    async fn open_or_create(&self, name: &str, header: &[&str]) -> Result<SheetId, SinkError> {
        if let Some(sheet) = self.port.open(name).await? {
            return Ok(sheet);
        }

        warn!(name, "Sheet not found, creating");
        let sheet = self.port.create(name).await?;

        if let Some(identity) = &self.share_with {
            self.port.share(&sheet, identity, "writer").await?;
        }

        let header_row: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        self.port.append_row(&sheet, &header_row).await?;
        Ok(sheet)
    }
}
