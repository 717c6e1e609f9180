//! Google Sheets adapter for the `SheetPort` trait.
//!
//! Name lookup goes through the Drive v3 files API (spreadsheets are
//! Drive files), creation and appends through the Sheets v4 API, and
//! share grants through Drive permissions.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::SinkError;
use crate::sheets::{SheetId, SheetPort};

const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Google Sheets tabular store.
pub struct GoogleSheets {
    client: reqwest::Client,
    token: SecretString,
    sheets_url: String,
    drive_url: String,
}

impl GoogleSheets {
    pub fn new(client: reqwest::Client, token: SecretString) -> Self {
        Self {
            client,
            token,
            sheets_url: DEFAULT_SHEETS_URL.to_string(),
            drive_url: DEFAULT_DRIVE_URL.to_string(),
        }
    }

    /// Point at different endpoints (tests).
    pub fn with_base_urls(
        mut self,
        sheets_url: impl Into<String>,
        drive_url: impl Into<String>,
    ) -> Self {
        self.sheets_url = sheets_url.into();
        self.drive_url = drive_url.into();
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(format!(
            "HTTP {status}: {}",
            body.chars().take(200).collect::<String>()
        ))
    }
}

#[async_trait]
impl SheetPort for GoogleSheets {
    async fn open(&self, name: &str) -> Result<Option<SheetId>, SinkError> {
        // Drive query syntax; single quotes in names are escaped.
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            name.replace('\'', "\\'")
        );

        let response = self
            .client
            .get(format!("{}/files", self.drive_url))
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let listing: FileList = Self::check(response)
            .await
            .map_err(|reason| SinkError::OpenFailed {
                name: name.to_string(),
                reason,
            })?
            .json()
            .await
            .map_err(|e| SinkError::OpenFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(listing.files.into_iter().next().map(|f| f.id))
    }

    async fn create(&self, name: &str) -> Result<SheetId, SinkError> {
        let response = self
            .client
            .post(&self.sheets_url)
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "properties": { "title": name } }))
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let created: CreatedSpreadsheet = Self::check(response)
            .await
            .map_err(|reason| SinkError::CreateFailed {
                name: name.to_string(),
                reason,
            })?
            .json()
            .await
            .map_err(|e| SinkError::CreateFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!(name, id = %created.spreadsheet_id, "Created spreadsheet");
        Ok(created.spreadsheet_id)
    }

    async fn append_row(&self, sheet: &SheetId, row: &[String]) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}/{}/values/A1:append", self.sheets_url, sheet))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        Self::check(response)
            .await
            .map_err(|reason| SinkError::AppendFailed {
                name: sheet.clone(),
                reason,
            })?;
        Ok(())
    }

    async fn share(&self, sheet: &SheetId, identity: &str, role: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}/files/{}/permissions", self.drive_url, sheet))
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({
                "type": "user",
                "role": role,
                "emailAddress": identity,
            }))
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        Self::check(response)
            .await
            .map_err(|reason| SinkError::ShareFailed {
                name: sheet.clone(),
                identity: identity.to_string(),
                reason,
            })?;
        Ok(())
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}
