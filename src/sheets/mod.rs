//! Tabular store port.
//!
//! Named, append-only sheets with a fixed header row. The production
//! adapter is the Google Sheets implementation in `google`; the
//! `SinkRouter` owns the create-on-first-write policy.

pub mod google;

pub use google::GoogleSheets;

use async_trait::async_trait;

use crate::error::SinkError;

/// Opaque store handle (spreadsheet ID for the Google adapter).
pub type SheetId = String;

/// Minimal operation set over a named tabular store.
#[async_trait]
pub trait SheetPort: Send + Sync {
    /// Look up a store by name. `None` if absent.
    async fn open(&self, name: &str) -> Result<Option<SheetId>, SinkError>;

    /// Create a new, empty store with the given name.
    async fn create(&self, name: &str) -> Result<SheetId, SinkError>;

    /// Append one row to the first worksheet of the store.
    async fn append_row(&self, sheet: &SheetId, row: &[String]) -> Result<(), SinkError>;

    /// Grant an identity access to the store.
    async fn share(&self, sheet: &SheetId, identity: &str, role: &str) -> Result<(), SinkError>;
}
