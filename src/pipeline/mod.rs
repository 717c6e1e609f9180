//! Application intake pipeline.
//!
//! Each discovered message flows through:
//! 1. `Mailbox::read()` / `fetch_attachment()`: mailbox I/O
//! 2. `DocumentExtractor::extract()`: PDF bytes to plain text
//! 3. `Reasoner::classify()`: is this a resume? (acceptance policy)
//! 4. `Reasoner::extract_candidate()`: structured record (accepted only)
//! 5. `SinkRouter`: append to the accepted or rejected sheet
//!
//! Failures are isolated per message; only a discovery failure ends a pass.

pub mod intake;
pub mod types;

pub use intake::{IntakePipeline, IntakeTask};
pub use types::{
    AttachmentRef, CandidateRecord, Classification, Confidence, ExtractedDocument,
    InboundMessage, PassSummary,
};
