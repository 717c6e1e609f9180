//! Resume intake agent: unattended triage of job-application email.

pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mailbox;
pub mod pipeline;
pub mod scheduler;
pub mod sheets;
pub mod sink;
