#![forbid(unsafe_code)]

pub mod card_service;
pub mod deck_service;
pub mod error;
pub mod import_export;
pub mod search;
pub mod sessions;
pub mod stats_service;
pub mod workflow;

pub use recall_core::Clock;

pub use error::{CardServiceError, DeckServiceError, ImportError, SessionError, WorkflowError};
pub use sessions::{ReviewSession, SessionBuilder, SessionCard, resume_hint};
pub use workflow::{AppState, StudyWorkflow};
