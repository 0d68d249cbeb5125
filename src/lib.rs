//! PyME Risk Console
//!
//! Conversational credit-risk analysis for small businesses:
//! - Classifies input as a tax id (RUC) or a company name
//! - Drives the analysis backend through a fixed degradation ladder
//! - Keeps an append-only transcript per session
//! - Projects the latest analysis into dashboard panel state
//!
//! FLOW:
//! INPUT → CLASSIFY → SEARCH? → ANALYSE → (DEMO LISTING) → TRANSCRIPT / PANEL

pub mod api;
pub mod classifier;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fallback;
pub mod formatter;
pub mod gateway;
pub mod models;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{AnalysisTarget, ClassifiedInput, InputClassifier, QuickAction, Submission};
pub use config::ConsoleConfig;
pub use fallback::{FallbackPolicy, LadderOutcome, LadderOutcomeKind};
pub use gateway::{AnalysisGateway, HttpAnalysisGateway};
pub use orchestrator::{AnalysisOrchestrator, RejectReason, SessionSnapshot, SubmitOutcome};
