//! Workflow state, outcomes, and errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::remote::RemoteError;
use crate::session::ChatEntry;

/// The two user-triggered workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Ask,
    AddSource,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workflow::Ask => f.write_str("ask"),
            Workflow::AddSource => f.write_str("add-source"),
        }
    }
}

/// Where the controller is between submissions.
///
/// A workflow settles inside its own call; the settled result is the value
/// the call returns, after which the phase is back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting(Workflow),
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Submitting(_))
    }
}

/// How an ask workflow settled.
#[derive(Debug)]
pub enum AskOutcome {
    /// The bot answered; the entry is now part of the transcript.
    Answered(ChatEntry),
    /// The request failed. Nothing was persisted and the view must reload
    /// the session.
    ReloadRequired(RemoteError),
}

impl AskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AskOutcome::Answered(_))
    }
}

/// How an add-source workflow settled. Either way the outcome is already
/// recorded in the transcript.
#[derive(Debug)]
pub enum IngestOutcome {
    Added,
    Failed(RemoteError),
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestOutcome::Added)
    }
}

/// A submission rejected before any remote call or transcript change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("Source locator cannot be empty")]
    EmptyLocator,

    #[error("Busy: {0} workflow still submitting")]
    Busy(Workflow),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_busy_only_while_submitting() {
        assert!(!Phase::Idle.is_busy());
        assert!(Phase::Submitting(Workflow::Ask).is_busy());
        assert!(Phase::Submitting(Workflow::AddSource).is_busy());
    }

    #[test]
    fn busy_error_names_active_workflow() {
        let err = ControllerError::Busy(Workflow::AddSource);
        assert_eq!(err.to_string(), "Busy: add-source workflow still submitting");
    }
}
