//! Crowdsourcing status state machine.
//!
//! A record (or a single page, depending on the campaign's statistic mode)
//! moves `ANNOTATE -> REVIEW -> FINISHED`, with a back edge
//! `REVIEW -> ANNOTATE` when a reviewer rejects the submitted annotations.
//! The state machine is mode-agnostic: callers route it at whichever status
//! value (record-level or page-level) applies.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status of a crowdsourcing target (a whole record or one page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrowdsourcingStatus {
    /// Open for annotation. Initial state for any newly touched target.
    Annotate,
    /// Annotations submitted, waiting for review.
    Review,
    /// Review accepted. Terminal except for administrative reopening,
    /// which happens outside this engine.
    Finished,
}

/// All valid status strings, in lifecycle order.
const VALID_STATUS_STRINGS: &[&str] = &["ANNOTATE", "REVIEW", "FINISHED"];

impl CrowdsourcingStatus {
    /// Return the status as its wire/database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotate => "ANNOTATE",
            Self::Review => "REVIEW",
            Self::Finished => "FINISHED",
        }
    }

    /// Parse a status from its wire/database string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "ANNOTATE" => Ok(Self::Annotate),
            "REVIEW" => Ok(Self::Review),
            "FINISHED" => Ok(Self::Finished),
            _ => Err(CoreError::Validation(format!(
                "Invalid crowdsourcing status '{s}'. Must be one of: {}",
                VALID_STATUS_STRINGS.join(", ")
            ))),
        }
    }
}

/// Which attribution set the acting user is recorded in after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// The user submitted annotations (entered REVIEW from ANNOTATE).
    Annotator,
    /// The user acted as reviewer (left REVIEW in either direction).
    Reviewer,
}

/// Compute the attribution side effect of moving `current` to `requested`.
///
/// Returns `Ok(None)` for a same-state request (idempotent no-op, nothing
/// attributed), `Ok(Some(_))` for the three valid transitions, and
/// `InvalidTransition` for everything else. No undefined transition is ever
/// silently applied.
pub fn transition(
    current: CrowdsourcingStatus,
    requested: CrowdsourcingStatus,
) -> Result<Option<Attribution>, CoreError> {
    use CrowdsourcingStatus::{Annotate, Finished, Review};

    match (current, requested) {
        (a, b) if a == b => Ok(None),
        (Annotate, Review) => Ok(Some(Attribution::Annotator)),
        (Review, Finished) | (Review, Annotate) => Ok(Some(Attribution::Reviewer)),
        (from, to) => Err(CoreError::InvalidTransition(format!(
            "cannot move from {} to {}",
            from.as_str(),
            to.as_str()
        ))),
    }
}
