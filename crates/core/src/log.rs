//! Campaign log messages, scoped to (campaign, record) and independent of
//! the status/annotation flow.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum length of a log message's text.
pub const MAX_LOG_MESSAGE_LENGTH: usize = 4_000;

/// A persisted log entry on a campaign record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub id: DbId,
    pub campaign_id: DbId,
    pub pi: String,
    /// Opaque user reference; resolution is an external collaborator.
    pub creator: String,
    pub message: String,
    pub created_at: Timestamp,
}

/// Input for adding a log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLogMessage {
    pub campaign_id: DbId,
    pub pi: String,
    pub creator: String,
    pub message: String,
}

/// Validate a log message body: non-blank, bounded length.
pub fn validate_log_message(message: &str) -> Result<(), CoreError> {
    if message.trim().is_empty() {
        return Err(CoreError::Validation(
            "log message must not be empty".to_string(),
        ));
    }
    if message.len() > MAX_LOG_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "log message exceeds maximum length of {MAX_LOG_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_message_accepted() {
        assert!(validate_log_message("Rejected: page 3 is illegible").is_ok());
    }

    #[test]
    fn blank_message_rejected() {
        assert!(validate_log_message("").is_err());
        assert!(validate_log_message("   ").is_err());
    }

    #[test]
    fn oversized_message_rejected() {
        let msg = "x".repeat(MAX_LOG_MESSAGE_LENGTH + 1);
        assert!(validate_log_message(&msg).is_err());
    }
}
