//! Workflow status shared by sessions and rounds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Phase of the session/round workflow
///
/// Rounds move `AppSelection` → `Continue` → one of the round terminals
/// (`Finish`, `NeedsNewRound`, `Error`, `MaxStepReached`). `Complete` is only
/// ever set by the session when the user stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Waiting for the host agent to pick an application
    AppSelection,
    /// Waiting for the next app agent action
    Continue,
    /// Round finished its request
    Finish,
    /// Round gave up; a new request is needed
    NeedsNewRound,
    /// Session is over
    Complete,
    Error,
    MaxStepReached,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::AppSelection,
        Status::Continue,
        Status::Finish,
        Status::NeedsNewRound,
        Status::Complete,
        Status::Error,
        Status::MaxStepReached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::AppSelection => "APP_SELECTION",
            Status::Continue => "CONTINUE",
            Status::Finish => "FINISH",
            Status::NeedsNewRound => "NEEDS_NEW_ROUND",
            Status::Complete => "COMPLETE",
            Status::Error => "ERROR",
            Status::MaxStepReached => "MAX_STEP_REACHED",
        }
    }

    /// No further phase can run in the round that reported this status
    pub fn is_round_terminal(&self) -> bool {
        matches!(
            self,
            Status::Finish | Status::NeedsNewRound | Status::Error | Status::MaxStepReached
        )
    }

    /// The whole session stops on this status
    pub fn is_session_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Error | Status::MaxStepReached)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert_eq!("continue".parse::<Status>().unwrap(), Status::Continue);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "SCREENSHOT".parse::<Status>().unwrap_err();
        assert!(matches!(err, Error::UnknownStatus(ref s) if s == "SCREENSHOT"));
    }

    #[test]
    fn test_terminal_sets() {
        assert!(!Status::AppSelection.is_round_terminal());
        assert!(!Status::Continue.is_round_terminal());
        assert!(Status::Finish.is_round_terminal());
        assert!(!Status::Finish.is_session_terminal());
        assert!(Status::Complete.is_session_terminal());
    }

    #[test]
    fn test_serde_name() {
        assert_eq!(serde_json::to_string(&Status::NeedsNewRound).unwrap(), "\"NEEDS_NEW_ROUND\"");
    }
}
