//! Session state machine — tracks which step of the dialogue a member is in.

use serde::{Deserialize, Serialize};

/// The phases of one onboarding session.
///
/// Happy path: Generating → Offering → AwaitingTitleChoice → AwaitingName →
/// AwaitingPosition → Completed. Each awaiting phase may end in TimedOut or
/// Cancelled instead; Generating, Offering and AwaitingTitleChoice may end in
/// Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Generating,
    Offering,
    AwaitingTitleChoice,
    AwaitingName,
    AwaitingPosition,
    Completed,
    TimedOut,
    Failed,
    Cancelled,
}

impl SessionPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Generating, Offering)
                | (Generating, Failed)
                | (Offering, AwaitingTitleChoice)
                | (Offering, Failed)
                | (AwaitingTitleChoice, AwaitingName)
                | (AwaitingTitleChoice, Failed)
                | (AwaitingName, AwaitingPosition)
                | (AwaitingPosition, Completed)
                | (AwaitingTitleChoice | AwaitingName | AwaitingPosition, TimedOut)
                | (AwaitingTitleChoice | AwaitingName | AwaitingPosition, Cancelled)
        )
    }

    /// Whether this phase ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::TimedOut | Self::Failed | Self::Cancelled
        )
    }

    /// Whether the session is blocked on a member reply in this phase.
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            Self::AwaitingTitleChoice | Self::AwaitingName | Self::AwaitingPosition
        )
    }

    /// Next phase on the happy path, if any.
    pub fn next(&self) -> Option<SessionPhase> {
        use SessionPhase::*;
        match self {
            Generating => Some(Offering),
            Offering => Some(AwaitingTitleChoice),
            AwaitingTitleChoice => Some(AwaitingName),
            AwaitingName => Some(AwaitingPosition),
            AwaitingPosition => Some(Completed),
            Completed | TimedOut | Failed | Cancelled => None,
        }
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Generating
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Generating => "generating",
            Self::Offering => "offering",
            Self::AwaitingTitleChoice => "awaiting_title_choice",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingPosition => "awaiting_position",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}
