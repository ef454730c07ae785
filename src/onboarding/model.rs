//! Identity and outcome models, plus the reply validators for each step.

use serde::{Deserialize, Serialize};

use crate::candidates::Title;

/// Where the title goes relative to the chosen name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePosition {
    Before,
    After,
}

impl std::fmt::Display for TitlePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// A completed identity: title, chosen name, and their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub title: Title,
    pub name: String,
    pub position: TitlePosition,
}

impl Identity {
    /// The label shown for the member.
    pub fn label(&self) -> String {
        match self.position {
            TitlePosition::Before => format!("{} {}", self.title, self.name),
            TitlePosition::After => format!("{}, {}", self.name, self.title),
        }
    }
}

/// What the applier should commit for a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The dialogue finished and a title was reserved.
    Assigned(Identity),
    /// The member stopped answering; no title was consumed.
    Fallback { label: String },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Assigned(_) => OutcomeKind::Assigned,
            Self::Fallback { .. } => OutcomeKind::Fallback,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Assigned(identity) => identity.label(),
            Self::Fallback { label } => label.clone(),
        }
    }
}

/// Outcome discriminant, as recorded in the title log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Assigned,
    Fallback,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Label given to a member who timed out.
pub fn fallback_label(prefix: &str, member_name: &str) -> String {
    format!("{prefix} {member_name}")
}

// ── Reply validators ────────────────────────────────────────────────

/// Parse a 1-based title choice. Returns the 0-based index when the reply is
/// a plain integer within `1..=count`.
pub fn parse_choice(content: &str, count: usize) -> Option<usize> {
    let content = content.trim();
    if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: usize = content.parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// Accept a display name whose trimmed length is at most `max_len` characters.
pub fn parse_name(content: &str, max_len: usize) -> Option<String> {
    let name = content.trim();
    (name.chars().count() <= max_len).then(|| name.to_string())
}

/// Accept `before` or `after`, case-insensitively.
pub fn parse_position(content: &str) -> Option<TitlePosition> {
    match content.trim().to_lowercase().as_str() {
        "before" => Some(TitlePosition::Before),
        "after" => Some(TitlePosition::After),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(position: TitlePosition) -> Identity {
        Identity {
            title: Title::from("Frost Hawk"),
            name: "Thorne".into(),
            position,
        }
    }

    #[test]
    fn label_before_and_after() {
        assert_eq!(identity(TitlePosition::Before).label(), "Frost Hawk Thorne");
        assert_eq!(identity(TitlePosition::After).label(), "Thorne, Frost Hawk");
    }

    #[test]
    fn outcome_kind_and_label() {
        let assigned = Outcome::Assigned(identity(TitlePosition::Before));
        assert_eq!(assigned.kind(), OutcomeKind::Assigned);
        assert_eq!(assigned.label(), "Frost Hawk Thorne");

        let fallback = Outcome::Fallback {
            label: fallback_label("Unrenowned", "thorne"),
        };
        assert_eq!(fallback.kind(), OutcomeKind::Fallback);
        assert_eq!(fallback.label(), "Unrenowned thorne");
    }

    #[test]
    fn choice_accepts_range() {
        assert_eq!(parse_choice("1", 5), Some(0));
        assert_eq!(parse_choice("5", 5), Some(4));
        assert_eq!(parse_choice(" 2 ", 5), Some(1));
    }

    #[test]
    fn choice_rejects_out_of_range_and_non_digits() {
        assert_eq!(parse_choice("0", 5), None);
        assert_eq!(parse_choice("7", 5), None);
        assert_eq!(parse_choice("abc", 5), None);
        assert_eq!(parse_choice("-1", 5), None);
        assert_eq!(parse_choice("+2", 5), None);
        assert_eq!(parse_choice("2.0", 5), None);
        assert_eq!(parse_choice("", 5), None);
        assert_eq!(parse_choice("99999999999999999999999", 5), None);
    }

    #[test]
    fn name_length_limit_counts_chars() {
        assert_eq!(parse_name("  Thorne  ", 32).as_deref(), Some("Thorne"));
        assert_eq!(parse_name(&"a".repeat(32), 32).map(|n| n.len()), Some(32));
        assert_eq!(parse_name(&"a".repeat(33), 32), None);
        assert_eq!(parse_name(&"é".repeat(32), 32).map(|n| n.chars().count()), Some(32));
    }

    #[test]
    fn position_is_case_insensitive() {
        assert_eq!(parse_position("before"), Some(TitlePosition::Before));
        assert_eq!(parse_position("AFTER"), Some(TitlePosition::After));
        assert_eq!(parse_position(" Before "), Some(TitlePosition::Before));
        assert_eq!(parse_position("first"), None);
    }
}
