//! Onboarding — the timed title dialogue run for each new member.
//!
//! A session offers freshly generated titles, collects the member's choice,
//! display name, and title position, then hands the result (or a fallback
//! label, on timeout) to the applier.

pub mod applier;
pub mod inbox;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod session;
pub mod state;

pub use applier::{ApplyReport, IdentityApplier, TitleLogRecord};
pub use inbox::{Inbox, Wait};
pub use manager::{Command, OnboardingManager, parse_command};
pub use model::{Identity, Outcome, OutcomeKind, TitlePosition};
pub use session::{OnboardingSession, SessionDeps, SessionEnd};
pub use state::SessionPhase;
