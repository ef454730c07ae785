//! OnboardingSession — one member's run through the title dialogue.
//!
//! The session is a single sequential task: generate candidates, offer them
//! privately, then collect the title choice, the display name, and the title
//! position, each within its own reply window. Running out of time at any
//! step hands a fallback identity to the applier.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::candidates::{CandidateSource, Title};
use crate::config::OnboardingConfig;
use crate::error::SessionError;
use crate::gateway::{ChannelRef, Gateway, IncomingMessage, Member};
use crate::registry::TitleRegistry;

use super::applier::IdentityApplier;
use super::inbox::{Inbox, Wait};
use super::model::{
    Identity, Outcome, TitlePosition, fallback_label, parse_choice, parse_name, parse_position,
};
use super::prompts;
use super::state::SessionPhase;

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionDeps {
    pub gateway: Arc<dyn Gateway>,
    pub registry: Arc<TitleRegistry>,
    pub candidates: Arc<dyn CandidateSource>,
    pub applier: Arc<IdentityApplier>,
    pub config: Arc<OnboardingConfig>,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    Completed(Identity),
    TimedOut {
        /// Phase the member stopped answering in.
        during: SessionPhase,
        label: String,
    },
    Failed(SessionError),
    Cancelled,
}

pub struct OnboardingSession {
    id: Uuid,
    member: Member,
    phase: SessionPhase,
    candidates: Vec<Title>,
}

impl OnboardingSession {
    pub fn new(member: Member) -> Self {
        Self {
            id: Uuid::new_v4(),
            member,
            phase: SessionPhase::default(),
            candidates: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Titles offered to the member, once generated.
    pub fn candidates(&self) -> &[Title] {
        &self.candidates
    }

    /// Drive the dialogue to a terminal phase.
    pub async fn run(mut self, deps: &SessionDeps, mut inbox: Inbox) -> SessionEnd {
        info!(
            session_id = %self.id,
            member_id = %self.member.id,
            member = %self.member.name,
            "Onboarding session started"
        );
        let end = self.drive(deps, &mut inbox).await;
        match &end {
            SessionEnd::Completed(identity) => info!(
                session_id = %self.id,
                member_id = %self.member.id,
                title = %identity.title,
                label = %identity.label(),
                "Onboarding session completed"
            ),
            SessionEnd::TimedOut { during, label } => info!(
                session_id = %self.id,
                member_id = %self.member.id,
                phase = %during,
                label = %label,
                "Onboarding session timed out"
            ),
            SessionEnd::Failed(e) => warn!(
                session_id = %self.id,
                member_id = %self.member.id,
                error = %e,
                "Onboarding session failed"
            ),
            SessionEnd::Cancelled => info!(
                session_id = %self.id,
                member_id = %self.member.id,
                "Onboarding session cancelled"
            ),
        }
        end
    }

    async fn drive(&mut self, deps: &SessionDeps, inbox: &mut Inbox) -> SessionEnd {
        // Generating
        self.candidates = match deps.candidates.candidates(&deps.registry).await {
            Ok(candidates) => candidates,
            Err(e) => return self.fail(deps, None, e.into()).await,
        };

        self.enter(SessionPhase::Offering);
        let channel = match deps.gateway.open_private(&self.member).await {
            Ok(channel) => channel,
            Err(e) => return self.fail(deps, None, e.into()).await,
        };
        let offer = prompts::offer(&deps.config.community_name, &self.member, &self.candidates);
        inbox.discard_pending();
        if let Err(e) = deps.gateway.send(&channel, &offer).await {
            return self.fail(deps, Some(&channel), e.into()).await;
        }

        // Title choice
        self.enter(SessionPhase::AwaitingTitleChoice);
        let count = self.candidates.len();
        let index = match self
            .await_reply(deps, inbox, &channel, |c| parse_choice(c, count))
            .await
        {
            Wait::Reply(index) => index,
            Wait::TimedOut => return self.time_out(deps).await,
            Wait::Closed => return self.cancel(),
        };
        let title = self.candidates[index].clone();
        if let Err(e) = deps.registry.reserve(title.as_str()).await {
            return self.fail(deps, Some(&channel), e.into()).await;
        }
        debug!(session_id = %self.id, title = %title, "Title chosen and reserved");

        // Name
        self.enter(SessionPhase::AwaitingName);
        self.prompt(deps, inbox, &channel, prompts::NAME_PROMPT).await;
        let max_len = deps.config.max_name_len;
        let name = match self
            .await_reply(deps, inbox, &channel, |c| parse_name(c, max_len))
            .await
        {
            Wait::Reply(name) => name,
            Wait::TimedOut => return self.time_out(deps).await,
            Wait::Closed => return self.cancel(),
        };

        // Position
        self.enter(SessionPhase::AwaitingPosition);
        self.prompt(deps, inbox, &channel, prompts::POSITION_PROMPT).await;
        let position: TitlePosition = match self
            .await_reply(deps, inbox, &channel, parse_position)
            .await
        {
            Wait::Reply(position) => position,
            Wait::TimedOut => return self.time_out(deps).await,
            Wait::Closed => return self.cancel(),
        };

        self.enter(SessionPhase::Completed);
        let identity = Identity {
            title,
            name,
            position,
        };
        deps.applier
            .apply(&self.member, &Outcome::Assigned(identity.clone()))
            .await;
        SessionEnd::Completed(identity)
    }

    /// Wait one reply window for a message from this member, on this
    /// channel, that `parse` accepts.
    async fn await_reply<T, P>(
        &self,
        deps: &SessionDeps,
        inbox: &mut Inbox,
        channel: &ChannelRef,
        parse: P,
    ) -> Wait<T>
    where
        P: Fn(&str) -> Option<T>,
    {
        let deadline = Instant::now() + deps.config.reply_timeout;
        let member_id = self.member.id.as_str();
        let channel_id = channel.id.as_str();
        inbox
            .wait_for(deadline, |msg: &IncomingMessage| {
                if msg.author.id != member_id || msg.channel_id != channel_id {
                    return None;
                }
                parse(&msg.content)
            })
            .await
    }

    /// Open the next step: drop replies meant for earlier ones, then send the
    /// prompt. A lost prompt is not fatal: the member simply never answers and
    /// the step times out.
    async fn prompt(
        &self,
        deps: &SessionDeps,
        inbox: &mut Inbox,
        channel: &ChannelRef,
        text: &str,
    ) {
        let dropped = inbox.discard_pending();
        if dropped > 0 {
            debug!(
                session_id = %self.id,
                phase = %self.phase,
                dropped,
                "Dropped out-of-phase replies"
            );
        }
        if let Err(e) = deps.gateway.send(channel, text).await {
            warn!(
                session_id = %self.id,
                member_id = %self.member.id,
                phase = %self.phase,
                error = %e,
                "Failed to send prompt"
            );
        }
    }

    async fn time_out(&mut self, deps: &SessionDeps) -> SessionEnd {
        let during = self.phase;
        self.enter(SessionPhase::TimedOut);
        let label = fallback_label(&deps.config.fallback_prefix, &self.member.name);
        deps.applier
            .apply(
                &self.member,
                &Outcome::Fallback {
                    label: label.clone(),
                },
            )
            .await;
        SessionEnd::TimedOut { during, label }
    }

    /// End the session without an identity and tell the member why.
    async fn fail(
        &mut self,
        deps: &SessionDeps,
        channel: Option<&ChannelRef>,
        error: SessionError,
    ) -> SessionEnd {
        self.enter(SessionPhase::Failed);

        let notice = match &error {
            SessionError::Exhausted(_) => Some(prompts::GENERATION_FAILED),
            SessionError::ReservationConflict { .. } => Some(prompts::RESERVATION_FAILED),
            SessionError::Store(_) => Some(prompts::STORE_FAILED),
            SessionError::Delivery(_) => None,
        };
        if let Some(notice) = notice {
            let sent = match channel {
                Some(channel) => deps.gateway.send(channel, notice).await,
                None => match deps.gateway.open_private(&self.member).await {
                    Ok(channel) => deps.gateway.send(&channel, notice).await,
                    Err(e) => Err(e),
                },
            };
            if let Err(e) = sent {
                warn!(
                    session_id = %self.id,
                    member_id = %self.member.id,
                    error = %e,
                    "Failed to deliver failure notice"
                );
            }
        }

        SessionEnd::Failed(error)
    }

    fn cancel(&mut self) -> SessionEnd {
        self.enter(SessionPhase::Cancelled);
        SessionEnd::Cancelled
    }

    fn enter(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.phase,
            next
        );
        debug!(session_id = %self.id, from = %self.phase, to = %next, "Session phase");
        self.phase = next;
    }
}
