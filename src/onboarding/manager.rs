//! OnboardingManager — owns the per-member session table and routes gateway
//! events to it.
//!
//! Each member has at most one live session. Triggering onboarding for a
//! member who already has one aborts the old session before the new one
//! starts, so two sessions never race to apply an identity to the same member.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::candidates::CandidateGenerator;
use crate::config::OnboardingConfig;
use crate::error::Result;
use crate::gateway::{ChannelRef, EventStream, Gateway, GatewayEvent, IncomingMessage, Member};
use crate::registry::TitleRegistry;
use crate::words::WordPool;

use super::applier::IdentityApplier;
use super::inbox::Inbox;
use super::prompts;
use super::session::{OnboardingSession, SessionDeps, SessionEnd};

/// Operator commands recognized on any channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restart onboarding for the referenced member.
    Retitle { target: Option<String> },
}

/// Parse `<prefix>retitle [member]`. Returns `None` for anything else.
pub fn parse_command(prefix: &str, content: &str) -> Option<Command> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    match parts.next()? {
        "retitle" => Some(Command::Retitle {
            target: parts.next().map(String::from),
        }),
        _ => None,
    }
}

struct ActiveSession {
    session_id: Uuid,
    inbox: mpsc::Sender<IncomingMessage>,
    abort: AbortHandle,
}

pub struct OnboardingManager {
    deps: SessionDeps,
    active: Mutex<HashMap<String, ActiveSession>>,
}

impl OnboardingManager {
    pub fn new(deps: SessionDeps) -> Arc<Self> {
        Arc::new(Self {
            deps,
            active: Mutex::new(HashMap::new()),
        })
    }

    /// Load the word pools and title store, start `gateway`, and return a
    /// manager along with the events it should consume.
    pub async fn launch(
        config: OnboardingConfig,
        gateway: Arc<dyn Gateway>,
    ) -> Result<(Arc<Self>, EventStream)> {
        let pool = Arc::new(WordPool::load(&config.modifiers_path, &config.nouns_path).await);
        if pool.is_empty() {
            warn!("A word pool is empty; every onboarding will fail until both lists exist");
        }
        let registry = Arc::new(TitleRegistry::load(&config.titles_path).await?);

        let candidates = Arc::new(CandidateGenerator::new(
            Arc::clone(&pool),
            config.candidate_count,
            config.max_attempts,
        ));
        let applier = Arc::new(IdentityApplier::new(Arc::clone(&gateway), &config));

        let events = gateway.start().await?;
        info!(
            gateway = gateway.name(),
            modifiers = pool.modifiers().len(),
            nouns = pool.nouns().len(),
            retired = registry.len().await,
            "Onboarding ready"
        );

        let deps = SessionDeps {
            gateway,
            registry,
            candidates,
            applier,
            config: Arc::new(config),
        };
        Ok((Self::new(deps), events))
    }

    /// Consume gateway events until the stream ends.
    pub async fn run(self: &Arc<Self>, mut events: EventStream) {
        while let Some(event) = events.next().await {
            match event {
                GatewayEvent::MemberJoined(member) => {
                    info!(member_id = %member.id, member = %member.name, "Member joined");
                    let _ = self.start(member).await;
                }
                GatewayEvent::Message(msg) => self.handle_message(msg).await,
            }
        }
        info!("Gateway event stream ended");
    }

    /// Start onboarding for `member`, replacing any session already running
    /// for them. Returns `None` when the log or redirect channel is missing.
    pub async fn start(self: &Arc<Self>, member: Member) -> Option<JoinHandle<SessionEnd>> {
        let config = &self.deps.config;
        let gateway = &self.deps.gateway;
        if gateway.find_channel(&config.log_channel).await.is_none()
            || gateway.find_channel(&config.redirect_channel).await.is_none()
        {
            warn!(
                member_id = %member.id,
                log_channel = %config.log_channel,
                redirect_channel = %config.redirect_channel,
                "Required channels missing; not starting onboarding"
            );
            return None;
        }

        let session = OnboardingSession::new(member.clone());
        let session_id = session.id();
        let (tx, inbox) = Inbox::channel();

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.remove(&member.id) {
            info!(
                member_id = %member.id,
                previous_session = %previous.session_id,
                "Replacing active onboarding session"
            );
            previous.abort.abort();
        }

        let manager = Arc::clone(self);
        let member_id = member.id.clone();
        let handle = tokio::spawn(async move {
            let end = session.run(&manager.deps, inbox).await;
            manager.finish(&member_id, session_id);
            end
        });

        active.insert(
            member.id,
            ActiveSession {
                session_id,
                inbox: tx,
                abort: handle.abort_handle(),
            },
        );
        Some(handle)
    }

    /// Whether `member_id` has a live session.
    pub fn is_active(&self, member_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(member_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Abort every live session.
    pub fn shutdown(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        for (member_id, session) in active.drain() {
            debug!(member_id = %member_id, session_id = %session.session_id, "Aborting session");
            session.abort.abort();
        }
    }

    async fn handle_message(self: &Arc<Self>, msg: IncomingMessage) {
        match parse_command(&self.deps.config.command_prefix, &msg.content) {
            Some(Command::Retitle { target }) => self.retitle(&msg, target.as_deref()).await,
            None => self.dispatch(msg),
        }
    }

    /// Hand a message to the author's session, if they have one.
    fn dispatch(&self, msg: IncomingMessage) {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let Some(session) = active.get(&msg.author.id) else {
            return;
        };
        match session.inbox.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => warn!(
                member_id = %msg.author.id,
                session_id = %session.session_id,
                "Session inbox full; dropping message"
            ),
            Err(TrySendError::Closed(_)) => {}
        }
    }

    async fn retitle(self: &Arc<Self>, msg: &IncomingMessage, target: Option<&str>) {
        let gateway = &self.deps.gateway;
        let config = &self.deps.config;
        let reply_to = ChannelRef::new(msg.channel_id.clone(), msg.channel_id.clone());

        let reply = if !gateway.has_role(&msg.author, &config.moderator_role).await {
            warn!(member_id = %msg.author.id, "Unauthorized retitle attempt");
            prompts::PERMISSION_DENIED.to_string()
        } else {
            match target {
                None => prompts::retitle_usage(&config.command_prefix),
                Some(reference) => match gateway.find_member(reference).await {
                    None => prompts::member_not_found(reference),
                    Some(member) => {
                        info!(
                            moderator = %msg.author.name,
                            member_id = %member.id,
                            "Manual retitle"
                        );
                        if let Err(e) = gateway.send(&reply_to, &prompts::retitling(&member)).await
                        {
                            warn!(error = %e, "Failed to acknowledge retitle");
                        }
                        let _ = self.start(member).await;
                        return;
                    }
                },
            }
        };

        if let Err(e) = gateway.send(&reply_to, &reply).await {
            warn!(error = %e, "Failed to reply to retitle command");
        }
    }

    fn finish(&self, member_id: &str, session_id: Uuid) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active
            .get(member_id)
            .is_some_and(|s| s.session_id == session_id)
        {
            active.remove(member_id);
        }
    }
}
