//! Shared stubs for the onboarding integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use renown::candidates::{CandidateSource, Title};
use renown::config::OnboardingConfig;
use renown::error::{GatewayError, GenerationError};
use renown::gateway::{ChannelRef, EventStream, Gateway, GatewayEvent, IncomingMessage, Member};
use renown::onboarding::{IdentityApplier, Inbox, OnboardingSession, SessionDeps, SessionEnd};
use renown::registry::TitleRegistry;

pub const CANDIDATES: [&str; 5] = ["Iron Wolf", "Frost Hawk", "Storm Bear", "Ash Fox", "Night Owl"];

/// Gateway that records everything sent through it.
pub struct StubGateway {
    channels: Vec<String>,
    moderators: HashSet<String>,
    members: Mutex<HashMap<String, Member>>,
    sent: Mutex<Vec<(String, String)>>,
    labels: Mutex<HashMap<String, String>>,
    pub fail_labels: bool,
    pub fail_private: bool,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::with_channels(&["title-log", "hall-of-names"])
    }

    pub fn with_channels(channels: &[&str]) -> Self {
        Self {
            channels: channels.iter().map(|c| c.to_string()).collect(),
            moderators: HashSet::new(),
            members: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            labels: Mutex::new(HashMap::new()),
            fail_labels: false,
            fail_private: false,
        }
    }

    pub fn with_moderator(mut self, member_id: &str) -> Self {
        self.moderators.insert(member_id.to_string());
        self
    }

    pub fn add_member(&self, member: &Member) {
        self.members
            .lock()
            .unwrap()
            .insert(member.id.clone(), member.clone());
    }

    /// Messages sent to `channel_id`, in order.
    pub fn sent_to(&self, channel_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == channel_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn label_of(&self, member_id: &str) -> Option<String> {
        self.labels.lock().unwrap().get(member_id).cloned()
    }
}

pub fn private_channel(member: &Member) -> String {
    format!("dm:{}", member.id)
}

#[async_trait]
impl Gateway for StubGateway {
    fn name(&self) -> &str {
        "stub"
    }

    async fn start(&self) -> Result<EventStream, GatewayError> {
        Ok(Box::pin(stream::empty()))
    }

    async fn open_private(&self, member: &Member) -> Result<ChannelRef, GatewayError> {
        if self.fail_private {
            return Err(GatewayError::Forbidden {
                action: "open private channel".into(),
                reason: "member blocks private messages".into(),
            });
        }
        let id = private_channel(member);
        Ok(ChannelRef::new(id.clone(), id))
    }

    async fn send(&self, channel: &ChannelRef, text: &str) -> Result<(), GatewayError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.id.clone(), text.to_string()));
        Ok(())
    }

    async fn find_channel(&self, name: &str) -> Option<ChannelRef> {
        self.channels
            .iter()
            .find(|c| c.as_str() == name)
            .map(|c| ChannelRef::new(c.clone(), c.clone()))
    }

    async fn find_member(&self, reference: &str) -> Option<Member> {
        let key = reference.trim_start_matches("<@").trim_end_matches('>');
        self.members.lock().unwrap().get(key).cloned()
    }

    async fn set_display_label(&self, member: &Member, label: &str) -> Result<(), GatewayError> {
        if self.fail_labels {
            return Err(GatewayError::Forbidden {
                action: "change display label".into(),
                reason: "missing permission".into(),
            });
        }
        self.labels
            .lock()
            .unwrap()
            .insert(member.id.clone(), label.to_string());
        Ok(())
    }

    async fn has_role(&self, member: &Member, _role: &str) -> bool {
        self.moderators.contains(&member.id)
    }
}

/// Always offers the same titles, ignoring the registry.
pub struct FixedCandidates(pub Vec<Title>);

impl FixedCandidates {
    pub fn standard() -> Self {
        Self(CANDIDATES.iter().map(|t| Title::from(*t)).collect())
    }
}

#[async_trait]
impl CandidateSource for FixedCandidates {
    async fn candidates(&self, _registry: &TitleRegistry) -> Result<Vec<Title>, GenerationError> {
        Ok(self.0.clone())
    }
}

pub async fn deps(
    gateway: Arc<StubGateway>,
    candidates: Arc<dyn CandidateSource>,
    titles_path: &Path,
) -> SessionDeps {
    let config = OnboardingConfig {
        titles_path: titles_path.to_path_buf(),
        ..OnboardingConfig::default()
    };
    let gateway: Arc<dyn Gateway> = gateway;
    SessionDeps {
        applier: Arc::new(IdentityApplier::new(Arc::clone(&gateway), &config)),
        registry: Arc::new(TitleRegistry::load(titles_path).await.unwrap()),
        gateway,
        candidates,
        config: Arc::new(config),
    }
}

pub fn reply(member: &Member, content: &str) -> IncomingMessage {
    IncomingMessage::new(private_channel(member), member.clone(), content)
}

/// Poll `done` until it holds, yielding to the runtime in between. Panics
/// after five seconds of real time.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    let started = Instant::now();
    while !done() {
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "condition not reached in time"
        );
        tokio::task::yield_now().await;
    }
}

/// Wait until at least `count` messages have gone to `channel_id`.
pub async fn wait_for_sent(gateway: &StubGateway, channel_id: &str, count: usize) {
    wait_until(|| gateway.sent_to(channel_id).len() >= count).await;
}

/// Run a session for `member` on its own task.
pub fn spawn_session(
    deps: &SessionDeps,
    member: &Member,
) -> (mpsc::Sender<IncomingMessage>, JoinHandle<SessionEnd>) {
    let (tx, inbox) = Inbox::channel();
    let deps = deps.clone();
    let member = member.clone();
    let handle =
        tokio::spawn(async move { OnboardingSession::new(member).run(&deps, inbox).await });
    (tx, handle)
}

/// Answer the session's prompts in order: the n-th reply goes out once the
/// n-th private message (offer, then each prompt) has been sent.
pub async fn answer(
    gateway: &StubGateway,
    tx: &mpsc::Sender<IncomingMessage>,
    member: &Member,
    replies: &[&str],
) {
    let channel = private_channel(member);
    for (i, content) in replies.iter().enumerate() {
        wait_for_sent(gateway, &channel, i + 1).await;
        tx.send(reply(member, content)).await.unwrap();
    }
}

/// Event stream fed by the returned sender; ends when the sender drops.
pub fn event_feed() -> (mpsc::Sender<GatewayEvent>, EventStream) {
    let (tx, rx) = mpsc::channel(16);
    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    });
    (tx, Box::pin(events))
}
