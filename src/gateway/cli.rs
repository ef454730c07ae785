//! CLI gateway — stdin/stdout stand-in for a chat platform, for local testing.
//!
//! Input lines:
//! - `join <name>`: a member joins
//! - `<name>: <text>`: `<name>` writes on their private channel
//! - `<name>@<channel>: <text>`: `<name>` writes on a named channel

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::GatewayError;
use crate::gateway::{ChannelRef, EventStream, Gateway, GatewayEvent, IncomingMessage, Member};

const PRIVATE_PREFIX: &str = "dm:";

type MemberTable = Arc<Mutex<HashMap<String, Member>>>;

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliInput {
    Join {
        name: String,
    },
    Say {
        author: String,
        channel: Option<String>,
        text: String,
    },
}

/// Parse one line of CLI input. Returns `None` for anything unrecognized.
pub fn parse_line(line: &str) -> Option<CliInput> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix("join ") {
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        return Some(CliInput::Join {
            name: name.to_string(),
        });
    }

    let (head, text) = line.split_once(':')?;
    let (author, channel) = match head.split_once('@') {
        Some((author, channel)) => (author.trim(), Some(channel.trim().to_string())),
        None => (head.trim(), None),
    };
    if author.is_empty() || author.contains(char::is_whitespace) {
        return None;
    }
    if channel.as_deref().is_some_and(str::is_empty) {
        return None;
    }
    Some(CliInput::Say {
        author: author.to_string(),
        channel,
        text: text.trim().to_string(),
    })
}

fn private_channel_id(member: &Member) -> String {
    format!("{PRIVATE_PREFIX}{}", member.id)
}

/// Register `name` (if new) and return the member.
fn register(members: &MemberTable, name: &str) -> Member {
    let mut members = members.lock().unwrap_or_else(|e| e.into_inner());
    members
        .entry(name.to_string())
        .or_insert_with(|| Member::new(name, name))
        .clone()
}

fn to_event(members: &MemberTable, input: CliInput) -> GatewayEvent {
    match input {
        CliInput::Join { name } => GatewayEvent::MemberJoined(register(members, &name)),
        CliInput::Say {
            author,
            channel,
            text,
        } => {
            let author = register(members, &author);
            let channel_id = channel.unwrap_or_else(|| private_channel_id(&author));
            GatewayEvent::Message(IncomingMessage::new(channel_id, author, text))
        }
    }
}

/// Local gateway driven by stdin.
pub struct CliGateway {
    channels: Vec<String>,
    moderators: Vec<String>,
    members: MemberTable,
    labels: Mutex<HashMap<String, String>>,
}

impl CliGateway {
    /// `channels` are the named broadcast channels that exist; `moderators`
    /// are member names holding every role.
    pub fn new(channels: Vec<String>, moderators: Vec<String>) -> Self {
        Self {
            channels,
            moderators,
            members: Arc::new(Mutex::new(HashMap::new())),
            labels: Mutex::new(HashMap::new()),
        }
    }

    /// Current display label for `member_id`, if one was set.
    pub fn label_of(&self, member_id: &str) -> Option<String> {
        self.labels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(member_id)
            .cloned()
    }
}

#[async_trait]
impl Gateway for CliGateway {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, GatewayError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match parse_line(&line) {
                            Some(input) => {
                                if tx.send(input).is_err() {
                                    break;
                                }
                            }
                            None => eprintln!(
                                "? expected `join <name>`, `<name>: <text>` or `<name>@<channel>: <text>`"
                            ),
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let members = Arc::clone(&self.members);
        let stream = stream::unfold((rx, members), |(mut rx, members)| async move {
            let input = rx.recv().await?;
            let event = to_event(&members, input);
            Some((event, (rx, members)))
        });

        Ok(Box::pin(stream))
    }

    async fn open_private(&self, member: &Member) -> Result<ChannelRef, GatewayError> {
        Ok(ChannelRef::new(
            private_channel_id(member),
            format!("{PRIVATE_PREFIX}{}", member.name),
        ))
    }

    async fn send(&self, channel: &ChannelRef, text: &str) -> Result<(), GatewayError> {
        println!("[{}] {}\n", channel.name, text);
        Ok(())
    }

    async fn find_channel(&self, name: &str) -> Option<ChannelRef> {
        self.channels
            .iter()
            .find(|c| c.as_str() == name)
            .map(|c| ChannelRef::new(c.clone(), c.clone()))
    }

    async fn find_member(&self, reference: &str) -> Option<Member> {
        let key = reference
            .trim()
            .trim_start_matches("<@")
            .trim_end_matches('>')
            .trim_start_matches('@');
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    async fn set_display_label(&self, member: &Member, label: &str) -> Result<(), GatewayError> {
        eprintln!("~ {} is now known as {}", member.name, label);
        self.labels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(member.id.clone(), label.to_string());
        Ok(())
    }

    async fn has_role(&self, member: &Member, _role: &str) -> bool {
        self.moderators.iter().any(|m| m == &member.name)
    }
}
