//! Per-session reply inbox with deadline-bounded waits.

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

use crate::gateway::IncomingMessage;

/// Buffered messages per session before the dispatcher starts dropping.
pub const INBOX_CAPACITY: usize = 32;

/// Result of waiting for a reply.
#[derive(Debug, PartialEq, Eq)]
pub enum Wait<T> {
    Reply(T),
    TimedOut,
    /// The dispatcher went away; no more replies can arrive.
    Closed,
}

/// Receiving half of a session's message feed.
pub struct Inbox {
    rx: mpsc::Receiver<IncomingMessage>,
}

impl Inbox {
    pub fn channel() -> (mpsc::Sender<IncomingMessage>, Self) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        (tx, Self { rx })
    }

    /// Drop every message already queued. Called as a step opens, so a reply
    /// sent before its prompt is never taken as the answer.
    pub fn discard_pending(&mut self) -> usize {
        let mut dropped = 0;
        while let Ok(msg) = self.rx.try_recv() {
            trace!(message_id = %msg.id, "Discarding out-of-phase reply");
            dropped += 1;
        }
        dropped
    }

    /// Wait until `accept` returns `Some` for an incoming message, or until
    /// `deadline`. Rejected messages are dropped and do not move the deadline.
    pub async fn wait_for<T, F>(&mut self, deadline: Instant, mut accept: F) -> Wait<T>
    where
        F: FnMut(&IncomingMessage) -> Option<T>,
    {
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Err(_) => return Wait::TimedOut,
                Ok(None) => return Wait::Closed,
                Ok(Some(msg)) => match accept(&msg) {
                    Some(value) => return Wait::Reply(value),
                    None => trace!(message_id = %msg.id, "Ignoring reply"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gateway::Member;

    fn msg(content: &str) -> IncomingMessage {
        IncomingMessage::new("dm:42", Member::new("42", "thorne"), content)
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_accepted_reply() {
        let (tx, mut inbox) = Inbox::channel();
        tx.send(msg("nope")).await.unwrap();
        tx.send(msg("3")).await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(60);
        let got = inbox
            .wait_for(deadline, |m| m.content.parse::<u32>().ok())
            .await;
        assert_eq!(got, Wait::Reply(3));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_messages_do_not_extend_deadline() {
        let (tx, mut inbox) = Inbox::channel();
        let start = Instant::now();
        let deadline = start + Duration::from_secs(60);

        tokio::spawn(async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_secs(15)).await;
                if tx.send(msg("abc")).await.is_err() {
                    break;
                }
            }
        });

        let got = inbox
            .wait_for(deadline, |m| m.content.parse::<u32>().ok())
            .await;
        assert_eq!(got, Wait::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_when_sender_dropped() {
        let (tx, mut inbox) = Inbox::channel();
        drop(tx);
        let deadline = Instant::now() + Duration::from_secs(60);
        let got: Wait<()> = inbox.wait_for(deadline, |_| Some(())).await;
        assert_eq!(got, Wait::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_pending_clears_queued_replies_only() {
        let (tx, mut inbox) = Inbox::channel();
        tx.send(msg("2")).await.unwrap();
        tx.send(msg("2")).await.unwrap();
        assert_eq!(inbox.discard_pending(), 2);

        tx.send(msg("Thorne")).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(60);
        let got = inbox
            .wait_for(deadline, |m| Some(m.content.clone()))
            .await;
        assert_eq!(got, Wait::Reply("Thorne".to_string()));
    }
}
