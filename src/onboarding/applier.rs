//! IdentityApplier — commits a session outcome to the community.
//!
//! Three side effects, in order, each best-effort: set the member's display
//! label, tell the member privately, post a record to the title log channel.
//! Every gateway failure is logged and swallowed here so one member's
//! outcome can never take down another session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::Title;
use crate::config::OnboardingConfig;
use crate::error::GatewayError;
use crate::gateway::{Gateway, Member};

use super::model::{Outcome, OutcomeKind};
use super::prompts;

/// Structured title log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleLogRecord {
    pub kind: OutcomeKind,
    pub member_id: String,
    pub member_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub label: String,
    pub recorded_at: DateTime<Utc>,
}

impl TitleLogRecord {
    pub fn new(member: &Member, outcome: &Outcome) -> Self {
        let (title, name) = match outcome {
            Outcome::Assigned(identity) => {
                (Some(identity.title.clone()), Some(identity.name.clone()))
            }
            Outcome::Fallback { .. } => (None, None),
        };
        Self {
            kind: outcome.kind(),
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            title,
            name,
            label: outcome.label(),
            recorded_at: Utc::now(),
        }
    }
}

/// Which side effects went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub label_set: bool,
    pub member_notified: bool,
    pub logged: bool,
}

pub struct IdentityApplier {
    gateway: Arc<dyn Gateway>,
    log_channel: String,
    redirect_channel: String,
    moderator_role: String,
}

impl IdentityApplier {
    pub fn new(gateway: Arc<dyn Gateway>, config: &OnboardingConfig) -> Self {
        Self {
            gateway,
            log_channel: config.log_channel.clone(),
            redirect_channel: config.redirect_channel.clone(),
            moderator_role: config.moderator_role.clone(),
        }
    }

    /// Apply `outcome` to `member`. Never fails; see the returned report for
    /// which steps succeeded.
    pub async fn apply(&self, member: &Member, outcome: &Outcome) -> ApplyReport {
        let label = outcome.label();
        let record = TitleLogRecord::new(member, outcome);

        info!(
            member_id = %member.id,
            member = %member.name,
            kind = %record.kind,
            label = %label,
            "Applying identity"
        );

        let label_set = self.step("set display label", member, async {
            self.gateway.set_display_label(member, &label).await
        })
        .await;

        let notice = match outcome {
            Outcome::Assigned(_) => {
                let redirect = self.gateway.find_channel(&self.redirect_channel).await;
                prompts::assigned_notice(&label, redirect.as_ref())
            }
            Outcome::Fallback { .. } => prompts::fallback_notice(&label, &self.moderator_role),
        };
        let member_notified = self.step("notify member", member, async {
            let channel = self.gateway.open_private(member).await?;
            self.gateway.send(&channel, &notice).await
        })
        .await;

        let logged = self.step("write title log", member, self.emit(member, outcome, &record))
            .await;

        ApplyReport {
            label_set,
            member_notified,
            logged,
        }
    }

    async fn emit(
        &self,
        member: &Member,
        outcome: &Outcome,
        record: &TitleLogRecord,
    ) -> Result<(), GatewayError> {
        match serde_json::to_string(record) {
            Ok(json) => info!(target: "renown::title_log", record = %json, "Title log record"),
            Err(e) => warn!(error = %e, "Failed to serialize title log record"),
        }

        let channel = self
            .gateway
            .find_channel(&self.log_channel)
            .await
            .ok_or_else(|| GatewayError::SendFailed {
                channel: self.log_channel.clone(),
                reason: "channel not found".to_string(),
            })?;
        let text = match outcome {
            Outcome::Assigned(identity) => prompts::assigned_log(member, identity),
            Outcome::Fallback { label } => prompts::fallback_log(member, label),
        };
        self.gateway.send(&channel, &text).await
    }

    async fn step<F>(&self, action: &str, member: &Member, fut: F) -> bool
    where
        F: std::future::Future<Output = Result<(), GatewayError>>,
    {
        match fut.await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    member_id = %member.id,
                    member = %member.name,
                    action,
                    error = %e,
                    "Identity step failed; continuing"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{Identity, TitlePosition};

    #[test]
    fn record_for_assigned_carries_title_and_name() {
        let member = Member::new("42", "thorne");
        let outcome = Outcome::Assigned(Identity {
            title: Title::from("Frost Hawk"),
            name: "Thorne".into(),
            position: TitlePosition::After,
        });
        let record = TitleLogRecord::new(&member, &outcome);
        assert_eq!(record.kind, OutcomeKind::Assigned);
        assert_eq!(record.title, Some(Title::from("Frost Hawk")));
        assert_eq!(record.name.as_deref(), Some("Thorne"));
        assert_eq!(record.label, "Thorne, Frost Hawk");
    }

    #[test]
    fn record_for_fallback_omits_title() {
        let member = Member::new("42", "thorne");
        let outcome = Outcome::Fallback {
            label: "Unrenowned thorne".into(),
        };
        let record = TitleLogRecord::new(&member, &outcome);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "fallback");
        assert_eq!(json["label"], "Unrenowned thorne");
        assert!(json.get("title").is_none());
        assert!(json.get("name").is_none());
    }
}
