//! Member-facing dialogue text and title log rendering.

use crate::candidates::Title;
use crate::gateway::{ChannelRef, Member};

use super::model::Identity;

pub const NAME_PROMPT: &str = "What name would you like to be known as? (e.g., Thorne)";

pub const POSITION_PROMPT: &str = "Should your title come `before` or `after` your name?";

pub const GENERATION_FAILED: &str = "Title generation failed. Please contact a mod.";

pub const RESERVATION_FAILED: &str = "That title was claimed while you were choosing, so no title could be \
assigned. Please contact a mod to begin the process again.";

pub const STORE_FAILED: &str = "Your title could not be recorded. Please contact a mod.";

pub const PERMISSION_DENIED: &str = "You do not have permission to use this command.";

/// Offer message: greeting plus the numbered candidate list.
pub fn offer(community: &str, member: &Member, candidates: &[Title]) -> String {
    let formatted = candidates
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Welcome to the {community}, {}.\n\n\
         Choose your title by replying with a number (1–{}):\n{formatted}",
        member.name,
        candidates.len()
    )
}

/// Sent to the member once their label is set.
pub fn assigned_notice(label: &str, redirect: Option<&ChannelRef>) -> String {
    match redirect {
        Some(channel) => format!(
            "Your name is now **{label}**. Proceed to {} to give your true name.",
            channel.mention()
        ),
        None => format!("Your name is now **{label}**."),
    }
}

/// Sent to a member who ran out of time.
pub fn fallback_notice(label: &str, moderator_role: &str) -> String {
    format!(
        "You took too long to respond, so you've been temporarily titled **{label}**.\n\
         Please contact a {moderator_role} member to begin the process again."
    )
}

/// Acknowledgement posted where a retitle command was issued.
pub fn retitling(member: &Member) -> String {
    format!("Retitling {}...", member.mention())
}

pub fn retitle_usage(prefix: &str) -> String {
    format!("Usage: {prefix}retitle <member>")
}

pub fn member_not_found(reference: &str) -> String {
    format!("No member found for `{reference}`.")
}

/// Title log entry for a completed dialogue.
pub fn assigned_log(member: &Member, identity: &Identity) -> String {
    format!(
        "🧊 **Title Assigned**\n\
         Member: {} ({})\n\
         Title: `{}`\n\
         Name: `{}`\n\
         Final Nickname: `{}`",
        member.mention(),
        member.name,
        identity.title,
        identity.name,
        identity.label()
    )
}

/// Title log entry for a timed-out dialogue.
pub fn fallback_log(member: &Member, label: &str) -> String {
    format!(
        "⚠️ **Unrenowned Assigned**\n\
         Member: {} ({})\n\
         Label: `{label}`\n\
         Reason: Timeout during title sequence.",
        member.mention(),
        member.name
    )
}
