//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Onboarding configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Line-delimited modifier word list.
    pub modifiers_path: PathBuf,
    /// Line-delimited noun word list.
    pub nouns_path: PathBuf,
    /// Append-only store of every title ever assigned.
    pub titles_path: PathBuf,
    /// How long each dialogue step waits for a valid reply.
    pub reply_timeout: Duration,
    /// Number of candidates offered per session.
    pub candidate_count: usize,
    /// Sampling budget for candidate generation.
    pub max_attempts: usize,
    /// Maximum display name length, after trimming.
    pub max_name_len: usize,
    /// Broadcast channel receiving title log records.
    pub log_channel: String,
    /// Channel new members are pointed to after onboarding.
    pub redirect_channel: String,
    /// Role allowed to run the retitle command.
    pub moderator_role: String,
    /// Prefix for operator commands.
    pub command_prefix: String,
    /// Community name used in the welcome message.
    pub community_name: String,
    /// First word of the label given to members who time out.
    pub fallback_prefix: String,
    /// Member names holding the moderator role on the CLI gateway.
    pub moderators: Vec<String>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            modifiers_path: PathBuf::from("modifiers.txt"),
            nouns_path: PathBuf::from("nouns.txt"),
            titles_path: PathBuf::from("used_titles.txt"),
            reply_timeout: Duration::from_secs(60),
            candidate_count: 5,
            max_attempts: 100,
            max_name_len: 32,
            log_channel: "title-log".to_string(),
            redirect_channel: "hall-of-names".to_string(),
            moderator_role: "High Council".to_string(),
            command_prefix: "!".to_string(),
            community_name: "Order of Iron and Ice".to_string(),
            fallback_prefix: "Unrenowned".to_string(),
            moderators: Vec::new(),
        }
    }
}

impl OnboardingConfig {
    /// Build config from `RENOWN_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };

        let reply_timeout_secs: u64 = parse_positive(&lookup, "RENOWN_REPLY_TIMEOUT_SECS")?
            .unwrap_or(defaults.reply_timeout.as_secs());

        Ok(Self {
            modifiers_path: path("RENOWN_MODIFIERS_PATH", defaults.modifiers_path),
            nouns_path: path("RENOWN_NOUNS_PATH", defaults.nouns_path),
            titles_path: path("RENOWN_TITLES_PATH", defaults.titles_path),
            reply_timeout: Duration::from_secs(reply_timeout_secs),
            candidate_count: parse_positive(&lookup, "RENOWN_CANDIDATE_COUNT")?
                .unwrap_or(defaults.candidate_count),
            max_attempts: parse_positive(&lookup, "RENOWN_MAX_ATTEMPTS")?
                .unwrap_or(defaults.max_attempts),
            max_name_len: parse_positive(&lookup, "RENOWN_MAX_NAME_LEN")?
                .unwrap_or(defaults.max_name_len),
            log_channel: text("RENOWN_LOG_CHANNEL", defaults.log_channel),
            redirect_channel: text("RENOWN_REDIRECT_CHANNEL", defaults.redirect_channel),
            moderator_role: text("RENOWN_MODERATOR_ROLE", defaults.moderator_role),
            command_prefix: text("RENOWN_COMMAND_PREFIX", defaults.command_prefix),
            community_name: text("RENOWN_COMMUNITY_NAME", defaults.community_name),
            fallback_prefix: text("RENOWN_FALLBACK_PREFIX", defaults.fallback_prefix),
            moderators: lookup("RENOWN_MODERATORS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.moderators),
        })
    }
}

/// Parse an optional numeric variable, rejecting garbage and zero.
fn parse_positive<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(Some(value))
}
