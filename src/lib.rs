//! Renown — timed title onboarding for community members.

pub mod candidates;
pub mod config;
pub mod error;
pub mod gateway;
pub mod onboarding;
pub mod registry;
pub mod words;
