//! Title candidates — sampling unused "<modifier> <noun>" titles.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::registry::TitleRegistry;
use crate::words::WordPool;

/// A "<modifier> <noun>" title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    pub fn new(modifier: &str, noun: &str) -> Self {
        Self(format!("{modifier} {noun}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can hand a session its list of candidate titles.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self, registry: &TitleRegistry) -> Result<Vec<Title>, GenerationError>;
}

/// Sample up to `count` distinct titles that are not yet retired.
///
/// Draws exactly one (modifier, noun) pair per attempt and stops after
/// `max_attempts` draws. The registry check here is advisory; the session
/// reserves the chosen title authoritatively.
pub async fn generate<R>(
    pool: &WordPool,
    registry: &TitleRegistry,
    count: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<Title>, GenerationError>
where
    R: Rng + Send,
{
    let mut candidates: Vec<Title> = Vec::with_capacity(count);
    let mut attempts = 0;

    while candidates.len() < count && attempts < max_attempts {
        attempts += 1;
        let (Some(modifier), Some(noun)) =
            (pool.modifiers().choose(rng), pool.nouns().choose(rng))
        else {
            break;
        };
        let title = Title::new(modifier, noun);
        if candidates.contains(&title) || registry.contains(title.as_str()).await {
            continue;
        }
        candidates.push(title);
    }

    if candidates.len() < count {
        warn!(
            found = candidates.len(),
            wanted = count,
            attempts,
            "Candidate generation exhausted"
        );
        return Err(GenerationError::Exhausted {
            found: candidates.len(),
            wanted: count,
            attempts,
        });
    }

    debug!(attempts, "Generated {} candidates", candidates.len());
    Ok(candidates)
}

/// Random candidate source over a shared word pool.
pub struct CandidateGenerator {
    pool: Arc<WordPool>,
    count: usize,
    max_attempts: usize,
    rng: Mutex<StdRng>,
}

impl CandidateGenerator {
    pub fn new(pool: Arc<WordPool>, count: usize, max_attempts: usize) -> Self {
        Self {
            pool,
            count,
            max_attempts,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same as [`new`](Self::new) but with a reproducible random sequence.
    pub fn with_seed(pool: Arc<WordPool>, count: usize, max_attempts: usize, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..Self::new(pool, count, max_attempts)
        }
    }
}

#[async_trait]
impl CandidateSource for CandidateGenerator {
    async fn candidates(&self, registry: &TitleRegistry) -> Result<Vec<Title>, GenerationError> {
        let mut rng = self.rng.lock().await;
        generate(
            &self.pool,
            registry,
            self.count,
            self.max_attempts,
            &mut *rng,
        )
        .await
    }
}
