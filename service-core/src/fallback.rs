//! Ordered fallback chains over external model identifiers.
//!
//! A chain walks a list of candidates (model names, endpoints) in order and
//! returns the first success. Each candidate gets a fixed number of attempts
//! with a fixed pause between attempts on the same candidate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

/// How many times each candidate is tried and how long to pause between tries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Attempts per candidate, including the first one. Zero is treated as one.
    pub attempts_per_candidate: u32,
    /// Pause between two attempts on the same candidate.
    pub pause: Duration,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            attempts_per_candidate: 2,
            pause: Duration::from_secs(1),
        }
    }
}

impl FallbackPolicy {
    pub fn new(attempts_per_candidate: u32, pause: Duration) -> Self {
        Self {
            attempts_per_candidate,
            pause,
        }
    }

    /// One attempt per candidate, no pause.
    pub fn single_attempt() -> Self {
        Self {
            attempts_per_candidate: 1,
            pause: Duration::ZERO,
        }
    }
}

/// Errors that may go away if the same candidate is asked again.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// One failed attempt against one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptFailure {
    pub candidate: String,
    pub attempt: u32,
    pub message: String,
}

impl Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.candidate, self.message)
    }
}

#[derive(Debug)]
pub struct FallbackSuccess<T> {
    /// Candidate that produced the value.
    pub candidate: String,
    pub value: T,
    /// Failures recorded before the successful attempt.
    pub failures: Vec<AttemptFailure>,
}

#[derive(Debug, Error)]
#[error("all candidates failed: {}", self.summary())]
pub struct FallbackExhausted {
    pub failures: Vec<AttemptFailure>,
}

impl FallbackExhausted {
    /// `"<candidate>: <message> | ..."`, or `"no candidates"` when nothing was tried.
    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            return "no candidates".to_string();
        }
        self.failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}

/// Run `f` against each candidate in order until one succeeds.
///
/// Non-transient errors skip the remaining attempts for that candidate and
/// move straight to the next one.
///
/// # Example
/// ```ignore
/// let outcome = run_fallback(
///     &FallbackPolicy::default(),
///     "generate_image",
///     &models,
///     |model| provider.generate_image(model, prompt, image),
/// )
/// .await?;
/// ```
pub async fn run_fallback<T, E, F, Fut>(
    policy: &FallbackPolicy,
    operation: &str,
    candidates: &[String],
    mut f: F,
) -> Result<FallbackSuccess<T>, FallbackExhausted>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + Transient,
{
    let attempts = policy.attempts_per_candidate.max(1);
    let mut failures = Vec::new();

    for candidate in candidates {
        for attempt in 1..=attempts {
            match f(candidate).await {
                Ok(value) => {
                    if !failures.is_empty() {
                        info!(
                            operation,
                            candidate = %candidate,
                            attempt,
                            prior_failures = failures.len(),
                            "Fallback chain succeeded after failures"
                        );
                    }
                    return Ok(FallbackSuccess {
                        candidate: candidate.clone(),
                        value,
                        failures,
                    });
                }
                Err(err) => {
                    let transient = err.is_transient();
                    warn!(
                        operation,
                        candidate = %candidate,
                        attempt,
                        transient,
                        error = %err,
                        "Fallback attempt failed"
                    );
                    failures.push(AttemptFailure {
                        candidate: candidate.clone(),
                        attempt,
                        message: err.to_string(),
                    });

                    if !transient {
                        break;
                    }
                    if attempt < attempts && !policy.pause.is_zero() {
                        sleep(policy.pause).await;
                    }
                }
            }
        }
    }

    warn!(
        operation,
        candidates = candidates.len(),
        failures = failures.len(),
        "Fallback chain exhausted"
    );
    Err(FallbackExhausted { failures })
}
