//! One-time verification challenges: captcha answers and email codes.
//!
//! Both flows share a single in-process store. Entries are keyed by a random
//! hex id, bound to a subject (the email for email codes, empty for captcha)
//! and consumed on successful verification, so an id can never be replayed.

pub mod captcha;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use rand::prelude::RngExt;
use rand::rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::Clock;

/// Verification code length for email challenges.
pub const EMAIL_CODE_LENGTH: usize = 6;

/// What a challenge protects. Policies differ per kind: captchas are short
/// lived and burn on the first wrong answer, email codes allow retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeKind {
    Captcha,
    EmailCode,
}

impl ChallengeKind {
    fn lifetime(self) -> Duration {
        match self {
            ChallengeKind::Captcha => Duration::minutes(5),
            ChallengeKind::EmailCode => Duration::minutes(10),
        }
    }

    fn max_attempts(self) -> u32 {
        match self {
            ChallengeKind::Captcha => 1,
            ChallengeKind::EmailCode => 3,
        }
    }
}

/// Outcome of a verification attempt, in the order the checks run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Answer matched; the entry has been consumed.
    Ok,
    /// Unknown id, wrong kind, or past its lifetime.
    InvalidOrExpired,
    /// Entry exists but is bound to a different subject. Does not count as an attempt.
    SubjectMismatch,
    /// Attempt budget exhausted; the entry has been removed.
    TooManyAttempts,
    /// Wrong answer; the attempt counter has been incremented.
    Mismatch,
}

#[derive(Clone, Debug)]
struct Challenge {
    kind: ChallengeKind,
    answer: String,
    subject: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
    max_attempts: u32,
}

/// In-process store for pending challenges.
///
/// Operations are synchronous short critical sections; nothing awaits while
/// the lock is held.
pub struct VerificationStore {
    entries: RwLock<HashMap<String, Challenge>>,
    clock: Clock,
}

impl VerificationStore {
    pub fn new(clock: Clock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Inserts a challenge and returns its id.
    pub fn generate(&self, kind: ChallengeKind, subject: &str, answer: &str) -> String {
        // Roughly one generate in ten also clears expired entries, so the map
        // stays bounded even if the sweeper falls behind.
        if rng().random_range(0..10) == 0 {
            self.sweep();
        }

        let challenge = Challenge {
            kind,
            answer: answer.to_string(),
            subject: normalize_subject(subject),
            expires_at: self.clock.now() + kind.lifetime(),
            attempts: 0,
            max_attempts: kind.max_attempts(),
        };

        let id = new_challenge_id();
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(id.clone(), challenge);
        id
    }

    /// Checks `answer` against the challenge `id`.
    ///
    /// Checks run strictly in this order: existence/kind/expiry, subject
    /// binding, attempt budget, then the answer itself (case-insensitive).
    /// Expired entries are deleted on sight; a subject mismatch leaves the
    /// entry and its counter untouched.
    pub fn verify(&self, kind: ChallengeKind, id: &str, subject: &str, answer: &str) -> VerifyOutcome {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());

        let (remove, outcome) = match entries.get_mut(id) {
            None => return VerifyOutcome::InvalidOrExpired,
            Some(challenge) => {
                if challenge.kind != kind {
                    (false, VerifyOutcome::InvalidOrExpired)
                } else if challenge.expires_at <= now {
                    (true, VerifyOutcome::InvalidOrExpired)
                } else if challenge.subject != normalize_subject(subject) {
                    (false, VerifyOutcome::SubjectMismatch)
                } else if challenge.attempts >= challenge.max_attempts {
                    (true, VerifyOutcome::TooManyAttempts)
                } else {
                    challenge.attempts += 1;
                    if challenge.answer.eq_ignore_ascii_case(answer) {
                        (true, VerifyOutcome::Ok)
                    } else {
                        (false, VerifyOutcome::Mismatch)
                    }
                }
            }
        };

        if remove {
            entries.remove(id);
        }
        outcome
    }

    /// Removes expired entries; returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|_, challenge| challenge.expires_at > now);
        before - entries.len()
    }

    /// Number of pending challenges (expired ones included until swept).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Answer of a pending challenge, so tests can complete flows whose codes
    /// only ever leave the process by email.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn answer_for(&self, id: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(id).map(|challenge| challenge.answer.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodic cleanup loop; runs until `shutdown` fires.
    pub async fn run_sweeper(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        debug!(removed, "Swept expired verification challenges");
                    }
                }
                _ = shutdown.cancelled() => {
                    debug!("Verification sweeper stopping");
                    break;
                }
            }
        }
    }
}

/// 16 random bytes as lowercase hex.
fn new_challenge_id() -> String {
    let mut bytes = [0u8; 16];
    rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Random numeric code for email verification.
pub fn generate_email_code() -> String {
    let mut rng = rng();
    (0..EMAIL_CODE_LENGTH).map(|_| char::from(b'0' + rng.random_range(0..10u8))).collect()
}

fn normalize_subject(subject: &str) -> String {
    subject.trim().to_lowercase()
}
