//! Temp-storage upload negotiation as an explicit finite-state protocol.
//!
//! The driver (in the engine crate) sends an attempt with [`Negotiation::policy`],
//! feeds the server's answer to [`Negotiation::observe`], and follows the
//! returned [`Step`] until it is [`Step::Done`] or [`Step::Abort`].
//!
//! ```text
//! default ──success──────────────▶ Done
//!    │ limitReached ──▶ AskUser ──evict──▶ overwrite ─┐
//!    │                          └─keep───▶ buffer ────┤
//!    │ forcedDelete ──▶ default (final) ◀─forcedDelete┘
//! ```

use std::fmt;

/// Conflict-resolution mode sent with an upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPolicy {
    #[default]
    Default,
    Buffer,
    Overwrite,
}

impl UploadPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadPolicy::Default => "default",
            UploadPolicy::Buffer => "buffer",
            UploadPolicy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for UploadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the service did with one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success {
        path: String,
    },
    /// Store is at capacity; storing would need the oldest file evicted.
    LimitReached {
        limit: u32,
        oldest_name: Option<String>,
    },
    /// The service evicted `deleted_name` on its own and did *not* store the
    /// new file.
    ForcedDelete {
        deleted_name: Option<String>,
    },
}

/// Answer to the capacity prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    /// Evict the oldest file and store this one.
    Evict,
    /// Keep every file and store this one beyond nominal capacity.
    Keep,
}

impl UserChoice {
    fn policy(self) -> UploadPolicy {
        match self {
            UserChoice::Evict => UploadPolicy::Overwrite,
            UserChoice::Keep => UploadPolicy::Buffer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send another attempt with this policy.
    Retry(UploadPolicy),
    /// Ask the user, then call [`Negotiation::choose`].
    AskUser {
        limit: u32,
        oldest_name: Option<String>,
    },
    Done {
        path: String,
    },
    Abort {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the answer to an attempt.
    Sent,
    /// Waiting for the user to resolve a `limitReached`.
    AwaitingChoice,
    Finished,
}

pub const MAX_ATTEMPTS: u32 = 3;

/// State of one negotiation. Create one per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    phase: Phase,
    policy: UploadPolicy,
    attempts: u32,
    asked_user: bool,
    forced: bool,
    oldest: Option<String>,
    evicted: Option<String>,
}

impl Default for Negotiation {
    fn default() -> Self {
        Self::new()
    }
}

impl Negotiation {
    pub fn new() -> Self {
        Self {
            phase: Phase::Sent,
            policy: UploadPolicy::Default,
            attempts: 1,
            asked_user: false,
            forced: false,
            oldest: None,
            evicted: None,
        }
    }

    /// Policy of the attempt currently in flight.
    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Attempts sent so far, including the one in flight.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Name of the file evicted on our behalf, if known.
    pub fn evicted(&self) -> Option<&str> {
        self.evicted.as_deref()
    }

    pub fn observe(&mut self, outcome: UploadOutcome) -> Step {
        if self.phase != Phase::Sent {
            return self.abort(format!(
                "upload answer received while {}",
                match self.phase {
                    Phase::AwaitingChoice => "waiting for a user decision",
                    _ => "negotiation was already finished",
                }
            ));
        }
        match outcome {
            UploadOutcome::Success { path } => {
                self.phase = Phase::Finished;
                Step::Done { path }
            }
            UploadOutcome::LimitReached { limit, oldest_name } => {
                if self.asked_user || self.forced {
                    return self.abort(format!(
                        "storage limit of {limit} files still reached after {} attempts",
                        self.attempts
                    ));
                }
                self.asked_user = true;
                self.oldest = oldest_name.clone();
                self.phase = Phase::AwaitingChoice;
                Step::AskUser { limit, oldest_name }
            }
            UploadOutcome::ForcedDelete { deleted_name } => {
                if self.forced {
                    return self.abort("service evicted a file twice without storing the upload");
                }
                self.forced = true;
                if deleted_name.is_some() {
                    self.evicted = deleted_name;
                }
                // The eviction made room but did not store our file.
                self.next_attempt(UploadPolicy::Default)
            }
        }
    }

    pub fn choose(&mut self, choice: UserChoice) -> Step {
        if self.phase != Phase::AwaitingChoice {
            return self.abort("no capacity decision was pending");
        }
        if choice == UserChoice::Evict {
            self.evicted = self.oldest.clone();
        }
        self.next_attempt(choice.policy())
    }

    fn next_attempt(&mut self, policy: UploadPolicy) -> Step {
        if self.attempts >= MAX_ATTEMPTS {
            return self.abort(format!("gave up after {MAX_ATTEMPTS} upload attempts"));
        }
        self.attempts += 1;
        self.policy = policy;
        self.phase = Phase::Sent;
        Step::Retry(policy)
    }

    fn abort(&mut self, reason: impl Into<String>) -> Step {
        self.phase = Phase::Finished;
        Step::Abort {
            reason: reason.into(),
        }
    }
}
