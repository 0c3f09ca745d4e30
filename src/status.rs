//! Agreement policy for the playback status query
//!
//! The JQ8400 sometimes answers "paused" while it is playing. Status reads
//! are therefore repeated until the same answer comes back several times in a
//! row, or until a query budget runs out. Running out is not an error: the
//! last answer is returned flagged as low confidence.

use crate::types::PlayStatus;

/// How status reads are confirmed
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusPolicy {
    agreement: u8,
    max_queries: u8,
    trust_stopped: bool,
}

impl StatusPolicy {
    /// Consecutive identical reads required by default
    pub const DEFAULT_AGREEMENT: u8 = 1;
    /// Query budget per status call by default
    pub const DEFAULT_MAX_QUERIES: u8 = 8;

    /// Accept the first read, at most 8 queries, no stopped shortcut
    pub const fn new() -> Self {
        Self {
            agreement: Self::DEFAULT_AGREEMENT,
            max_queries: Self::DEFAULT_MAX_QUERIES,
            trust_stopped: false,
        }
    }

    /// Consecutive identical reads needed before a status is trusted.
    /// Zero is treated as one; the query budget grows to match if needed.
    pub const fn with_agreement(mut self, agreement: u8) -> Self {
        self.agreement = if agreement == 0 { 1 } else { agreement };
        if self.max_queries < self.agreement {
            self.max_queries = self.agreement;
        }
        self
    }

    /// Upper bound on status queries per call, never below the agreement
    pub const fn with_max_queries(mut self, max_queries: u8) -> Self {
        self.max_queries = if max_queries < self.agreement {
            self.agreement
        } else {
            max_queries
        };
        self
    }

    /// Accept a single `Stopped` read straight away. The module's known
    /// fault is reporting paused while playing; stopped reads are reliable.
    pub const fn with_trust_stopped(mut self, trust_stopped: bool) -> Self {
        self.trust_stopped = trust_stopped;
        self
    }

    /// Consecutive identical reads required
    pub const fn agreement(&self) -> u8 {
        self.agreement
    }

    /// Status queries allowed per call
    pub const fn max_queries(&self) -> u8 {
        self.max_queries
    }

    /// Whether one stopped read is enough
    pub const fn trust_stopped(&self) -> bool {
        self.trust_stopped
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a status result met the agreement threshold
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Confidence {
    /// Seen the required number of times in a row
    High,
    /// Query budget ran out first; best guess only
    Low,
}

/// Outcome of a confirmed status query
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReading {
    pub status: PlayStatus,
    pub confidence: Confidence,
    /// Number of status queries sent to get this result
    pub queries: u8,
}

/// Running state of one confirmed status query
#[derive(Debug)]
pub struct Consensus {
    policy: StatusPolicy,
    last: Option<PlayStatus>,
    run: u8,
    queries: u8,
}

impl Consensus {
    /// Start a confirmation with no reads observed
    pub const fn new(policy: StatusPolicy) -> Self {
        Self {
            policy,
            last: None,
            run: 0,
            queries: 0,
        }
    }

    /// Record one decoded status read.
    ///
    /// Returns the final reading once agreement is reached or the query
    /// budget is spent, `None` while another query is needed.
    pub fn observe(&mut self, status: PlayStatus) -> Option<StatusReading> {
        self.queries = self.queries.saturating_add(1);
        if self.last == Some(status) {
            self.run = self.run.saturating_add(1);
        } else {
            self.last = Some(status);
            self.run = 1;
        }

        let trusted = self.policy.trust_stopped && status == PlayStatus::Stopped;
        if trusted || self.run >= self.policy.agreement {
            return Some(StatusReading {
                status,
                confidence: Confidence::High,
                queries: self.queries,
            });
        }

        if self.queries >= self.policy.max_queries {
            return Some(StatusReading {
                status,
                confidence: Confidence::Low,
                queries: self.queries,
            });
        }

        None
    }
}
