//! Fault-injection modes.

use std::fmt;
use std::str::FromStr;

/// Runtime behavior mode used to validate the group's Byzantine tolerance.
///
/// Modes only change **outbound** message production. Inbound acceptance
/// logic is never altered, so a malicious node still validates and records
/// what it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaliciousMode {
    /// Default behavior.
    #[default]
    Honest,

    /// Drop all outbound consensus messages. Models omission faults.
    Silent,

    /// Substitute the digest in outbound prepare and commit votes with a
    /// deterministic but incorrect value. Models equivocation/corruption.
    WrongHash,
}

impl MaliciousMode {
    /// Canonical lowercase name, as used on the control RPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaliciousMode::Honest => "honest",
            MaliciousMode::Silent => "silent",
            MaliciousMode::WrongHash => "wrong_hash",
        }
    }

    /// Whether this mode suppresses outbound messages entirely.
    pub fn is_silent(&self) -> bool {
        matches!(self, MaliciousMode::Silent)
    }
}

impl fmt::Display for MaliciousMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown malicious mode: {0:?} (expected honest, silent or wrong_hash)")]
pub struct ParseMaliciousModeError(pub String);

impl FromStr for MaliciousMode {
    type Err = ParseMaliciousModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "honest" => Ok(MaliciousMode::Honest),
            "silent" => Ok(MaliciousMode::Silent),
            "wrong_hash" => Ok(MaliciousMode::WrongHash),
            other => Err(ParseMaliciousModeError(other.to_string())),
        }
    }
}
