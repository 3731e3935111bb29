use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::application::errors::ValidationError;

/// Validated message text: trimmed and never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// Trim surrounding whitespace and reject what is left if it is empty
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for MessageContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique message identity, `<sequence>-<unix millis>`.
///
/// The sequence is the arrival order; the millis only record when the
/// message was received. Identities order by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    sequence: u64,
    millis: i64,
}

impl Identity {
    pub fn new(sequence: u64, received_at: DateTime<Utc>) -> Self {
        Self {
            sequence,
            millis: received_at.timestamp_millis(),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}-{}", self.sequence, self.millis)
    }
}

/// Error returned when a string is not a valid identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid message identity: {0}")]
pub struct InvalidIdentity(pub String);

impl FromStr for Identity {
    type Err = InvalidIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidIdentity(s.to_string());

        let (sequence, millis) = s.split_once('-').ok_or_else(invalid)?;
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let sequence = sequence.parse::<u64>().map_err(|_| invalid())?;
        let millis = millis.parse::<i64>().map_err(|_| invalid())?;
        Utc.timestamp_millis_opt(millis).single().ok_or_else(invalid)?;

        Ok(Self { sequence, millis })
    }
}

/// A single guestbook entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub identity: Identity,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(identity: Identity, content: MessageContent) -> Self {
        Self {
            identity,
            content: content.into_inner(),
            received_at: identity.received_at(),
        }
    }

    /// Rebuild a message read back from storage
    pub fn restore(identity: Identity, content: impl Into<String>) -> Self {
        Self {
            identity,
            content: content.into(),
            received_at: identity.received_at(),
        }
    }
}
