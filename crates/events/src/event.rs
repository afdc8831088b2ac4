// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incoming transaction events and their identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Blockchain network an event was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet, coins carry real value
    Production,
    /// Public test network
    Test,
    /// Local regression-test network
    RegTest,
}

impl Network {
    /// Stable code used on disk and on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Network::Production => "production",
            Network::Test => "test",
            Network::RegTest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network code: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Network::Production),
            "test" => Ok(Network::Test),
            "regtest" => Ok(Network::RegTest),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Notification status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Recorded but not yet acknowledged by a consumer
    Pending,
    /// Acknowledged; never delivered again
    Completed,
}

impl EventStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, EventStatus::Pending)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Pending => f.write_str("pending"),
            EventStatus::Completed => f.write_str("completed"),
        }
    }
}

/// Stable handle to an event held by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The immutable fields that identify a real-world transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub address: String,
    pub transaction_hash: String,
    pub value: u64,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.transaction_hash, self.address, self.value)
    }
}

/// Funds received by a watched address
///
/// Equality and hashing only consider [`EventKey`] fields. An event that
/// moved from `Pending` to `Completed` is still the same event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingTransactionEvent {
    address: String,
    network: Network,
    value: u64,
    transaction_hash: String,
    status: EventStatus,
}

impl IncomingTransactionEvent {
    /// Create a new pending event
    pub fn new(
        address: impl Into<String>,
        network: Network,
        value: u64,
        transaction_hash: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            network,
            value,
            transaction_hash: transaction_hash.into(),
            status: EventStatus::Pending,
        }
    }

    /// Destination address that received the funds
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Amount received, in the smallest currency unit
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn transaction_hash(&self) -> &str {
        &self.transaction_hash
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            address: self.address.clone(),
            transaction_hash: self.transaction_hash.clone(),
            value: self.value,
        }
    }

    /// Move a pending event to `Completed`; returns false if it already was
    pub(crate) fn complete(&mut self) -> bool {
        if self.status.is_pending() {
            self.status = EventStatus::Completed;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset_pending(&mut self) {
        self.status = EventStatus::Pending;
    }
}

impl PartialEq for IncomingTransactionEvent {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.transaction_hash == other.transaction_hash
            && self.value == other.value
    }
}

impl Eq for IncomingTransactionEvent {}

impl Hash for IncomingTransactionEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.transaction_hash.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for IncomingTransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<36} {:<10} {:>16} {:<10} {}",
            self.address, self.network, self.value, self.status, self.transaction_hash
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
