//! Domain value types for the storefront.
//!
//! Identifiers, money, ticket tiers and the ticket entity as the client sees it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a catalog event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl EventId {
    /// Creates an `EventId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an issued ticket, assigned by the ticket service
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Creates a `TicketId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
///
/// Serialized as an integer number of cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars (saturating)
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies by a quantity, saturating at the maximum
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.dollars(), self.0 % 100)
    }
}

// ============================================================================
// Tiers
// ============================================================================

/// A named ticket category
///
/// The three house tiers are named variants; any other identifier the
/// catalog uses is carried verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    /// General admission
    Standard,
    /// Better seats
    Premium,
    /// Best seats and extras
    Vip,
    /// Any other tier identifier
    Other(String),
}

impl Tier {
    /// Display name, also used on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "Standard",
            Self::Premium => "Premium",
            Self::Vip => "VIP",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Tier {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "standard" => Self::Standard,
            "premium" => Self::Premium,
            "vip" => Self::Vip,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Tier {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Other(name) => name,
            named => named.as_str().to_string(),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed unit prices per tier, in display order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierCatalog {
    tiers: Vec<(Tier, Money)>,
}

impl TierCatalog {
    /// Creates a catalog from `(tier, unit price)` pairs; later duplicates are dropped
    #[must_use]
    pub fn new(tiers: impl IntoIterator<Item = (Tier, Money)>) -> Self {
        let mut catalog = Self { tiers: Vec::new() };
        for (tier, price) in tiers {
            if catalog.price_of(&tier).is_none() {
                catalog.tiers.push((tier, price));
            }
        }
        catalog
    }

    /// Unit price of a tier, if the catalog offers it
    #[must_use]
    pub fn price_of(&self, tier: &Tier) -> Option<Money> {
        self.tiers
            .iter()
            .find(|(candidate, _)| candidate == tier)
            .map(|(_, price)| *price)
    }

    /// Iterates tiers with their unit prices
    pub fn iter(&self) -> impl Iterator<Item = (&Tier, Money)> {
        self.tiers.iter().map(|(tier, price)| (tier, *price))
    }

    /// Number of tiers on offer
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the catalog offers no tiers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for TierCatalog {
    /// House prices: Standard $45, Premium $85, VIP $150
    fn default() -> Self {
        Self::new([
            (Tier::Standard, Money::from_dollars(45)),
            (Tier::Premium, Money::from_dollars(85)),
            (Tier::Vip, Money::from_dollars(150)),
        ])
    }
}

/// The slice of a catalog event the ticket selector needs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSummary {
    /// Event identifier
    pub id: EventId,
    /// Event name
    pub name: String,
    /// Display date of the event
    pub date: String,
    /// Tiers on sale and their prices
    pub tiers: TierCatalog,
}

// ============================================================================
// Tickets
// ============================================================================

/// Lifecycle status of an issued ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Can be used or cancelled
    Valid,
    /// Already scanned at the venue
    Used,
    /// Cancelled by the holder
    Cancelled,
    /// Past the event, or unknown to the client
    Expired,
}

impl TicketStatus {
    /// Maps a backend status code to a display status
    ///
    /// Unrecognized codes map to `Expired` so an unknown ticket is never
    /// offered for cancellation.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "valid" | "active" => Self::Valid,
            "used" | "redeemed" => Self::Used,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Expired,
        }
    }

    /// Lowercase display name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued ticket, owned by the ticket service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Event the ticket admits to
    pub event_id: EventId,
    /// Event name
    pub event_name: String,
    /// Venue
    pub location: String,
    /// Display date
    pub date: String,
    /// Display time
    pub time: String,
    /// Tier purchased
    pub tier: Tier,
    /// Price paid
    pub price: Money,
    /// Payload encoded in the admission QR code
    pub qr_payload: String,
    /// Status as last reported by the backend
    pub status: TicketStatus,
    /// When the ticket was bought
    pub purchase_date: DateTime<Utc>,
}
