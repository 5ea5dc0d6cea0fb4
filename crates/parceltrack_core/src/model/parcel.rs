//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical parcel record persisted by the store.
//! - Own the status state machine used by repository mutation guards.
//!
//! # Invariants
//! - `number` is engine-assigned, unique, and never reused after deletion.
//! - `created_at` is fixed at creation time as an RFC-3339 UTC timestamp.
//! - Status only moves forward, one step at a time:
//!   `registered -> sent -> delivered`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Engine-assigned tracking number for a parcel.
///
/// `0` means "not yet persisted"; the backing table assigns the first real
/// number on insert and never hands the same value out twice.
pub type ParcelNumber = i64;

/// Identifier of the client owning a parcel.
///
/// Opaque to this crate: no client registry is consulted here.
pub type ClientId = i64;

/// Lifecycle stage of a parcel.
///
/// The wire names (serde) and the persisted TEXT values are identical, so a
/// serialized status can be compared against a raw table row directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted into the system; address may still change.
    Registered,
    /// Handed over for delivery; the record is frozen except for status.
    Sent,
    /// Terminal stage; no further mutation is legal.
    Delivered,
}

impl ParcelStatus {
    /// Returns the single legal forward step, or `None` for the terminal
    /// stage.
    pub fn next_status(self) -> Option<ParcelStatus> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Returns whether moving to `next` is a legal one-step transition.
    ///
    /// Backward moves, stage skips, and same-status writes are all illegal.
    pub fn can_advance_to(self, next: ParcelStatus) -> bool {
        self.next_status() == Some(next)
    }

    /// Returns whether a parcel in this stage may still change its address.
    pub fn allows_address_change(self) -> bool {
        self == Self::Registered
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

/// Validation failures for parcel field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    /// Address is empty or whitespace-only.
    EmptyAddress,
    /// `created_at` does not parse as an RFC-3339 timestamp.
    InvalidCreatedAt(String),
}

impl Display for ParcelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "parcel address cannot be empty"),
            Self::InvalidCreatedAt(value) => {
                write!(f, "created_at `{value}` is not an RFC-3339 timestamp")
            }
        }
    }
}

impl Error for ParcelValidationError {}

/// Canonical parcel record.
///
/// Mirrors the `parcel` table row one-to-one; the repository persists every
/// field as given except `number`, which the engine assigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Engine-assigned tracking number, `0` until persisted.
    pub number: ParcelNumber,
    /// Owning client.
    pub client: ClientId,
    /// Current lifecycle stage.
    pub status: ParcelStatus,
    /// Free-form delivery address; mutable only while `Registered`.
    pub address: String,
    /// RFC-3339 creation timestamp, immutable after assignment.
    pub created_at: String,
}

impl Parcel {
    /// Creates a new unpersisted parcel in the `Registered` stage.
    ///
    /// `created_at` is stamped with the current UTC time at second
    /// precision, matching the persisted TEXT format.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Returns whether the backing table has assigned a tracking number.
    pub fn is_assigned(&self) -> bool {
        self.number > 0
    }

    /// Checks field values against the model contract.
    ///
    /// # Errors
    /// - `EmptyAddress` when the address is blank.
    /// - `InvalidCreatedAt` when the timestamp does not parse as RFC-3339.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        validate_address(&self.address)?;
        if DateTime::parse_from_rfc3339(&self.created_at).is_err() {
            return Err(ParcelValidationError::InvalidCreatedAt(
                self.created_at.clone(),
            ));
        }
        Ok(())
    }
}

/// Validates one address value against the model contract.
///
/// Shared by `Parcel::validate` and the repository address-mutation path.
pub fn validate_address(address: &str) -> Result<(), ParcelValidationError> {
    if address.trim().is_empty() {
        return Err(ParcelValidationError::EmptyAddress);
    }
    Ok(())
}
