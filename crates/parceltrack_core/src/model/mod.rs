//! Domain model for parcel tracking.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep lifecycle rules next to the data they constrain.
//!
//! # Invariants
//! - Every parcel is identified by a stable engine-assigned `ParcelNumber`.
//! - Deletion is a hard delete; the model carries no tombstone state.

pub mod parcel;
