//! Parcel use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for callers of the persistence core.
//! - Delegate storage decisions to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation or mutation guards.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError, RepoResult};

/// Use-case service wrapper for parcel operations.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` at `address`.
    ///
    /// # Contract
    /// - Initial status is `Registered`.
    /// - `created_at` is stamped at call time.
    /// - Returns the stored record with its assigned tracking number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel)?;
        Ok(parcel)
    }

    /// Loads one parcel by tracking number.
    pub fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.repo.get(number)
    }

    /// Rewrites the delivery address of a still-`registered` parcel.
    pub fn change_address(&self, number: ParcelNumber, new_address: &str) -> RepoResult<()> {
        self.repo.set_address(number, new_address)
    }

    /// Moves one parcel to an explicit target status.
    ///
    /// Only the single forward lifecycle step is accepted; everything else
    /// fails with `IllegalTransition`.
    pub fn set_status(&self, number: ParcelNumber, new_status: ParcelStatus) -> RepoResult<()> {
        self.repo.set_status(number, new_status)
    }

    /// Advances one parcel to its next lifecycle stage.
    ///
    /// Returns the stage the parcel ends up in. Delivered parcels have no
    /// next stage and yield `IllegalTransition`.
    pub fn advance_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
        let parcel = self.repo.get(number)?;
        let next = match parcel.status.next_status() {
            Some(status) => status,
            None => {
                return Err(RepoError::IllegalTransition {
                    number,
                    from: parcel.status,
                    to: parcel.status,
                });
            }
        };
        self.repo.set_status(number, next)?;
        Ok(next)
    }

    /// Removes one parcel record. Unknown numbers are a no-op.
    pub fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.repo.delete(number)
    }

    /// Lists all parcels of one client, ordered by tracking number.
    pub fn client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.repo.get_by_client(client)
    }
}
