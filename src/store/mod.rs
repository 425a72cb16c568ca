// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Durable Store Traits
//!
//! The access-control core reads trips and participant rows from a durable
//! store owned by the host application (SQL in production). This module
//! defines the minimal trait surface the core needs, plus an in-memory
//! implementation used by tests and by embedders without a real database.
//!
//! Invitation state transitions go through [`ParticipantStore::transition`],
//! a single conditional update, so concurrent accept/decline calls for the
//! same (trip, user) pair cannot both succeed.

pub mod memory;

pub use memory::MemoryStore;

use crate::models::{InvitationStatus, Participant, PermissionLevel, Trip, TripId, UserId};

/// Error type for durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entity was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was violated.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The underlying store failed (connection lost, disk full, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a conditional invitation-status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The row was in the expected state and has been updated.
    Applied(Participant),
    /// No row exists for the (trip, user) pair.
    Missing,
    /// A row exists but is not in the expected state.
    Conflict(InvitationStatus),
}

/// Fields for a new participant row; the store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub permission: PermissionLevel,
}

/// Read access to trips.
pub trait TripStore {
    /// Look up a trip by id.
    fn trip(&self, trip_id: TripId) -> StoreResult<Option<Trip>>;
}

/// Read/write access to participant rows.
pub trait ParticipantStore {
    /// Look up the unique participant row for a (trip, user) pair.
    fn find(&self, trip_id: TripId, user_id: UserId) -> StoreResult<Option<Participant>>;

    /// List all participant rows for a trip.
    fn list_for_trip(&self, trip_id: TripId) -> StoreResult<Vec<Participant>>;

    /// Insert a new row in `Pending` state.
    ///
    /// # Errors
    /// Returns `StoreError::AlreadyExists` if a row for the pair exists.
    fn insert(&self, row: NewParticipant) -> StoreResult<Participant>;

    /// Conditionally move a row from `from` to `to`.
    ///
    /// Must be atomic with respect to concurrent transitions for the same
    /// pair. Stamps `accepted_at` when `to` is `Accepted`.
    fn transition(
        &self,
        trip_id: TripId,
        user_id: UserId,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> StoreResult<Transition>;

    /// Delete the row for a (trip, user) pair, whatever its status.
    ///
    /// Returns `true` if a row was deleted.
    fn remove(&self, trip_id: TripId, user_id: UserId) -> StoreResult<bool>;
}
