// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store backing tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::models::{InvitationStatus, Participant, Trip, TripId, UserId};

use super::{NewParticipant, ParticipantStore, StoreError, StoreResult, Transition, TripStore};

#[derive(Default)]
struct Inner {
    trips: HashMap<TripId, Trip>,
    participants: HashMap<(TripId, UserId), Participant>,
    next_participant_id: i64,
}

/// Mutex-guarded in-memory implementation of the store traits.
///
/// Transitions run entirely under the lock, which gives the same
/// conditional-update guarantee a SQL `UPDATE ... WHERE status = ?` gives.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a trip.
    pub fn put_trip(&self, trip: Trip) {
        self.lock().trips.insert(trip.id, trip);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked while holding
        // it; every update here leaves the maps consistent, so keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TripStore for MemoryStore {
    fn trip(&self, trip_id: TripId) -> StoreResult<Option<Trip>> {
        Ok(self.lock().trips.get(&trip_id).cloned())
    }
}

impl ParticipantStore for MemoryStore {
    fn find(&self, trip_id: TripId, user_id: UserId) -> StoreResult<Option<Participant>> {
        Ok(self.lock().participants.get(&(trip_id, user_id)).cloned())
    }

    fn list_for_trip(&self, trip_id: TripId) -> StoreResult<Vec<Participant>> {
        let inner = self.lock();
        let mut rows: Vec<Participant> = inner
            .participants
            .values()
            .filter(|row| row.trip_id == trip_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn insert(&self, row: NewParticipant) -> StoreResult<Participant> {
        let mut inner = self.lock();
        let key = (row.trip_id, row.user_id);
        if inner.participants.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!(
                "participant (trip {}, user {})",
                row.trip_id, row.user_id
            )));
        }

        inner.next_participant_id += 1;
        let participant = Participant {
            id: inner.next_participant_id,
            trip_id: row.trip_id,
            user_id: row.user_id,
            permission: row.permission,
            invitation_status: InvitationStatus::Pending,
            invited_at: Utc::now(),
            accepted_at: None,
        };
        inner.participants.insert(key, participant.clone());
        Ok(participant)
    }

    fn transition(
        &self,
        trip_id: TripId,
        user_id: UserId,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> StoreResult<Transition> {
        let mut inner = self.lock();
        let Some(row) = inner.participants.get_mut(&(trip_id, user_id)) else {
            return Ok(Transition::Missing);
        };

        if row.invitation_status != from {
            return Ok(Transition::Conflict(row.invitation_status));
        }

        row.invitation_status = to;
        if to == InvitationStatus::Accepted {
            row.accepted_at = Some(Utc::now());
        }
        Ok(Transition::Applied(row.clone()))
    }

    fn remove(&self, trip_id: TripId, user_id: UserId) -> StoreResult<bool> {
        Ok(self
            .lock()
            .participants
            .remove(&(trip_id, user_id))
            .is_some())
    }
}
