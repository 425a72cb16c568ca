// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access verification for trip handlers.
//!
//! Handlers call [`verify`] before any read (`require_edit = false`) or
//! mutation (`require_edit = true`) of a shared trip and translate a denial
//! into their transport-layer response. The verifier itself only reads;
//! recording a `security.permission_denied` audit event on denial is the
//! caller's responsibility.

use crate::models::{PermissionLevel, Trip, TripId, User, UserId};
use crate::store::{ParticipantStore, StoreError, TripStore};

use super::resolver;

/// A granted access check: the loaded trip plus the effective level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripAccess {
    pub trip: Trip,
    pub level: PermissionLevel,
}

/// Typed denial returned by [`verify`].
///
/// Handlers map `TripNotFound` to 404 and the other variants to 403. The
/// message text deliberately carries no other user's permission state.
#[derive(Debug, thiserror::Error)]
pub enum AccessDenied {
    /// The trip does not exist.
    #[error("trip {trip_id} not found")]
    TripNotFound { trip_id: TripId },
    /// The user has no access to the trip at all.
    #[error("access denied")]
    NoAccess { trip_id: TripId, user_id: UserId },
    /// The user may view the trip but the operation requires edit permission.
    #[error("edit permission required")]
    EditRequired {
        trip_id: TripId,
        user_id: UserId,
        level: PermissionLevel,
    },
    /// The durable store failed while checking.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Verify that `user` may operate on trip `trip_id`.
///
/// Resolves the effective permission level and checks it against the
/// requested operation. Returns the loaded trip together with the level so
/// handlers do not have to fetch it again.
///
/// # Errors
/// Returns [`AccessDenied`] if the trip is missing, the user has no access,
/// or `require_edit` is set and the user is a viewer.
pub fn verify(
    user: &User,
    trip_id: TripId,
    require_edit: bool,
    trips: &dyn TripStore,
    participants: &dyn ParticipantStore,
) -> Result<TripAccess, AccessDenied> {
    let Some(trip) = trips.trip(trip_id)? else {
        return Err(AccessDenied::TripNotFound { trip_id });
    };

    let Some(level) = resolver::resolve(user, &trip, participants)? else {
        tracing::warn!(
            trip_id,
            user_id = user.id,
            owner_id = trip.owner_id,
            "unauthorized_trip_access"
        );
        return Err(AccessDenied::NoAccess {
            trip_id,
            user_id: user.id,
        });
    };

    if require_edit && !level.can_edit() {
        tracing::warn!(
            trip_id,
            user_id = user.id,
            permission = %level,
            required = "editor",
            "insufficient_permission"
        );
        return Err(AccessDenied::EditRequired {
            trip_id,
            user_id: user.id,
            level,
        });
    }

    Ok(TripAccess { trip, level })
}
