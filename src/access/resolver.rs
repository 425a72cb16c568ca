// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Effective permission resolution.
//!
//! A pure read over the data model: no caching, no side effects. Permission
//! must be re-resolved on every access check because participant rows can
//! change between requests.

use crate::models::{PermissionLevel, Trip, User};
use crate::store::{ParticipantStore, StoreResult};

/// Compute the effective permission of `user` on `trip`.
///
/// First match wins:
/// 1. Administrators resolve to `Owner` on every trip.
/// 2. The trip owner resolves to `Owner`.
/// 3. An `Accepted` participant row resolves to its permission level.
/// 4. Otherwise `None`: no access. Pending and declined rows grant nothing.
pub fn resolve(
    user: &User,
    trip: &Trip,
    participants: &dyn ParticipantStore,
) -> StoreResult<Option<PermissionLevel>> {
    if user.is_admin {
        return Ok(Some(PermissionLevel::Owner));
    }

    if trip.owner_id == user.id {
        return Ok(Some(PermissionLevel::Owner));
    }

    let row = participants.find(trip.id, user.id)?;
    Ok(row
        .filter(|row| row.grants_access())
        .map(|row| row.permission))
}
