// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Core Data Models
//!
//! This module defines the data model the access-control core operates on:
//! users, trips, and the participant rows that grant shared access.
//!
//! The durable representation (SQL tables, migrations) is owned by the host
//! application; these types are the in-process view the resolver, verifier,
//! and invitation lifecycle work against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier for a user.
pub type UserId = i64;

/// Stable identifier for a trip.
pub type TripId = i64;

// =============================================================================
// Users
// =============================================================================

/// An authenticated principal.
///
/// `secret_salt` and `encrypted_secret` back the per-user API key vault.
/// An `encrypted_secret` must never exist without its matching salt; the
/// vault fails closed when the pairing is broken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name, retained in audit entries even after user deletion.
    pub username: String,
    /// Administrators bypass all trip-level permission checks.
    pub is_admin: bool,
    /// Per-user KDF salt (base64url), generated once when a secret is first stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_salt: Option<String>,
    /// Encrypted external API key (base64), present only if a secret is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_secret: Option<String>,
}

impl User {
    /// Create a regular (non-admin) user with no stored secret.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: false,
            secret_salt: None,
            encrypted_secret: None,
        }
    }

    /// Create an administrator.
    pub fn admin(id: UserId, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id, username)
        }
    }
}

// =============================================================================
// Trips
// =============================================================================

/// A shared, ownable resource.
///
/// Ownership is set at creation and immutable afterwards; transfer is not
/// supported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trip {
    /// Unique trip identifier.
    pub id: TripId,
    /// The user who created (and owns) this trip.
    pub owner_id: UserId,
}

impl Trip {
    /// Create a trip owned by `owner_id`.
    pub fn new(id: TripId, owner_id: UserId) -> Self {
        Self { id, owner_id }
    }
}

// =============================================================================
// Permission Levels
// =============================================================================

/// Effective permission a user holds on a trip.
///
/// ## Hierarchy
///
/// - `Owner` - Full access including participant management
/// - `Editor` - May read and mutate trip data
/// - `Viewer` - Read-only access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Full access (trip owner or administrator).
    Owner,
    /// Read and write access.
    Editor,
    /// Read-only access.
    Viewer,
}

impl PermissionLevel {
    /// Whether this level permits mutating the trip.
    pub fn can_edit(self) -> bool {
        matches!(self, PermissionLevel::Owner | PermissionLevel::Editor)
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionLevel::Owner => write!(f, "owner"),
            PermissionLevel::Editor => write!(f, "editor"),
            PermissionLevel::Viewer => write!(f, "viewer"),
        }
    }
}

// =============================================================================
// Participants
// =============================================================================

/// Invitation state of a participant row.
///
/// A participant grants access only while `Accepted`; `Pending` and
/// `Declined` rows grant nothing regardless of their permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Invited, not yet answered.
    Pending,
    /// Invitation accepted; the permission level is in effect.
    Accepted,
    /// Invitation declined; a new invite is required.
    Declined,
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Declined => write!(f, "declined"),
        }
    }
}

/// A non-owner user's access grant on a trip.
///
/// At most one row exists per (trip, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Unique row identifier.
    pub id: i64,
    /// The trip this grant applies to.
    pub trip_id: TripId,
    /// The invited user.
    pub user_id: UserId,
    /// Granted permission level (never `Owner`; ownership is not grantable).
    pub permission: PermissionLevel,
    /// Current lifecycle state.
    pub invitation_status: InvitationStatus,
    /// When the invitation was created.
    pub invited_at: DateTime<Utc>,
    /// Set exactly once, on the pending -> accepted transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Participant {
    /// Whether this row currently grants any access.
    pub fn grants_access(&self) -> bool {
        self.invitation_status == InvitationStatus::Accepted
    }
}
