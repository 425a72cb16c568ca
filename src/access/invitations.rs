// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Invitation lifecycle for trip participants.
//!
//! A participant row moves through a small state machine:
//!
//! ```text
//! invite -> Pending -> accept  -> Accepted
//!                   -> decline -> Declined
//! ```
//!
//! Accepted and declined are terminal; a declined invitee must be re-invited.
//! The owner (or the invitee themselves) may revoke a row in any state.
//! Transitions are single conditional updates in the store, so concurrent
//! accept/decline calls for the same pair cannot both succeed.

use crate::models::{InvitationStatus, Participant, PermissionLevel, Trip, TripId, User, UserId};
use crate::store::{NewParticipant, ParticipantStore, StoreError, Transition};

use super::resolver;

/// Errors surfaced to handlers as caller errors ("bad request" / "forbidden").
#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    /// Only the trip owner (or an admin) may invite participants.
    #[error("only the trip owner can invite participants")]
    NotOwner,
    /// Ownership cannot be granted through an invitation.
    #[error("owner permission cannot be granted by invitation")]
    OwnerNotGrantable,
    /// The inviter tried to invite themselves.
    #[error("cannot invite yourself")]
    SelfInvitation,
    /// A participant row already exists for the pair.
    #[error("user {user_id} is already invited to trip {trip_id}")]
    AlreadyInvited { trip_id: TripId, user_id: UserId },
    /// No participant row exists for the pair.
    #[error("user {user_id} is not invited to trip {trip_id}")]
    NotInvited { trip_id: TripId, user_id: UserId },
    /// The row is not in the state the transition requires.
    #[error("invitation is {current}, expected pending")]
    InvalidTransition { current: InvitationStatus },
    /// The actor may not remove this participant row.
    #[error("not allowed to remove this participant")]
    RevokeDenied,
    /// The participant row does not belong to the given trip.
    #[error("participant row belongs to trip {row_trip_id}, not trip {trip_id}")]
    TripMismatch { trip_id: TripId, row_trip_id: TripId },
    /// The durable store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Invitation operations over a participant store.
pub struct Invitations<'a> {
    participants: &'a dyn ParticipantStore,
}

impl<'a> Invitations<'a> {
    pub fn new(participants: &'a dyn ParticipantStore) -> Self {
        Self { participants }
    }

    /// Invite `invitee_id` to `trip` with the given permission level.
    ///
    /// The inviter must resolve to `Owner` on the trip (admins qualify).
    /// Creates the row in `Pending` state.
    ///
    /// # Errors
    /// Rejects owner grants, self-invitations, and duplicate pairs.
    pub fn invite(
        &self,
        inviter: &User,
        trip: &Trip,
        invitee_id: UserId,
        permission: PermissionLevel,
    ) -> Result<Participant, InvitationError> {
        if resolver::resolve(inviter, trip, self.participants)? != Some(PermissionLevel::Owner) {
            return Err(InvitationError::NotOwner);
        }

        if permission == PermissionLevel::Owner {
            return Err(InvitationError::OwnerNotGrantable);
        }

        if invitee_id == inviter.id {
            return Err(InvitationError::SelfInvitation);
        }

        match self.participants.insert(NewParticipant {
            trip_id: trip.id,
            user_id: invitee_id,
            permission,
        }) {
            Ok(row) => Ok(row),
            Err(StoreError::AlreadyExists(_)) => Err(InvitationError::AlreadyInvited {
                trip_id: trip.id,
                user_id: invitee_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Accept a pending invitation; stamps `accepted_at`.
    ///
    /// # Errors
    /// Re-accepting or accepting a declined invitation fails with
    /// [`InvitationError::InvalidTransition`].
    pub fn accept(
        &self,
        invitee_id: UserId,
        trip_id: TripId,
    ) -> Result<Participant, InvitationError> {
        self.apply(invitee_id, trip_id, InvitationStatus::Accepted)
    }

    /// Decline a pending invitation.
    ///
    /// # Errors
    /// Declining a non-pending invitation fails with
    /// [`InvitationError::InvalidTransition`].
    pub fn decline(
        &self,
        invitee_id: UserId,
        trip_id: TripId,
    ) -> Result<Participant, InvitationError> {
        self.apply(invitee_id, trip_id, InvitationStatus::Declined)
    }

    fn apply(
        &self,
        invitee_id: UserId,
        trip_id: TripId,
        to: InvitationStatus,
    ) -> Result<Participant, InvitationError> {
        match self
            .participants
            .transition(trip_id, invitee_id, InvitationStatus::Pending, to)?
        {
            Transition::Applied(row) => Ok(row),
            Transition::Missing => Err(InvitationError::NotInvited {
                trip_id,
                user_id: invitee_id,
            }),
            Transition::Conflict(current) => {
                Err(InvitationError::InvalidTransition { current })
            }
        }
    }

    /// Remove a participant row, whatever its status.
    ///
    /// Allowed for actors resolving to `Owner` on the trip (covers admins)
    /// and for the invitee removing themselves ("leave trip").
    ///
    /// # Errors
    /// The row must belong to `trip`; ownership of one trip must never
    /// authorize deletions on another.
    pub fn revoke(
        &self,
        actor: &User,
        trip: &Trip,
        row: &Participant,
    ) -> Result<(), InvitationError> {
        if row.trip_id != trip.id {
            return Err(InvitationError::TripMismatch {
                trip_id: trip.id,
                row_trip_id: row.trip_id,
            });
        }

        let self_removal = actor.id == row.user_id;
        let is_owner =
            resolver::resolve(actor, trip, self.participants)? == Some(PermissionLevel::Owner);

        if !self_removal && !is_owner {
            tracing::warn!(
                trip_id = trip.id,
                actor_id = actor.id,
                participant_user_id = row.user_id,
                "participant_revoke_denied"
            );
            return Err(InvitationError::RevokeDenied);
        }

        if !self.participants.remove(row.trip_id, row.user_id)? {
            return Err(InvitationError::NotInvited {
                trip_id: row.trip_id,
                user_id: row.user_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn owner() -> User {
        User::new(10, "alice")
    }

    fn trip() -> Trip {
        Trip::new(1, 10)
    }

    #[test]
    fn invite_creates_pending_row() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();

        assert_eq!(row.invitation_status, InvitationStatus::Pending);
        assert_eq!(row.permission, PermissionLevel::Editor);
        assert!(row.accepted_at.is_none());
    }

    #[test]
    fn non_owner_cannot_invite() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);
        let stranger = User::new(30, "mallory");

        let err = invitations
            .invite(&stranger, &trip(), 20, PermissionLevel::Viewer)
            .unwrap_err();
        assert!(matches!(err, InvitationError::NotOwner));

        // An accepted editor still is not owner-equivalent
        invitations
            .invite(&owner(), &trip(), 30, PermissionLevel::Editor)
            .unwrap();
        invitations.accept(30, 1).unwrap();
        let err = invitations
            .invite(&stranger, &trip(), 20, PermissionLevel::Viewer)
            .unwrap_err();
        assert!(matches!(err, InvitationError::NotOwner));
    }

    #[test]
    fn admin_may_invite_on_any_trip() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);
        let admin = User::admin(99, "root");

        let row = invitations
            .invite(&admin, &trip(), 20, PermissionLevel::Viewer)
            .unwrap();
        assert_eq!(row.user_id, 20);
    }

    #[test]
    fn owner_grant_rejected() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let err = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Owner)
            .unwrap_err();
        assert!(matches!(err, InvitationError::OwnerNotGrantable));
    }

    #[test]
    fn self_invitation_rejected() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let err = invitations
            .invite(&owner(), &trip(), 10, PermissionLevel::Editor)
            .unwrap_err();
        assert!(matches!(err, InvitationError::SelfInvitation));
    }

    #[test]
    fn duplicate_invite_rejected() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        let err = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Viewer)
            .unwrap_err();
        assert!(matches!(
            err,
            InvitationError::AlreadyInvited {
                trip_id: 1,
                user_id: 20
            }
        ));
    }

    #[test]
    fn accept_stamps_accepted_at() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        let row = invitations.accept(20, 1).unwrap();

        assert_eq!(row.invitation_status, InvitationStatus::Accepted);
        assert!(row.accepted_at.is_some());
    }

    #[test]
    fn accept_twice_is_invalid_transition() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        invitations.accept(20, 1).unwrap();

        let err = invitations.accept(20, 1).unwrap_err();
        assert!(matches!(
            err,
            InvitationError::InvalidTransition {
                current: InvitationStatus::Accepted
            }
        ));
    }

    #[test]
    fn accept_after_decline_is_invalid_transition() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Viewer)
            .unwrap();
        invitations.decline(20, 1).unwrap();

        let err = invitations.accept(20, 1).unwrap_err();
        assert!(matches!(
            err,
            InvitationError::InvalidTransition {
                current: InvitationStatus::Declined
            }
        ));

        let err = invitations.decline(20, 1).unwrap_err();
        assert!(matches!(err, InvitationError::InvalidTransition { .. }));
    }

    #[test]
    fn accept_without_invite_fails() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let err = invitations.accept(20, 1).unwrap_err();
        assert!(matches!(
            err,
            InvitationError::NotInvited {
                trip_id: 1,
                user_id: 20
            }
        ));
    }

    #[test]
    fn owner_revokes_any_row() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        invitations.revoke(&owner(), &trip(), &row).unwrap();
        assert!(store.find(1, 20).unwrap().is_none());
    }

    #[test]
    fn invitee_may_leave() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        invitations.accept(20, 1).unwrap();

        let invitee = User::new(20, "bob");
        invitations.revoke(&invitee, &trip(), &row).unwrap();
        assert!(store.find(1, 20).unwrap().is_none());
    }

    #[test]
    fn third_party_cannot_revoke() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();

        let other = User::new(30, "mallory");
        let err = invitations.revoke(&other, &trip(), &row).unwrap_err();
        assert!(matches!(err, InvitationError::RevokeDenied));
        assert!(store.find(1, 20).unwrap().is_some());
    }

    #[test]
    fn revoke_rejects_row_from_another_trip() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();

        // Owning an unrelated trip must not authorize deletions on this one
        let other_owner = User::new(30, "mallory");
        let other_trip = Trip::new(2, 30);
        let err = invitations
            .revoke(&other_owner, &other_trip, &row)
            .unwrap_err();
        assert!(matches!(
            err,
            InvitationError::TripMismatch {
                trip_id: 2,
                row_trip_id: 1
            }
        ));
        assert!(store.find(1, 20).unwrap().is_some());

        // The mismatch is rejected even for the row's own trip owner
        let err = invitations.revoke(&owner(), &other_trip, &row).unwrap_err();
        assert!(matches!(err, InvitationError::TripMismatch { .. }));
    }

    #[test]
    fn admin_may_revoke() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Viewer)
            .unwrap();

        let admin = User::admin(99, "root");
        invitations.revoke(&admin, &trip(), &row).unwrap();
        assert!(store.find(1, 20).unwrap().is_none());
    }

    #[test]
    fn participant_list_reflects_lifecycle() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        let viewer_row = invitations
            .invite(&owner(), &trip(), 21, PermissionLevel::Viewer)
            .unwrap();
        invitations.accept(20, 1).unwrap();

        let rows = store.list_for_trip(1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, 20);
        assert_eq!(rows[0].invitation_status, InvitationStatus::Accepted);
        assert_eq!(rows[1].invitation_status, InvitationStatus::Pending);

        invitations.revoke(&owner(), &trip(), &viewer_row).unwrap();
        assert_eq!(store.list_for_trip(1).unwrap().len(), 1);
    }

    #[test]
    fn declined_row_can_be_revoked_and_reinvited() {
        let store = MemoryStore::new();
        let invitations = Invitations::new(&store);

        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        invitations.decline(20, 1).unwrap();

        invitations.revoke(&owner(), &trip(), &row).unwrap();
        let row = invitations
            .invite(&owner(), &trip(), 20, PermissionLevel::Editor)
            .unwrap();
        assert_eq!(row.invitation_status, InvitationStatus::Pending);
    }
}
