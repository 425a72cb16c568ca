// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control Module
//!
//! Trip sharing permissions for TravelMind.
//!
//! ## Flow
//!
//! 1. A handler asks the [`verifier`] whether the current user may read or
//!    edit a trip.
//! 2. The verifier asks the [`resolver`] for the user's effective permission
//!    level, which consults trip ownership and accepted participant rows.
//! 3. Participant rows are created and mutated only through the
//!    [`invitations`] lifecycle (invite -> accept/decline, revoke).
//!
//! Denials surface as typed errors; the caller records them through the
//! audit module. Nothing in this module is cached between calls, so
//! permission changes take effect on the next request.

pub mod invitations;
pub mod resolver;
pub mod verifier;

pub use invitations::{InvitationError, Invitations};
pub use resolver::resolve;
pub use verifier::{verify, AccessDenied, TripAccess};
