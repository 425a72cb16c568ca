// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TravelMind Core - Access Control, Secret Vault & Audit Logging
//!
//! This crate provides the security core of the TravelMind travel planner:
//! deciding who may read or edit a shared trip, encrypting per-user API keys
//! at rest, and recording an audit trail of security-relevant actions.
//!
//! The HTTP layer and the ORM live in the host application; handlers call
//! into this crate before touching trip data and after every mutation.
//!
//! ## Modules
//!
//! - `access` - Permission resolution, access verification, invitation lifecycle
//! - `audit` - Audit event recording (JSONL sink, bounded background queue)
//! - `models` - Users, trips, participants, permission levels
//! - `store` - Durable store traits + in-memory implementation
//! - `vault` - Per-user secret encryption (PBKDF2 + AES-256-GCM)

pub mod access;
pub mod audit;
pub mod config;
pub mod models;
pub mod store;
pub mod vault;
