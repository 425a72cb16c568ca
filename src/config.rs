// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! by the security core. Configuration is loaded from the environment at
//! startup by the host application.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TRAVELMIND_SECRET_KEY` | Master secret for per-user key derivation | Required |
//! | `AUDIT_DIR` | Directory for JSONL audit log files | `./audit` |

/// Environment variable name for the master secret.
///
/// All per-user encryption keys are derived from this value plus the user's
/// unique salt. Rotating it invalidates every stored secret uniformly:
/// decryption fails closed and users are prompted to re-enter their keys.
pub const SECRET_KEY_ENV: &str = "TRAVELMIND_SECRET_KEY";

/// Environment variable name for the audit log directory.
///
/// Daily audit files are written as `{AUDIT_DIR}/{date}.jsonl`.
pub const AUDIT_DIR_ENV: &str = "AUDIT_DIR";

/// Default audit log directory when `AUDIT_DIR` is unset.
pub const DEFAULT_AUDIT_DIR: &str = "./audit";
