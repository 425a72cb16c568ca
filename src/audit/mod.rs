// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Audit Logging Module
//!
//! Records security-relevant events: authentication attempts, trip data
//! mutations, admin actions, and permission denials.
//!
//! ## Guarantees
//!
//! - Entries are written once and never updated or deleted here.
//! - A failed audit write is logged to the diagnostic channel and swallowed;
//!   it never aborts the operation being audited.
//! - The queued sink is bounded and never blocks request handlers.
//!
//! ## Storage Layout
//!
//! ```text
//! {AUDIT_DIR}/
//!   2026-08-29.jsonl   # One JSON entry per line, per day
//!   2026-08-30.jsonl
//! ```

pub mod event;
pub mod jsonl;
pub mod queue;
pub mod recorder;

pub use event::{AuditCategory, AuditLogEntry, AuditStatus, RequestContext};
pub use jsonl::JsonlAuditSink;
pub use queue::QueuedAuditSink;
pub use recorder::{AuditRecorder, AuditSink, AuditSinkError};
