// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Longest user agent / request path retained on an entry, in characters.
const MAX_FIELD_LEN: usize = 500;

/// Audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    /// Login, logout, registration, token handling.
    Auth,
    /// Trip data reads and mutations.
    Data,
    /// Administrative actions on users and settings.
    Admin,
    /// Denials and suspicious activity.
    Security,
}

impl std::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditCategory::Auth => write!(f, "auth"),
            AuditCategory::Data => write!(f, "data"),
            AuditCategory::Admin => write!(f, "admin"),
            AuditCategory::Security => write!(f, "security"),
        }
    }
}

/// Outcome of the recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
    Warning,
}

/// Request metadata the transport layer hands down with each event.
///
/// The audit core has no HTTP dependency; handlers copy the fields they
/// have available into this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw `X-Forwarded-For` header value, if present.
    pub forwarded_for: Option<String>,
    /// Peer address as seen by the server.
    pub remote_addr: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// HTTP method.
    pub method: Option<String>,
    /// Request path.
    pub path: Option<String>,
}

impl RequestContext {
    /// Client IP, preferring the first hop of `X-Forwarded-For` over the
    /// peer address (the peer is usually the reverse proxy).
    pub fn client_ip(&self) -> Option<String> {
        if let Some(forwarded) = &self.forwarded_for {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Some(first.to_string());
                }
            }
        }
        self.remote_addr.clone()
    }
}

/// An audit log entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub created_at: DateTime<Utc>,
    /// Dotted event name, e.g. `auth.login`, `trip.update`.
    pub event_type: String,
    /// Event category.
    pub event_category: AuditCategory,
    /// User who triggered the event (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Username, stored separately so the label survives user deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Affected resource type (trip, user, diary_entry, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Affected resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<i64>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// User agent, truncated to a bounded length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// HTTP method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    /// Request path, truncated to a bounded length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Additional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Outcome of the operation.
    pub status: AuditStatus,
}

impl AuditLogEntry {
    /// Create a new entry with a fresh ID and timestamp.
    pub fn new(event_type: impl Into<String>, category: AuditCategory) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            event_type: event_type.into(),
            event_category: category,
            user_id: None,
            username: None,
            resource_type: None,
            resource_id: None,
            ip_address: None,
            user_agent: None,
            request_method: None,
            request_path: None,
            description: None,
            details: None,
            status: AuditStatus::Success,
        }
    }

    /// Set the acting user.
    pub fn with_user(mut self, user_id: UserId, username: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.username = Some(username.into());
        self
    }

    /// Set the affected resource.
    pub fn with_resource(mut self, resource_type: impl Into<String>, resource_id: i64) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id);
        self
    }

    /// Attach request metadata, applying the field length bounds.
    pub fn with_request(mut self, ctx: &RequestContext) -> Self {
        self.ip_address = ctx.client_ip();
        self.user_agent = ctx.user_agent.as_deref().map(truncate);
        self.request_method = ctx.method.clone();
        self.request_path = ctx.path.as_deref().map(truncate);
        self
    }

    /// Set the human-readable summary.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set the outcome.
    pub fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = status;
        self
    }
}

fn truncate(value: &str) -> String {
    match value.char_indices().nth(MAX_FIELD_LEN) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
