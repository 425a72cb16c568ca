// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit event recording.
//!
//! The recorder builds entries and hands them to a sink. A failed append is
//! logged and swallowed: audit logging must never break the operation it is
//! recording. Handlers therefore treat every `record_*` call as infallible
//! and check the `Option` only when they need the persisted entry.

use std::sync::Arc;

use crate::models::UserId;

use super::event::{AuditCategory, AuditLogEntry, AuditStatus, RequestContext};

/// Error type for sink implementations.
#[derive(Debug, thiserror::Error)]
pub enum AuditSinkError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid audit date: {0}")]
    InvalidDate(#[from] chrono::format::ParseError),
    #[error("audit queue full")]
    QueueFull,
    #[error("audit sink closed")]
    Closed,
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    /// Persist one entry.
    fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError>;
}

/// Central audit recorder shared across request handlers.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record a fully-built entry.
    ///
    /// Returns the entry on success, `None` if the sink failed. The failure
    /// is reported on the diagnostic channel and never propagated.
    pub fn record(&self, entry: AuditLogEntry) -> Option<AuditLogEntry> {
        match self.sink.append(&entry) {
            Ok(()) => {
                tracing::info!(
                    event_type = %entry.event_type,
                    category = %entry.event_category,
                    user_id = entry.user_id,
                    status = ?entry.status,
                    "audit_event"
                );
                Some(entry)
            }
            Err(e) => {
                tracing::error!(
                    event_type = %entry.event_type,
                    error = %e,
                    "audit_log_failed"
                );
                None
            }
        }
    }

    /// Record an authentication event (`auth.login`, `auth.login_failed`, ...).
    pub fn record_auth_event(
        &self,
        event: &str,
        user: Option<(UserId, &str)>,
        status: AuditStatus,
        ctx: &RequestContext,
    ) -> Option<AuditLogEntry> {
        let mut entry = AuditLogEntry::new(format!("auth.{event}"), AuditCategory::Auth)
            .with_description(format!("Authentication event: {event}"))
            .with_status(status)
            .with_request(ctx);
        if let Some((user_id, username)) = user {
            entry = entry.with_user(user_id, username);
        }
        self.record(entry)
    }

    /// Record a data mutation event; `event_type` becomes
    /// `"<resource_type>.<action>"`.
    pub fn record_data_event(
        &self,
        action: &str,
        resource_type: &str,
        resource_id: i64,
        user: (UserId, &str),
        status: AuditStatus,
        ctx: &RequestContext,
    ) -> Option<AuditLogEntry> {
        let mut description = capitalize(action);
        description.push_str(&format!(" {resource_type} (ID: {resource_id})"));

        let entry = AuditLogEntry::new(
            format!("{resource_type}.{action}"),
            AuditCategory::Data,
        )
        .with_user(user.0, user.1)
        .with_resource(resource_type, resource_id)
        .with_description(description)
        .with_status(status)
        .with_request(ctx);
        self.record(entry)
    }

    /// Record an admin action (`admin.user_delete`, `admin.settings_change`, ...).
    pub fn record_admin_event(
        &self,
        action: &str,
        admin: (UserId, &str),
        target_user_id: Option<UserId>,
        status: AuditStatus,
        ctx: &RequestContext,
    ) -> Option<AuditLogEntry> {
        let mut description = format!("Admin action: {action}");
        if let Some(target) = target_user_id {
            description.push_str(&format!(" on user {target}"));
        }

        let mut entry = AuditLogEntry::new(format!("admin.{action}"), AuditCategory::Admin)
            .with_user(admin.0, admin.1)
            .with_description(description)
            .with_status(status)
            .with_request(ctx);
        if let Some(target) = target_user_id {
            entry = entry.with_resource("user", target);
        }
        self.record(entry)
    }

    /// Record a security event (`security.permission_denied`, ...).
    /// Always recorded with warning status.
    pub fn record_security_event(
        &self,
        event: &str,
        user: Option<(UserId, &str)>,
        details: Option<serde_json::Value>,
        ctx: &RequestContext,
    ) -> Option<AuditLogEntry> {
        let mut entry = AuditLogEntry::new(format!("security.{event}"), AuditCategory::Security)
            .with_description(format!("Security event: {event}"))
            .with_status(AuditStatus::Warning)
            .with_request(ctx);
        if let Some((user_id, username)) = user {
            entry = entry.with_user(user_id, username);
        }
        if let Some(details) = details {
            entry = entry.with_details(details);
        }
        self.record(entry)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that collects entries, or fails on demand.
    #[derive(Default)]
    struct TestSink {
        entries: Mutex<Vec<AuditLogEntry>>,
        fail: bool,
    }

    impl AuditSink for TestSink {
        fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
            if self.fail {
                return Err(AuditSinkError::Closed);
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn recorder_with_sink(fail: bool) -> (AuditRecorder, Arc<TestSink>) {
        let sink = Arc::new(TestSink {
            fail,
            ..Default::default()
        });
        (AuditRecorder::new(sink.clone()), sink)
    }

    #[test]
    fn auth_event_uses_canonical_name() {
        let (recorder, sink) = recorder_with_sink(false);

        let entry = recorder
            .record_auth_event(
                "login_failed",
                Some((7, "alice")),
                AuditStatus::Failure,
                &RequestContext::default(),
            )
            .unwrap();

        assert_eq!(entry.event_type, "auth.login_failed");
        assert_eq!(entry.event_category, AuditCategory::Auth);
        assert_eq!(entry.status, AuditStatus::Failure);
        assert_eq!(sink.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn data_event_combines_resource_and_action() {
        let (recorder, _sink) = recorder_with_sink(false);

        let entry = recorder
            .record_data_event(
                "update",
                "trip",
                42,
                (7, "alice"),
                AuditStatus::Success,
                &RequestContext::default(),
            )
            .unwrap();

        assert_eq!(entry.event_type, "trip.update");
        assert_eq!(entry.resource_type.as_deref(), Some("trip"));
        assert_eq!(entry.resource_id, Some(42));
        assert_eq!(entry.description.as_deref(), Some("Update trip (ID: 42)"));
    }

    #[test]
    fn admin_event_targets_user_resource() {
        let (recorder, _sink) = recorder_with_sink(false);

        let entry = recorder
            .record_admin_event(
                "user_delete",
                (1, "root"),
                Some(55),
                AuditStatus::Success,
                &RequestContext::default(),
            )
            .unwrap();

        assert_eq!(entry.event_type, "admin.user_delete");
        assert_eq!(entry.resource_type.as_deref(), Some("user"));
        assert_eq!(entry.resource_id, Some(55));
        assert_eq!(
            entry.description.as_deref(),
            Some("Admin action: user_delete on user 55")
        );
    }

    #[test]
    fn security_event_is_always_warning() {
        let (recorder, _sink) = recorder_with_sink(false);

        let entry = recorder
            .record_security_event(
                "permission_denied",
                Some((30, "mallory")),
                Some(serde_json::json!({ "trip_id": 1 })),
                &RequestContext::default(),
            )
            .unwrap();

        assert_eq!(entry.event_type, "security.permission_denied");
        assert_eq!(entry.status, AuditStatus::Warning);
        assert_eq!(entry.details.unwrap()["trip_id"], 1);
    }

    #[test]
    fn sink_failure_is_swallowed() {
        let (recorder, sink) = recorder_with_sink(true);

        let result = recorder.record_auth_event(
            "login",
            Some((7, "alice")),
            AuditStatus::Success,
            &RequestContext::default(),
        );

        assert!(result.is_none());
        assert!(sink.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_event_names_keep_category_prefix() {
        let (recorder, _sink) = recorder_with_sink(false);

        let entry = recorder
            .record_security_event("weird_new_event", None, None, &RequestContext::default())
            .unwrap();
        assert_eq!(entry.event_type, "security.weird_new_event");

        let entry = recorder
            .record_auth_event(
                "mfa_challenge",
                None,
                AuditStatus::Success,
                &RequestContext::default(),
            )
            .unwrap();
        assert_eq!(entry.event_type, "auth.mfa_challenge");
    }

    #[test]
    fn request_context_lands_on_entry() {
        let (recorder, _sink) = recorder_with_sink(false);
        let ctx = RequestContext {
            forwarded_for: Some("203.0.113.7".to_string()),
            remote_addr: Some("10.0.0.1".to_string()),
            user_agent: Some("test-agent".to_string()),
            method: Some("POST".to_string()),
            path: Some("/api/trips/1".to_string()),
        };

        let entry = recorder
            .record_data_event("create", "trip", 1, (7, "alice"), AuditStatus::Success, &ctx)
            .unwrap();

        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(entry.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(entry.request_method.as_deref(), Some("POST"));
        assert_eq!(entry.request_path.as_deref(), Some("/api/trips/1"));
    }
}
