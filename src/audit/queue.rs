// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded background queue in front of another sink.
//!
//! Moves audit persistence off the request path: `append` enqueues and
//! returns immediately, a writer thread drains the queue into the inner
//! sink. The queue is bounded; when it is full the newest entry is dropped
//! and counted, so audit volume can never apply backpressure to user-facing
//! operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::event::AuditLogEntry;
use super::recorder::{AuditSink, AuditSinkError};

/// Default queue capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// Queueing sink wrapping an inner [`AuditSink`].
///
/// Dropping the sink closes the queue and joins the writer thread, flushing
/// whatever is still buffered.
pub struct QueuedAuditSink {
    tx: Option<SyncSender<AuditLogEntry>>,
    writer: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl QueuedAuditSink {
    /// Wrap `inner` with the default queue capacity.
    pub fn new(inner: Arc<dyn AuditSink>) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// Wrap `inner` with an explicit queue capacity.
    pub fn with_capacity(inner: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<AuditLogEntry>(capacity);

        let writer = std::thread::spawn(move || {
            while let Ok(entry) = rx.recv() {
                if let Err(e) = inner.append(&entry) {
                    tracing::error!(
                        event_type = %entry.event_type,
                        error = %e,
                        "audit_log_failed"
                    );
                }
            }
        });

        Self {
            tx: Some(tx),
            writer: Some(writer),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of entries dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditSink for QueuedAuditSink {
    fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
        let Some(tx) = &self.tx else {
            return Err(AuditSinkError::Closed);
        };

        match tx.try_send(entry.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(entry)) => {
                // Drop-newest: losing one audit line beats blocking a request
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event_type = %entry.event_type,
                    "audit_queue_full"
                );
                Err(AuditSinkError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(AuditSinkError::Closed),
        }
    }
}

impl Drop for QueuedAuditSink {
    fn drop(&mut self) {
        // Closing the sender ends the writer's recv loop after it drains
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::AuditCategory;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingSink {
        entries: Mutex<Vec<AuditLogEntry>>,
        delay: Option<Duration>,
    }

    impl AuditSink for CollectingSink {
        fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn entry(event_type: &str) -> AuditLogEntry {
        AuditLogEntry::new(event_type, AuditCategory::Auth)
    }

    #[test]
    fn entries_flow_through_to_inner_sink() {
        let inner = Arc::new(CollectingSink::default());
        {
            let queued = QueuedAuditSink::new(inner.clone());
            queued.append(&entry("auth.login")).unwrap();
            queued.append(&entry("auth.logout")).unwrap();
            // Drop flushes the queue and joins the writer
        }

        let entries = inner.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, "auth.login");
        assert_eq!(entries[1].event_type, "auth.logout");
    }

    #[test]
    fn full_queue_drops_newest_without_blocking() {
        let inner = Arc::new(CollectingSink {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let queued = QueuedAuditSink::with_capacity(inner.clone(), 1);

        // Saturate: the writer is sleeping on the first entry, the second
        // fills the queue, further appends must fail fast instead of waiting.
        let mut saw_full = false;
        for i in 0..20 {
            match queued.append(&entry(&format!("auth.e{i}"))) {
                Ok(()) => {}
                Err(AuditSinkError::QueueFull) => {
                    saw_full = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert!(saw_full);
        assert!(queued.dropped_count() >= 1);
    }

    #[test]
    fn drop_flushes_buffered_entries() {
        let inner = Arc::new(CollectingSink::default());
        {
            let queued = QueuedAuditSink::with_capacity(inner.clone(), 64);
            for i in 0..10 {
                queued.append(&entry(&format!("auth.e{i}"))).unwrap();
            }
        }

        assert_eq!(inner.entries.lock().unwrap().len(), 10);
    }
}
