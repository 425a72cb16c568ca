// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSONL file sink for audit entries.
//!
//! Entries are appended to a daily log file, one JSON object per line.
//! The daily split keeps files small and makes retention policies a matter
//! of deleting old files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::{AUDIT_DIR_ENV, DEFAULT_AUDIT_DIR};

use super::event::AuditLogEntry;
use super::recorder::{AuditSink, AuditSinkError};

/// File-backed audit sink writing `{dir}/{date}.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    dir: PathBuf,
}

impl JsonlAuditSink {
    /// Create a sink writing under `dir`. The directory is created lazily
    /// on the first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a sink from the `AUDIT_DIR` environment variable.
    pub fn from_env() -> Self {
        let dir = std::env::var(AUDIT_DIR_ENV).unwrap_or_else(|_| DEFAULT_AUDIT_DIR.to_string());
        Self::new(dir)
    }

    fn day_file(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{date}.jsonl"))
    }

    /// Read all entries for a date (`%Y-%m-%d`).
    ///
    /// Used by the admin audit view; a missing file means no events that day.
    pub fn read_events(&self, date: &str) -> Result<Vec<AuditLogEntry>, AuditSinkError> {
        let path = self.day_file(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(line)?);
        }
        Ok(entries)
    }

    /// Read all entries between two dates, inclusive.
    pub fn read_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<AuditLogEntry>, AuditSinkError> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;

        let mut all = Vec::new();
        let mut current = start;
        while current <= end {
            let date = current.format("%Y-%m-%d").to_string();
            all.extend(self.read_events(&date)?);
            let Some(next) = current.succ_opt() else {
                break;
            };
            current = next;
        }
        Ok(all)
    }

    /// Directory this sink writes into.
    ///
    /// Exposed for embedders that manage retention themselves by deleting
    /// old day files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, AuditSinkError> {
    Ok(NaiveDate::parse_from_str(date, "%Y-%m-%d")?)
}

impl AuditSink for JsonlAuditSink {
    fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
        fs::create_dir_all(&self.dir)?;

        let date = entry.created_at.format("%Y-%m-%d").to_string();
        let line = serde_json::to_string(entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.day_file(&date))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}
