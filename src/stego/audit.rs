// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Audit trail for encode and decode calls.
//!
//! The pipeline reports stage events to an [`AuditSink`] passed in by the
//! caller. [`TracingAudit`] forwards them to `tracing`, [`MemoryAudit`]
//! keeps them for inspection and [`NullAudit`] drops them. Debug-level
//! events are only emitted when the call's `debug` option is set.
//!
//! Records never contain plaintext, passwords or key material.

use std::sync::Mutex;

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
}

/// One audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub level: AuditLevel,
    pub stage: &'static str,
    pub message: String,
}

/// Receiver of pipeline audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, level: AuditLevel, stage: &'static str, message: &str);
}

/// Forwards records to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, level: AuditLevel, stage: &'static str, message: &str) {
        match level {
            AuditLevel::Debug => tracing::debug!(stage, "{message}"),
            AuditLevel::Info => tracing::info!(stage, "{message}"),
            AuditLevel::Warn => tracing::warn!(stage, "{message}"),
        }
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _level: AuditLevel, _stage: &'static str, _message: &str) {}
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<&'static str> {
        self.records().iter().map(|r| r.stage).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut r) = self.records.lock() {
            r.clear();
        }
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, level: AuditLevel, stage: &'static str, message: &str) {
        if let Ok(mut r) = self.records.lock() {
            r.push(AuditRecord { level, stage, message: message.to_string() });
        }
    }
}

/// Per-call handle that applies the `debug` switch.
#[derive(Clone, Copy)]
pub(crate) struct Audit<'a> {
    sink: &'a dyn AuditSink,
    verbose: bool,
}

impl<'a> Audit<'a> {
    pub(crate) fn new(sink: &'a dyn AuditSink, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    /// Debug detail; the message is only built when verbose.
    pub(crate) fn debug(&self, stage: &'static str, message: impl FnOnce() -> String) {
        if self.verbose {
            self.sink.record(AuditLevel::Debug, stage, &message());
        }
    }

    pub(crate) fn info(&self, stage: &'static str, message: &str) {
        self.sink.record(AuditLevel::Info, stage, message);
    }

    pub(crate) fn warn(&self, stage: &'static str, message: &str) {
        self.sink.record(AuditLevel::Warn, stage, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_audit_collects() {
        let sink = MemoryAudit::new();
        let audit = Audit::new(&sink, false);
        audit.info("embed", "done");
        audit.debug("embed", || "hidden".to_string());
        audit.warn("quality", "low psnr");
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stage, "embed");
        assert_eq!(records[1].level, AuditLevel::Warn);
        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn verbose_emits_debug() {
        let sink = MemoryAudit::new();
        Audit::new(&sink, true).debug("header", || "len=40".to_string());
        assert_eq!(sink.records()[0].level, AuditLevel::Debug);
    }

    #[test]
    fn tracing_and_null_sinks_accept_records() {
        TracingAudit.record(AuditLevel::Info, "stage", "message");
        NullAudit.record(AuditLevel::Warn, "stage", "message");
    }
}
