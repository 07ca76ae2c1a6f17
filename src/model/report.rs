use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observer report classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Anomaly,
    Issue,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A report as submitted by an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub constituency: String,
    pub kind: ReportKind,
    pub severity: Severity,
    pub description: String,
}

/// A stored observer report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub constituency: String,
    pub kind: ReportKind,
    pub severity: Severity,
    pub description: String,
}

/// Append-only store of observer reports.
#[derive(Debug, Default)]
pub struct ReportLog {
    reports: Vec<Report>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay(&mut self, report: Report) {
        self.reports.push(report);
    }

    pub fn append(&mut self, spec: ReportSpec, now: DateTime<Utc>) -> &Report {
        let id = self.reports.last().map(|r| r.id + 1).unwrap_or(1);
        self.reports.push(Report {
            id,
            timestamp: now,
            constituency: spec.constituency,
            kind: spec.kind,
            severity: spec.severity,
            description: spec.description,
        });
        self.reports.last().expect("just pushed")
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }
}
