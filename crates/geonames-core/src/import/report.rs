// crates/geonames-core/src/import/report.rs
use super::Dataset;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How a handler classified one non-ignored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Imported,
    Ignored,
    Errored,
}

/// Running totals of one dataset pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounters {
    pub total_seen: u64,
    pub ignored: u64,
    pub errored: u64,
    pub imported: u64,
}

impl ImportCounters {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Imported => self.imported += 1,
            RowOutcome::Ignored => self.ignored += 1,
            RowOutcome::Errored => self.errored += 1,
        }
    }
}

impl fmt::Display for ImportCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Records: {} / ignored: {} / errors: {} / imported: {}",
            self.total_seen, self.ignored, self.errored, self.imported
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DatasetOutcome {
    Completed,
    /// Disabled, or the source file was missing.
    Skipped(String),
    /// A structural error stopped the pass; rows before it were kept.
    Aborted(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub path: PathBuf,
    pub counters: ImportCounters,
    pub outcome: DatasetOutcome,
    pub elapsed: Duration,
}

impl DatasetReport {
    pub(crate) fn new(dataset: Dataset, path: PathBuf) -> Self {
        Self {
            dataset,
            path,
            counters: ImportCounters::default(),
            outcome: DatasetOutcome::Completed,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == DatasetOutcome::Completed
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<13} ", self.dataset.name())?;
        match &self.outcome {
            DatasetOutcome::Completed => write!(f, "{} ({:.2?})", self.counters, self.elapsed),
            DatasetOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            DatasetOutcome::Aborted(reason) => {
                write!(f, "aborted after {}: {reason}", self.counters)
            }
        }
    }
}

/// Everything a full run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub reports: Vec<DatasetReport>,
    pub tree_size: usize,
    pub tree_depth: usize,
    /// Entities persisted during this run.
    pub entities_created: u64,
    /// Records left staged because their parent never arrived.
    pub staged_remaining: usize,
}

impl ImportSummary {
    pub fn report(&self, dataset: Dataset) -> Option<&DatasetReport> {
        self.reports.iter().find(|r| r.dataset == dataset)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{report}")?;
        }
        write!(
            f,
            "Hierarchy tree: {} nodes, depth {}; entities created: {}, still staged: {}",
            self.tree_size, self.tree_depth, self.entities_created, self.staged_remaining
        )
    }
}
