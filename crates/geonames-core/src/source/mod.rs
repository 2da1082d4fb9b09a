// crates/geonames-core/src/source/mod.rs

//! # Row Source
//!
//! Handles the physical layer (file, zip / gzip wrapper, tab dialect) and
//! hands out raw rows lazily, in source order. Three strategies trade
//! memory for throughput, see [`MemoryMode`].
//!
//! A [`RowSource`] is a reusable description; every call to
//! [`RowSource::open`] re-runs the pre-processors and starts from the top.

mod common_io;
mod preprocess;
mod row;

pub use common_io::{member_name, open_stream, Wrapper};
pub use preprocess::PreProcessor;
pub use row::{RawRow, SourceRow};

use crate::config::{AllowList, MemoryMode, DEFAULT_CHUNK_SIZE};
use crate::error::Result;
use csv::{ReaderBuilder, StringRecord};
use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Predicate deciding whether a row is kept. `false` marks it ignored.
pub type RowPredicate = Rc<dyn Fn(&RawRow) -> bool>;

/// Builder for a lazy row stream over one dump file.
pub struct RowSource {
    path: PathBuf,
    fields: Arc<[String]>,
    mode: MemoryMode,
    chunk_size: usize,
    filter: Option<RowPredicate>,
    pre_processors: Vec<PreProcessor>,
}

impl RowSource {
    pub fn new<I, S>(path: impl Into<PathBuf>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            mode: MemoryMode::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            filter: None,
            pre_processors: Vec::new(),
        }
    }

    pub fn memory_mode(mut self, mode: MemoryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Rows per chunk in [`MemoryMode::Low`]. Clamped to at least 1.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn filter(mut self, predicate: impl Fn(&RawRow) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(predicate));
        self
    }

    /// Installs `allow` as the filter. An empty allow-list installs nothing.
    pub fn allow_list(self, allow: AllowList) -> Self {
        if allow.is_empty() {
            self
        } else {
            self.filter(move |row| allow.matches(row))
        }
    }

    pub fn pre_process(mut self, step: PreProcessor) -> Self {
        self.pre_processors.push(step);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Runs the pre-processors and opens the row stream.
    ///
    /// Fails with [`crate::GeoNamesError::SourceNotFound`] when the file (or
    /// the expected zip member) does not exist.
    pub fn open(&self) -> Result<Rows> {
        if !self.path.exists() {
            return Err(crate::GeoNamesError::SourceNotFound(self.path.clone()));
        }

        if !self.pre_processors.is_empty() {
            if Wrapper::of(&self.path) == Wrapper::Flat {
                for step in &self.pre_processors {
                    step.apply(&self.path)?;
                }
            } else {
                warn!(
                    "Skipping pre-processors for wrapped source {}",
                    self.path.display()
                );
            }
        }

        let spill = self.mode == MemoryMode::Low;
        let reader = csv_reader(open_stream(&self.path, spill)?);
        debug!(
            "Opened {} ({} mode, {} fields)",
            self.path.display(),
            self.mode,
            self.fields.len()
        );

        let inner = match self.mode {
            MemoryMode::Low => Inner::Chunked {
                reader,
                chunk: VecDeque::with_capacity(self.chunk_size),
                chunk_size: self.chunk_size,
                exhausted: false,
            },
            MemoryMode::Normal => Inner::Buffered(read_all(reader).into_iter()),
            MemoryMode::Max => {
                let rows: Vec<_> = read_all(reader)
                    .into_iter()
                    .map(|rec| rec.map(|r| to_row(&self.fields, &r)))
                    .collect();
                Inner::Materialized(rows.into_iter())
            }
        };

        Ok(Rows {
            inner,
            fields: Arc::clone(&self.fields),
            filter: self.filter.clone(),
            number: 0,
        })
    }
}

fn csv_reader(read: Box<dyn Read>) -> csv::Reader<Box<dyn Read>> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(read)
}

fn read_all(mut reader: csv::Reader<Box<dyn Read>>) -> Vec<csv::Result<StringRecord>> {
    let mut out = Vec::new();
    for rec in reader.records() {
        let fatal = matches!(&rec, Err(e) if e.is_io_error());
        out.push(rec);
        if fatal {
            break;
        }
    }
    out
}

/// Positional mapping; missing trailing columns stay absent, surplus ones are
/// dropped.
fn to_row(fields: &[String], record: &StringRecord) -> RawRow {
    RawRow::from_pairs(
        fields
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.as_str(), value)),
    )
}

enum Inner {
    Chunked {
        reader: csv::Reader<Box<dyn Read>>,
        chunk: VecDeque<csv::Result<StringRecord>>,
        chunk_size: usize,
        exhausted: bool,
    },
    Buffered(std::vec::IntoIter<csv::Result<StringRecord>>),
    Materialized(std::vec::IntoIter<csv::Result<RawRow>>),
}

/// Lazy stream of [`SourceRow`]s. Not restartable: reopen the source.
pub struct Rows {
    inner: Inner,
    fields: Arc<[String]>,
    filter: Option<RowPredicate>,
    number: u64,
}

impl Rows {
    fn next_raw(&mut self) -> Option<csv::Result<RawRow>> {
        match &mut self.inner {
            Inner::Chunked {
                reader,
                chunk,
                chunk_size,
                exhausted,
            } => {
                if chunk.is_empty() && !*exhausted {
                    // The previous chunk is fully drained; pull the next one.
                    let mut record = StringRecord::new();
                    while chunk.len() < *chunk_size {
                        match reader.read_record(&mut record) {
                            Ok(true) => chunk.push_back(Ok(record.clone())),
                            Ok(false) => {
                                *exhausted = true;
                                break;
                            }
                            Err(e) => {
                                *exhausted = e.is_io_error();
                                chunk.push_back(Err(e));
                                if *exhausted {
                                    break;
                                }
                            }
                        }
                    }
                }
                chunk
                    .pop_front()
                    .map(|rec| rec.map(|r| to_row(&self.fields, &r)))
            }
            Inner::Buffered(records) => records
                .next()
                .map(|rec| rec.map(|r| to_row(&self.fields, &r))),
            Inner::Materialized(rows) => rows.next(),
        }
    }
}

impl Iterator for Rows {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.next_raw()?;
        self.number += 1;
        Some(raw.map_err(Into::into).map(|row| {
            let ignored = self.filter.as_ref().is_some_and(|keep| !keep(&row));
            SourceRow {
                number: self.number,
                row,
                ignored,
            }
        }))
    }
}
