// crates/geonames-core/src/import/mod.rs

//! # Import Orchestrator
//!
//! Runs one pass per dataset, always in [`Dataset::ORDER`]: the hierarchy
//! edges first, then the gazetteer objects that hang off them, then the
//! validate-only datasets. A failing dataset never stops the run.

mod report;

pub use report::{DatasetOutcome, DatasetReport, ImportCounters, ImportSummary, RowOutcome};

use crate::config::{DatasetConfig, ImportConfig};
use crate::error::{GeoNamesError, Result};
use crate::hierarchy::{EdgeOutcome, HierarchyTree, Materializer, Submission};
use crate::schema::{Schema, TypedRecord};
use crate::source::{PreProcessor, RowSource, Rows, SourceRow};
use crate::store::EntityStore;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The input dumps, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Hierarchy,
    Objects,
    Translations,
    Countries,
    PostalCodes,
}

/// What a dataset does with its valid rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Validate and count; nothing is kept.
    ValidateOnly,
    /// Feed edges into the [`HierarchyTree`].
    HierarchyEdges,
    /// Hand gazetteer records to the [`Materializer`].
    ObjectTree,
}

impl Dataset {
    /// Tree-dependent datasets come after the ones that build the tree.
    pub const ORDER: [Dataset; 5] = [
        Dataset::Hierarchy,
        Dataset::Objects,
        Dataset::Translations,
        Dataset::Countries,
        Dataset::PostalCodes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hierarchy => "hierarchy",
            Self::Objects => "objects",
            Self::Translations => "translations",
            Self::Countries => "countries",
            Self::PostalCodes => "postal-codes",
        }
    }

    pub fn schema(&self) -> Schema {
        match self {
            Self::Hierarchy => Schema::HierarchyEdge,
            Self::Objects => Schema::GeoName,
            Self::Translations => Schema::AlternateName,
            Self::Countries => Schema::CountryInfo,
            Self::PostalCodes => Schema::PostalCode,
        }
    }

    pub fn handler(&self) -> Handler {
        match self {
            Self::Hierarchy => Handler::HierarchyEdges,
            Self::Objects => Handler::ObjectTree,
            _ => Handler::ValidateOnly,
        }
    }

    pub fn settings<'a>(&self, config: &'a ImportConfig) -> &'a DatasetConfig {
        match self {
            Self::Hierarchy => &config.hierarchy,
            Self::Objects => &config.objects,
            Self::Translations => &config.translations,
            Self::Countries => &config.countries,
            Self::PostalCodes => &config.postal_codes,
        }
    }

    fn pre_processors(&self) -> &'static [PreProcessor] {
        match self {
            // countryInfo.txt ships with a commented header block.
            Self::Countries => &[PreProcessor::StripComments],
            _ => &[],
        }
    }
}

/// Drives every dataset pass against one tree and one entity store.
pub struct Importer<S: EntityStore> {
    config: ImportConfig,
    tree: HierarchyTree,
    store: S,
    created: u64,
}

impl<S: EntityStore> Importer<S> {
    /// Starts from an empty tree rooted at `config.root_id`.
    pub fn new(config: ImportConfig, store: S) -> Result<Self> {
        let tree = HierarchyTree::from_config(&config);
        Self::with_tree(config, tree, store)
    }

    /// Resumes from an existing tree, e.g. a loaded snapshot.
    ///
    /// A tree saved after an objects pass records which ids were persisted,
    /// so it must be paired with the store snapshot taken alongside it.
    pub fn with_tree(config: ImportConfig, tree: HierarchyTree, store: S) -> Result<Self> {
        config.validate()?;
        if tree.root() != config.root_id {
            return Err(GeoNamesError::InvalidData(format!(
                "tree is rooted at {}, config expects {}",
                tree.root(),
                config.root_id
            )));
        }
        let missing = tree
            .created_ids()
            .filter(|id| store.find_entity(*id).is_none())
            .count();
        if missing > 0 {
            return Err(GeoNamesError::InvalidData(format!(
                "{missing} tree nodes are marked persisted but absent from the store"
            )));
        }
        Ok(Self {
            config,
            tree,
            store,
            created: 0,
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (HierarchyTree, S) {
        (self.tree, self.store)
    }

    /// Runs all datasets in order.
    pub fn run(&mut self) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for dataset in Dataset::ORDER {
            summary.reports.push(self.run_dataset(dataset));
        }

        summary.tree_size = self.tree.size();
        summary.tree_depth = self.tree.depth();
        summary.entities_created = self.created;
        summary.staged_remaining = self.tree.staged_count();
        info!(
            "Import finished: tree {} nodes (depth {}), {} entities created",
            summary.tree_size, summary.tree_depth, summary.entities_created
        );
        if summary.staged_remaining > 0 {
            warn!(
                "{} records were never persisted: their parents are missing from the objects dataset",
                summary.staged_remaining
            );
        }
        summary
    }

    /// One pass over one dataset. Never fails: problems end up in the
    /// report's outcome and counters.
    pub fn run_dataset(&mut self, dataset: Dataset) -> DatasetReport {
        let started = Instant::now();
        let settings = dataset.settings(&self.config);
        let path = self.config.resolve(settings);
        let mut report = DatasetReport::new(dataset, path.clone());

        if !settings.enabled {
            info!("{}: disabled, skipping", dataset.name());
            report.outcome = DatasetOutcome::Skipped("disabled".into());
            return report;
        }

        let rows = match self.source(dataset, path).open() {
            Ok(rows) => rows,
            Err(GeoNamesError::SourceNotFound(missing)) => {
                error!("{}: source not found: {}", dataset.name(), missing.display());
                report.outcome =
                    DatasetOutcome::Skipped(format!("source not found: {}", missing.display()));
                return report;
            }
            Err(e) => {
                error!("{}: cannot open source: {e}", dataset.name());
                report.outcome = DatasetOutcome::Aborted(e.to_string());
                return report;
            }
        };

        info!("{}: importing {}", dataset.name(), report.path.display());
        let schema = dataset.schema();
        let interval = self.config.progress_interval;
        let counters = &mut report.counters;

        let result = match dataset.handler() {
            Handler::ValidateOnly => drain(rows, dataset, interval, counters, |row| {
                Ok(match schema.validate(&row.row) {
                    Ok(_) => RowOutcome::Imported,
                    Err(errors) => rejected(dataset, row, &errors),
                })
            }),
            Handler::HierarchyEdges => {
                let tree = &mut self.tree;
                drain(rows, dataset, interval, counters, |row| {
                    add_edge(tree, schema, dataset, row)
                })
            }
            Handler::ObjectTree => {
                let created = &mut self.created;
                let mut materializer = Materializer::new(&mut self.tree, &mut self.store)
                    .with_root_codes(self.config.root_feature_codes.iter().cloned());
                drain(rows, dataset, interval, counters, |row| {
                    submit(&mut materializer, schema, dataset, row, created)
                })
            }
        };

        report.elapsed = started.elapsed();
        match result {
            Ok(()) => info!(
                "{}: done. {} in {:.2?}",
                dataset.name(),
                report.counters,
                report.elapsed
            ),
            Err(e) => {
                error!("{}: aborted: {e}", dataset.name());
                report.outcome = DatasetOutcome::Aborted(e.to_string());
            }
        }

        if dataset == Dataset::Hierarchy {
            info!(
                "Hierarchy tree size: {}, depth: {}",
                self.tree.size(),
                self.tree.depth()
            );
        }
        report
    }

    fn source(&self, dataset: Dataset, path: PathBuf) -> RowSource {
        let settings = dataset.settings(&self.config);
        let source = match &settings.fields {
            Some(fields) => RowSource::new(path, fields.iter().cloned()),
            None => RowSource::new(path, dataset.schema().fields().iter().copied()),
        };
        let mut source = source
            .memory_mode(self.config.memory_mode)
            .chunk_size(self.config.chunk_size)
            .allow_list(settings.filter.clone());
        for step in dataset.pre_processors() {
            source = source.pre_process(*step);
        }
        source
    }
}

/// Pulls every row through `handle`, keeping `counters` current. An `Err`
/// from `handle` stops the pass.
fn drain<F>(
    rows: Rows,
    dataset: Dataset,
    interval: u64,
    counters: &mut ImportCounters,
    mut handle: F,
) -> Result<()>
where
    F: FnMut(&SourceRow) -> Result<RowOutcome>,
{
    for item in rows {
        counters.total_seen += 1;
        match item {
            Ok(row) if row.ignored => counters.ignored += 1,
            Ok(row) => counters.record(handle(&row)?),
            Err(e) => {
                warn!("{}: unreadable row {}: {e}", dataset.name(), counters.total_seen);
                counters.errored += 1;
            }
        }
        if interval > 0 && counters.total_seen % interval == 0 {
            info!("{}: {}", dataset.name(), counters);
        }
    }
    Ok(())
}

fn rejected(dataset: Dataset, row: &SourceRow, errors: &crate::schema::FieldErrors) -> RowOutcome {
    debug!(
        "{}: row {} rejected, invalid fields: {}",
        dataset.name(),
        row.number,
        errors.fields().collect::<Vec<_>>().join(", ")
    );
    RowOutcome::Errored
}

fn add_edge(
    tree: &mut HierarchyTree,
    schema: Schema,
    dataset: Dataset,
    row: &SourceRow,
) -> Result<RowOutcome> {
    let edge = match schema.validate(&row.row) {
        Ok(TypedRecord::Edge(edge)) => edge,
        Ok(_) => return Ok(RowOutcome::Errored),
        Err(errors) => return Ok(rejected(dataset, row, &errors)),
    };

    Ok(match tree.add_edge(&edge)? {
        EdgeOutcome::Attached | EdgeOutcome::Moved => RowOutcome::Imported,
        EdgeOutcome::Duplicate | EdgeOutcome::Ignored | EdgeOutcome::Sentinel => {
            RowOutcome::Ignored
        }
        EdgeOutcome::Cycle => {
            warn!(
                "{}: row {}: edge {} -> {} would close a cycle",
                dataset.name(),
                row.number,
                edge.parent,
                edge.child
            );
            RowOutcome::Errored
        }
    })
}

fn submit<S: EntityStore>(
    materializer: &mut Materializer<'_, S>,
    schema: Schema,
    dataset: Dataset,
    row: &SourceRow,
    created: &mut u64,
) -> Result<RowOutcome> {
    let record = match schema.validate(&row.row) {
        Ok(TypedRecord::GeoName(record)) => record,
        Ok(_) => return Ok(RowOutcome::Errored),
        Err(errors) => return Ok(rejected(dataset, row, &errors)),
    };

    match materializer.submit(record) {
        Ok(Submission::Created { flushed, failed, .. }) => {
            *created += 1 + flushed as u64;
            if failed > 0 {
                warn!(
                    "{}: row {}: {failed} staged descendants were refused by the store",
                    dataset.name(),
                    row.number
                );
            }
            Ok(RowOutcome::Imported)
        }
        Ok(Submission::Staged) => Ok(RowOutcome::Imported),
        Ok(Submission::Ignored) => Ok(RowOutcome::Ignored),
        Ok(Submission::Orphan | Submission::AlreadyCreated) => Ok(RowOutcome::Errored),
        Err(GeoNamesError::Store(e)) => {
            error!("{}: row {}: {e}", dataset.name(), row.number);
            Ok(RowOutcome::Errored)
        }
        Err(e) => Err(e),
    }
}
