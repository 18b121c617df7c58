//! Dependency graph service
//!
//! Loads record batches, builds their hierarchy and links imports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::application::export::{self, ExportFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    DependencyGraph, DomainError, HierarchyBuilder, InvalidRecord, Record, ReferenceLinker,
};
use crate::infrastructure::traits::FileSystem;

/// A linked graph together with the records the builder refused.
#[derive(Debug)]
pub struct GraphOutput {
    pub graph: DependencyGraph,
    pub rejected: Vec<InvalidRecord>,
}

/// Service for turning record batches into dependency graphs.
pub struct GraphService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl GraphService {
    /// Create a new graph service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read a JSON array of records.
    #[instrument(level = "debug", skip(self))]
    pub fn load_records(&self, path: &Path) -> ApplicationResult<Vec<Record>> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("records file not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InvalidInput {
                path: path.to_path_buf(),
                message: "not a file".to_string(),
            });
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;

        let records: Vec<Record> =
            serde_json::from_str(&content).map_err(|e| ApplicationError::InvalidInput {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!("load_records: {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Build and link one batch.
    ///
    /// In strict mode any refused record fails the whole batch.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[Record]) -> ApplicationResult<GraphOutput> {
        let built = HierarchyBuilder::with_options(self.settings.build_options()).build(records)?;
        if self.settings.strict && !built.rejected.is_empty() {
            return Err(DomainError::InvalidRecords(built.rejected).into());
        }

        let graph = ReferenceLinker::with_policy(self.settings.dangling).link(built.tree)?;
        Ok(GraphOutput {
            graph,
            rejected: built.rejected,
        })
    }

    pub fn build_file(&self, path: &Path) -> ApplicationResult<GraphOutput> {
        let records = self.load_records(path)?;
        self.build(&records)
    }

    /// Build several independent batches in parallel.
    ///
    /// Results keep the order of `paths`.
    #[instrument(level = "debug", skip(self))]
    pub fn build_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, ApplicationResult<GraphOutput>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.build_file(path)))
            .collect()
    }

    pub fn export(
        &self,
        graph: &DependencyGraph,
        format: ExportFormat,
    ) -> ApplicationResult<String> {
        export::render(graph, format)
    }

    /// Write rendered output, creating parent directories.
    pub fn write_output(&self, path: &Path, content: &str) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create output directory", path)?;
        self.fs
            .write(path, content)
            .with_path_context("write output", path)
    }
}
