//! Hierarchy builder: turns flat dotted-name records into a rooted tree.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::{BuildOptions, ImportPolicy, Record, RootPolicy};
use crate::domain::error::{DomainError, DomainResult, InvalidRecord, RecordIssue};

/// Result of a build: the tree plus every record that was refused.
#[derive(Debug)]
pub struct BuiltHierarchy {
    pub tree: TreeArena,
    pub rejected: Vec<InvalidRecord>,
}

/// Constructs hierarchical trees from dotted-name records.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    options: BuildOptions,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the tree for one record batch.
    ///
    /// Records may arrive in any order, children before parents included.
    /// Malformed records are collected in [`BuiltHierarchy::rejected`] while
    /// the rest of the batch is still built; the build only fails when no
    /// record survives or the batch has several roots under
    /// [`RootPolicy::Reject`].
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[Record]) -> DomainResult<BuiltHierarchy> {
        let delimiter = self.options.delimiter.as_str();
        if delimiter.is_empty() {
            return Err(DomainError::InvalidDelimiter);
        }
        if records.is_empty() {
            return Err(DomainError::EmptyBatch);
        }

        let (accepted, mut rejected) = self.validate(records);
        debug!(
            "build: {} accepted, {} rejected",
            accepted.len(),
            rejected.len()
        );

        let mut resolver = Resolver::new(&accepted, delimiter);
        for record in &accepted {
            resolver.resolve(&record.name)?;
        }
        let Resolver {
            mut tree,
            top_level,
            ..
        } = resolver;

        match top_level.as_slice() {
            [] => return Err(DomainError::InvalidRecords(rejected)),
            [root] => tree.set_root(*root),
            roots => match self.options.root_policy {
                RootPolicy::Umbrella => {
                    debug!("build: adopting {} top-level names", roots.len());
                    let umbrella = tree.insert_node(NodeData::umbrella(), None);
                    for &root in roots {
                        tree.attach(umbrella, root);
                    }
                    tree.set_root(umbrella);
                }
                RootPolicy::Reject => {
                    rejected.extend(roots.iter().filter_map(|&root| {
                        tree.get_node(root).map(|node| {
                            InvalidRecord::new(
                                node.data.segment.clone(),
                                RecordIssue::MultipleRoots,
                            )
                        })
                    }));
                    return Err(DomainError::InvalidRecords(rejected));
                }
            },
        }

        if self.options.sort_children {
            tree.sort_children();
        }
        if !rejected.is_empty() {
            warn!("build: rejected {} record(s)", rejected.len());
        }

        Ok(BuiltHierarchy { tree, rejected })
    }

    /// Split the batch into buildable records and refused ones.
    ///
    /// Accepted records keep first-occurrence order with the import policy applied.
    fn validate(&self, records: &[Record]) -> (Vec<Record>, Vec<InvalidRecord>) {
        let delimiter = self.options.delimiter.as_str();
        let mut rejected = Vec::new();
        let mut order: Vec<&str> = Vec::new();
        let mut by_name: HashMap<&str, Vec<&Record>> = HashMap::new();

        for record in records {
            let name = record.name.as_str();
            if name.is_empty() {
                rejected.push(InvalidRecord::new(name, RecordIssue::EmptyName));
                continue;
            }
            if name.rsplit(delimiter).any(str::is_empty) {
                rejected.push(InvalidRecord::new(name, RecordIssue::EmptySegment));
                continue;
            }
            by_name
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(record);
        }

        let mut candidates = Vec::with_capacity(order.len());
        for name in order {
            let group = &by_name[name];
            let imports = self.apply_import_policy(&group[0].imports);
            let consistent = group
                .iter()
                .skip(1)
                .all(|other| self.apply_import_policy(&other.imports) == imports);
            if consistent {
                if group.len() > 1 {
                    debug!("validate: collapsed {} identical records '{}'", group.len(), name);
                }
                candidates.push(Record {
                    name: name.to_string(),
                    imports,
                });
            } else {
                rejected.push(InvalidRecord::new(name, RecordIssue::ConflictingDuplicate));
            }
        }

        // Prefixes borrow from the candidate names; no per-prefix allocation.
        let refusable: Vec<bool> = {
            let interior: HashSet<&str> = candidates
                .iter()
                .flat_map(|record| ancestor_paths(&record.name, delimiter))
                .collect();
            candidates
                .iter()
                .map(|record| !record.imports.is_empty() && interior.contains(record.name.as_str()))
                .collect()
        };
        let (refused, accepted): (Vec<(Record, bool)>, Vec<(Record, bool)>) = candidates
            .into_iter()
            .zip(refusable)
            .partition(|(_, refuse)| *refuse);
        let accepted: Vec<Record> = accepted.into_iter().map(|(record, _)| record).collect();
        rejected.extend(
            refused.into_iter().map(|(record, _)| {
                InvalidRecord::new(record.name, RecordIssue::InteriorWithImports)
            }),
        );

        (accepted, rejected)
    }

    fn apply_import_policy(&self, imports: &[String]) -> Vec<String> {
        match self.options.import_policy {
            ImportPolicy::Preserve => imports.to_vec(),
            ImportPolicy::Dedup => imports.iter().unique().cloned().collect(),
        }
    }
}

/// Every proper ancestor path of `name`, nearest first.
fn ancestor_paths<'a>(name: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    name.rmatch_indices(delimiter).map(move |(i, _)| &name[..i])
}

enum Resolution {
    InProgress,
    Resolved(Index),
}

/// Memoized name resolution over a single arena.
struct Resolver<'a> {
    tree: TreeArena,
    records: HashMap<&'a str, &'a Record>,
    table: HashMap<&'a str, Resolution>,
    top_level: Vec<Index>,
    delimiter: &'a str,
}

impl<'a> Resolver<'a> {
    fn new(records: &'a [Record], delimiter: &'a str) -> Self {
        Self {
            tree: TreeArena::new(delimiter),
            records: records.iter().map(|r| (r.name.as_str(), r)).collect(),
            table: HashMap::new(),
            top_level: Vec::new(),
            delimiter,
        }
    }

    /// Fetch or create the node for a full name, creating missing ancestors.
    ///
    /// Each call recurses only on a strictly shorter prefix.
    fn resolve(&mut self, name: &'a str) -> DomainResult<Index> {
        match self.table.get(name) {
            Some(Resolution::Resolved(idx)) => return Ok(*idx),
            Some(Resolution::InProgress) => return Err(DomainError::CyclicName(name.to_string())),
            None => {}
        }
        self.table.insert(name, Resolution::InProgress);

        let (parent, segment) = match name.rfind(self.delimiter) {
            Some(i) => (Some(&name[..i]), &name[i + self.delimiter.len()..]),
            None => (None, name),
        };
        let data = match self.records.get(name) {
            Some(record) => NodeData::record(segment, record.imports.clone()),
            None => NodeData::synthetic(segment),
        };
        let idx = self.tree.insert_node(data, None);

        match parent {
            Some(parent) => {
                let parent_idx = self.resolve(parent)?;
                self.tree.attach(parent_idx, idx);
            }
            None => self.top_level.push(idx),
        }

        self.table.insert(name, Resolution::Resolved(idx));
        Ok(idx)
    }
}
