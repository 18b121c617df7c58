//! Tests for GraphService

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use hiergraph::application::{ApplicationError, ExportFormat, GraphService};
use hiergraph::config::Settings;
use hiergraph::domain::{DanglingPolicy, DomainError, RecordIssue};
use hiergraph::infrastructure::di::ServiceContainer;
use hiergraph::infrastructure::traits::{FileSystem, RealFileSystem};
use hiergraph::util::testing;

const FLARE: &str = "tests/resources/records/flare.json";
const INVALID: &str = "tests/resources/records/invalid.json";
const MALFORMED: &str = "tests/resources/records/malformed.json";

/// In-memory filesystem: files only, directories are implied.
#[derive(Default)]
struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    fn with_file(path: &str, content: &str) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        fs
    }

    fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path) || files.keys().any(|file| file.starts_with(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn real_service(settings: Settings) -> GraphService {
    GraphService::new(Arc::new(RealFileSystem), Arc::new(settings))
}

#[test]
fn given_flare_records_when_building_file_then_links_all_leaves() {
    testing::init_test_setup();
    // Arrange
    let service = real_service(Settings::default());

    // Act
    let built = service.build_file(Path::new(FLARE)).unwrap();

    // Assert
    let graph = &built.graph;
    assert!(built.rejected.is_empty());
    assert_eq!(graph.leaves().len(), 9);
    assert_eq!(graph.edges().len(), 12);
    assert_eq!(graph.dangling().len(), 1);
    assert_eq!(graph.dangling()[0].target, "flare.vis.data.Tree");
    assert_eq!(graph.tree().depth(), 4);
    assert_eq!(graph.tree().len(), 17);

    let arrays = graph.find_leaf("flare.util.Arrays").unwrap();
    assert_eq!(graph.incoming(arrays).count(), 3);
    assert_eq!(graph.outgoing(arrays).count(), 1);
}

#[test]
fn given_flare_records_when_listing_leaves_then_order_is_sorted_preorder() {
    let service = real_service(Settings::default());

    let built = service.build_file(Path::new(FLARE)).unwrap();

    let order: Vec<String> = built
        .graph
        .leaves()
        .iter()
        .filter_map(|&leaf| built.graph.qualified_path(leaf))
        .collect();
    assert_eq!(
        order,
        vec![
            "flare.animate.Easing",
            "flare.animate.Transitioner",
            "flare.util.Arrays",
            "flare.util.Property",
            "flare.analytics.cluster.AgglomerativeCluster",
            "flare.analytics.cluster.MergeEdge",
            "flare.analytics.graph.BetweennessCentrality",
            "flare.vis.data.Data",
            "flare.vis.data.DataList",
        ]
    );
}

#[test]
fn given_reject_dangling_when_building_flare_then_fails() {
    let settings = Settings {
        dangling: DanglingPolicy::Reject,
        ..Settings::default()
    };
    let service = real_service(settings);

    let result = service.build_file(Path::new(FLARE));

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DanglingReferences(_)))
    ));
}

#[test]
fn given_refused_record_when_lenient_then_reports_it() {
    let service = real_service(Settings::default());

    let built = service.build_file(Path::new(INVALID)).unwrap();

    assert_eq!(built.rejected.len(), 1);
    assert_eq!(built.rejected[0].issue, RecordIssue::EmptySegment);
    assert_eq!(built.graph.edges().len(), 1);
}

#[test]
fn given_refused_record_when_strict_then_fails_batch() {
    let settings = Settings {
        strict: true,
        ..Settings::default()
    };
    let service = real_service(settings);

    let result = service.build_file(Path::new(INVALID));

    match result {
        Err(ApplicationError::Domain(DomainError::InvalidRecords(rejected))) => {
            assert_eq!(rejected[0].name, "flare..Broken");
        }
        other => panic!("expected InvalidRecords, got {:?}", other.map(|o| o.rejected)),
    }
}

#[test]
fn given_malformed_json_when_loading_then_invalid_input() {
    let service = real_service(Settings::default());

    let result = service.load_records(Path::new(MALFORMED));

    assert!(matches!(result, Err(ApplicationError::InvalidInput { .. })));
}

#[test]
fn given_missing_file_when_loading_then_operation_failed() {
    let temp = TempDir::new().unwrap();
    let service = real_service(Settings::default());

    let result = service.load_records(&temp.path().join("absent.json"));

    assert!(matches!(result, Err(ApplicationError::OperationFailed { .. })));
}

#[test]
fn given_directory_when_loading_then_invalid_input() {
    let temp = TempDir::new().unwrap();
    let service = real_service(Settings::default());

    let result = service.load_records(temp.path());

    assert!(matches!(result, Err(ApplicationError::InvalidInput { .. })));
}

#[test]
fn given_memory_filesystem_when_building_then_reads_through_trait() {
    // Arrange
    let fs = Arc::new(MemoryFileSystem::with_file(
        "batch.json",
        r#"[{"name": "x::a", "imports": ["x::b"]}, {"name": "x::b"}]"#,
    ));
    let settings = Settings {
        delimiter: "::".to_string(),
        ..Settings::default()
    };
    let container = ServiceContainer::with_deps(settings, fs);

    // Act
    let built = container
        .graph_service()
        .build_file(Path::new("batch.json"))
        .unwrap();

    // Assert
    assert_eq!(
        built.graph.edge_paths(),
        vec![("x::a".to_string(), "x::b".to_string())]
    );
}

#[test]
fn given_several_files_when_building_in_parallel_then_keeps_input_order() {
    let temp = TempDir::new().unwrap();
    let service = real_service(Settings::default());
    let paths = vec![
        PathBuf::from(FLARE),
        temp.path().join("absent.json"),
        PathBuf::from(INVALID),
    ];

    let results = service.build_files(&paths);

    let returned: Vec<_> = results.iter().map(|(path, _)| path.clone()).collect();
    assert_eq!(returned, paths);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());
    assert!(results[2].1.is_ok());
}

#[test]
fn given_graph_when_writing_export_then_stores_json() {
    // Arrange
    let fs = Arc::new(MemoryFileSystem::with_file(
        "in.json",
        r#"[{"name": "a.b", "imports": ["a.c"]}, {"name": "a.c"}]"#,
    ));
    let service = GraphService::new(fs.clone(), Arc::new(Settings::default()));
    let built = service.build_file(Path::new("in.json")).unwrap();

    // Act
    let rendered = service.export(&built.graph, ExportFormat::Graph).unwrap();
    service
        .write_output(Path::new("out/graph.json"), &rendered)
        .unwrap();

    // Assert
    let stored = fs.content("out/graph.json").unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(value["edges"][0]["source"], "a.b");
    assert_eq!(value["edges"][0]["target"], "a.c");
}

#[test]
fn given_real_filesystem_when_writing_nested_output_then_creates_parents() {
    let temp = TempDir::new().unwrap();
    let service = real_service(Settings::default());
    let target = temp.path().join("nested/dir/hierarchy.json");

    service.write_output(&target, "{}").unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
}
