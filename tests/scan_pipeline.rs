//! End-to-end tests for the scan pipeline
//!
//! These tests run [`Scanner`] against fake inspectors and in-memory repositories,
//! checking what a run leaves on disk:
//! - the dated record store
//! - the per-category error logs
//! - the reconciled input file

mod common;

use adscan::{ConcurrencyMode, Error, RunSummary, Scanner};
use common::{HostScriptedInspector, InMemoryRepository, Workspace};
use std::sync::Arc;

const MIXED_INPUT: &str = "\
https://news.example.com
https://quiet.example.com
https://nxdomain.example.com
blog.example.com
https://broken.example.com
https://shop.example.com
https://quiet2.example.com
";

fn scanner(config: adscan::ScanConfig, inspector: &Arc<HostScriptedInspector>) -> Scanner {
    Scanner::new(
        config,
        Arc::clone(inspector) as Arc<dyn adscan::PageInspector>,
        Arc::new(InMemoryRepository::default()),
    )
}

#[tokio::test]
async fn pooled_run_persists_every_outcome() {
    let workspace = Workspace::new();
    let input = workspace.input("urls.txt", MIXED_INPUT);
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = scanner(workspace.config(&input, ConcurrencyMode::Pooled), &inspector)
        .run()
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            urls_in_scope: 7,
            chunks_processed: 1,
            succeeded: 3,
            no_signal: 2,
            navigation_errors: 1,
            processing_errors: 1,
            records_written: 3,
        }
    );
    assert_eq!(inspector.visited().len(), 7);

    let mut stored: Vec<String> = workspace
        .records()
        .iter()
        .map(|record| record["url"].as_str().unwrap().to_string())
        .collect();
    stored.sort();
    assert_eq!(
        stored,
        vec![
            "https://blog.example.com",
            "https://news.example.com",
            "https://shop.example.com",
        ]
    );

    let mut quiet = workspace.error_log("no-signal.txt");
    quiet.sort();
    assert_eq!(quiet, vec!["https://quiet.example.com", "https://quiet2.example.com"]);
    assert_eq!(
        workspace.error_log("navigation-error.txt"),
        vec!["https://nxdomain.example.com"]
    );
    assert_eq!(
        workspace.error_log("processing-error.txt"),
        vec!["https://broken.example.com"]
    );

    assert_eq!(
        workspace.lines(&input),
        vec![
            "https://quiet.example.com",
            "https://nxdomain.example.com",
            "https://broken.example.com",
            "https://quiet2.example.com",
        ]
    );
}

#[tokio::test]
async fn second_run_resumes_from_the_reconciled_file() {
    let workspace = Workspace::new();
    let input = workspace.input("urls.txt", MIXED_INPUT);
    let config = workspace.config(&input, ConcurrencyMode::Pooled);

    scanner(config.clone(), &Arc::new(HostScriptedInspector::new()))
        .run()
        .await
        .unwrap();

    let inspector = Arc::new(HostScriptedInspector::new());
    let summary = scanner(config, &inspector).run().await.unwrap();

    assert_eq!(summary.urls_in_scope, 4);
    assert_eq!(summary.succeeded, 0);
    let mut visited = inspector.visited();
    visited.sort();
    assert_eq!(
        visited,
        vec![
            "https://broken.example.com",
            "https://nxdomain.example.com",
            "https://quiet.example.com",
            "https://quiet2.example.com",
        ]
    );
    assert_eq!(workspace.records().len(), 3);
    assert_eq!(workspace.error_log("no-signal.txt").len(), 4);
}

#[tokio::test]
async fn sequential_chunks_merge_into_one_record_file() {
    let workspace = Workspace::new();
    let input = workspace.input(
        "urls.txt",
        "a.example.com\nb.example.com\nc.example.com\nd.example.com\ne.example.com\n",
    );
    let mut config = workspace.config(&input, ConcurrencyMode::Sequential);
    config.execution.chunk_size = Some(2);
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = scanner(config, &inspector).run().await.unwrap();

    assert_eq!(summary.chunks_processed, 3);
    assert_eq!(summary.records_written, 5);
    assert_eq!(
        inspector.visited(),
        vec![
            "https://a.example.com",
            "https://b.example.com",
            "https://c.example.com",
            "https://d.example.com",
            "https://e.example.com",
        ]
    );
    assert_eq!(inspector.sessions_opened.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(workspace.records().len(), 5);
    assert!(workspace.lines(&input).is_empty());
}

#[tokio::test]
async fn range_limits_what_is_visited_and_reconciled() {
    let workspace = Workspace::new();
    let input = workspace.input(
        "urls.txt",
        "a.example.com\nb.example.com\nc.example.com\nd.example.com\ne.example.com\n",
    );
    let mut config = workspace.config(&input, ConcurrencyMode::Pooled);
    config.execution.range = Some("2-3".to_string());
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = scanner(config, &inspector).run().await.unwrap();

    assert_eq!(summary.urls_in_scope, 2);
    let mut visited = inspector.visited();
    visited.sort();
    assert_eq!(visited, vec!["https://b.example.com", "https://c.example.com"]);
    assert_eq!(
        workspace.lines(&input),
        vec!["a.example.com", "d.example.com", "e.example.com"]
    );
}

#[tokio::test]
async fn repository_source_respects_result_ceiling() {
    let workspace = Workspace::new();
    let mut config = workspace.config(&workspace.path("unused.txt"), ConcurrencyMode::Pooled);
    config.source.file = None;
    config.source.repository = Some("acme/url-lists".to_string());
    config.source.max_results = Some(2);
    let repository = InMemoryRepository::with_files(&[
        ("README.md", "https://ignored.example.com"),
        ("sites.txt", "one.example.com\ntwo.example.com\nthree.example.com\n"),
    ]);
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = Scanner::new(config, inspector.clone(), Arc::new(repository))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.urls_in_scope, 2);
    let mut visited = inspector.visited();
    visited.sort();
    assert_eq!(visited, vec!["https://one.example.com", "https://two.example.com"]);
    assert!(!workspace.path("unused.txt").exists());
}

#[tokio::test]
async fn structured_input_is_scanned_but_not_rewritten() {
    let workspace = Workspace::new();
    let original =
        r#"{"sites": [{"url": "https://news.example.com"}, {"url": "https://shop.example.com"}]}"#;
    let input = workspace.input("sites.json", original);
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = scanner(workspace.config(&input, ConcurrencyMode::Pooled), &inspector)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
}

#[tokio::test]
async fn missing_source_ends_cleanly_without_visits() {
    let workspace = Workspace::new();
    let mut config = workspace.config(&workspace.path("urls.txt"), ConcurrencyMode::Pooled);
    config.source.file = None;
    let inspector = Arc::new(HostScriptedInspector::new());

    let summary = scanner(config, &inspector).run().await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(inspector.visited().is_empty());
}

#[tokio::test]
async fn empty_or_unreadable_sources_end_cleanly() {
    let workspace = Workspace::new();
    let empty = workspace.input("empty.txt", "\n# nothing here\n");
    let missing = workspace.path("missing.txt");
    let inspector = Arc::new(HostScriptedInspector::new());

    for source in [empty, missing] {
        let summary = scanner(workspace.config(&source, ConcurrencyMode::Pooled), &inspector)
            .run()
            .await
            .unwrap();
        assert_eq!(summary.chunks_processed, 0);
    }
    assert_eq!(inspector.sessions_opened.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!workspace.output_dir().exists());
    assert!(!workspace.error_dir().exists());
}

#[tokio::test]
async fn setup_failure_stops_the_run_and_leaves_files_alone() {
    let workspace = Workspace::new();
    let input = workspace.input("urls.txt", MIXED_INPUT);
    let inspector = Arc::new(HostScriptedInspector::refusing_sessions());

    let err = scanner(workspace.config(&input, ConcurrencyMode::Pooled), &inspector)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Setup(_)), "{err:?}");
    assert_eq!(std::fs::read_to_string(&input).unwrap(), MIXED_INPUT);
    assert!(!workspace.output_dir().exists());
}
