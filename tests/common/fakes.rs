//! Fake collaborators standing in for the browser inspector and the repository API

use adscan::repository::RepoEntry;
use adscan::{
    Error, InspectionReport, InspectionSession, IntegrationInstance, PageInspector,
    RepositoryApi, Result, SourceError,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inspector whose verdict depends on the visited host name
///
/// - hosts containing `quiet` load without any ad integration
/// - hosts containing `nxdomain` fail with a DNS error
/// - hosts containing `broken` fail inside the page script
/// - everything else reports a Prebid.js instance
#[derive(Default)]
pub struct HostScriptedInspector {
    /// Every URL visited, in visit order
    pub visited: Arc<Mutex<Vec<String>>>,
    /// Sessions opened so far
    pub sessions_opened: Arc<AtomicUsize>,
    /// Refuse to open sessions
    pub refuse_sessions: bool,
}

impl HostScriptedInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_sessions() -> Self {
        Self {
            refuse_sessions: true,
            ..Self::default()
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageInspector for HostScriptedInspector {
    async fn open_session(&self) -> Result<Box<dyn InspectionSession>> {
        if self.refuse_sessions {
            return Err(Error::Setup("browser executable not found".into()));
        }
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HostScriptedSession {
            visited: Arc::clone(&self.visited),
        }))
    }

    fn name(&self) -> &'static str {
        "host-scripted"
    }
}

struct HostScriptedSession {
    visited: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl InspectionSession for HostScriptedSession {
    async fn inspect(&self, url: &str, _timeout: Duration) -> Result<InspectionReport> {
        self.visited.lock().unwrap().push(url.to_string());
        tokio::time::sleep(Duration::from_millis(5)).await;

        if url.contains("nxdomain") {
            return Err(Error::Visit(format!("net::ERR_NAME_NOT_RESOLVED at {url}")));
        }
        if url.contains("broken") {
            return Err(Error::Visit(
                "Evaluation failed: TypeError: pbjs.getConfig is not a function".into(),
            ));
        }
        if url.contains("quiet") {
            return Ok(InspectionReport::default());
        }

        Ok(InspectionReport {
            detected_libraries: BTreeSet::from(["prebid".to_string()]),
            integration_instances: vec![IntegrationInstance {
                instance_name: "pbjs".into(),
                version: "v9.12.0".into(),
                module_names: vec!["appnexusBidAdapter".into(), "consentManagement".into()],
            }],
        })
    }
}

/// Repository API that serves a fixed listing from memory
#[derive(Default)]
pub struct InMemoryRepository {
    pub entries: Vec<RepoEntry>,
    pub files: Vec<(String, String)>,
}

impl InMemoryRepository {
    /// Repository with one top-level file per `(name, content)` pair
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            entries: files
                .iter()
                .map(|(name, _)| RepoEntry {
                    name: name.to_string(),
                    kind: "file".to_string(),
                    raw_url: Some(format!("mem://{name}")),
                })
                .collect(),
            files: files
                .iter()
                .map(|(name, body)| (format!("mem://{name}"), body.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl RepositoryApi for InMemoryRepository {
    async fn list_top_level(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> std::result::Result<Vec<RepoEntry>, SourceError> {
        Ok(self.entries.clone())
    }

    async fn fetch_raw(&self, url: &str) -> std::result::Result<Vec<u8>, SourceError> {
        self.files
            .iter()
            .find(|(raw_url, _)| raw_url == url)
            .map(|(_, body)| body.clone().into_bytes())
            .ok_or_else(|| SourceError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}
