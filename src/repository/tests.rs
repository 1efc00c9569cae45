use super::*;
use crate::config::RepositoryConfig;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&RepositoryConfig {
        api_base: server.uri(),
        token: None,
        request_timeout: Duration::from_secs(5),
        user_agent: "adscan-tests".to_string(),
    })
    .unwrap()
}

fn listing(server: &MockServer, files: &[&str]) -> serde_json::Value {
    let mut entries: Vec<serde_json::Value> = files
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "type": "file",
                "download_url": format!("{}/raw/{}", server.uri(), name),
            })
        })
        .collect();
    entries.push(serde_json::json!({"name": "docs", "type": "dir", "download_url": null}));
    serde_json::Value::Array(entries)
}

async fn mount_raw(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn root_listing_collects_supported_files_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/lists/contents"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing(&server, &["a.txt", "README.md", "b.json"])),
        )
        .mount(&server)
        .await;
    mount_raw(&server, "a.txt", "one.example.com\nhttps://two.example.com\n").await;
    mount_raw(&server, "b.json", r#"["https://two.example.com", "https://three.example.com"]"#)
        .await;

    let urls = fetch_repository_urls(&client_for(&server), "acme/lists", None).await;

    assert_eq!(
        urls,
        vec![
            "https://two.example.com",
            "https://one.example.com",
            "https://three.example.com",
        ]
    );
}

#[tokio::test]
async fn max_count_stops_early_and_truncates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/lists/contents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing(&server, &["a.txt", "b.txt"])),
        )
        .mount(&server)
        .await;
    mount_raw(&server, "a.txt", "a1.example.com\na2.example.com\na3.example.com\n").await;
    Mock::given(method("GET"))
        .and(path("/raw/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b1.example.com\n"))
        .expect(0)
        .mount(&server)
        .await;

    let urls = fetch_repository_urls(&client_for(&server), "acme/lists", Some(2)).await;

    assert_eq!(urls, vec!["https://a1.example.com", "https://a2.example.com"]);
}

#[tokio::test]
async fn per_file_failures_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/lists/contents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing(&server, &["gone.txt", "ok.txt"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw/gone.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_raw(&server, "ok.txt", "ok.example.com\n").await;

    let urls = fetch_repository_urls(&client_for(&server), "acme/lists", None).await;

    assert_eq!(urls, vec!["https://ok.example.com"]);
}

#[tokio::test]
async fn listing_errors_yield_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/missing/contents"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/object/contents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "hi"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);

    assert!(fetch_repository_urls(&client, "acme/missing", None).await.is_empty());
    assert!(fetch_repository_urls(&client, "acme/object", None).await.is_empty());
}

#[tokio::test]
async fn malformed_reference_yields_empty_result() {
    let server = MockServer::start().await;

    let urls = fetch_repository_urls(&client_for(&server), "not a repo", None).await;

    assert!(urls.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_file_link_is_fetched_once_and_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/top.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "https://a.example.com,1\nhttps://b.example.com,2\nhttps://c.example.com,3\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let reference = format!("{}/files/top.csv", server.uri());
    let urls = fetch_repository_urls(&client_for(&server), &reference, Some(2)).await;

    assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com"]);
}

#[tokio::test]
async fn token_is_sent_as_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/private/contents"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(&RepositoryConfig {
        api_base: server.uri(),
        token: Some("secret-token".to_string()),
        ..RepositoryConfig::default()
    })
    .unwrap();

    let urls = fetch_repository_urls(&client, "acme/private", None).await;

    assert!(urls.is_empty());
}

/// In-memory repository used to check listing order without HTTP
struct StaticRepository {
    entries: Vec<RepoEntry>,
    files: Vec<(String, String)>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl RepositoryApi for StaticRepository {
    async fn list_top_level(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> std::result::Result<Vec<RepoEntry>, SourceError> {
        Ok(self.entries.clone())
    }

    async fn fetch_raw(&self, url: &str) -> std::result::Result<Vec<u8>, SourceError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.files
            .iter()
            .find(|(name, _)| name == url)
            .map(|(_, body)| body.clone().into_bytes())
            .ok_or_else(|| SourceError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

#[tokio::test]
async fn unsupported_entries_are_never_fetched() {
    let entry = |name: &str, kind: &str| RepoEntry {
        name: name.to_string(),
        kind: kind.to_string(),
        raw_url: Some(format!("mem://{name}")),
    };
    let repo = StaticRepository {
        entries: vec![
            entry("notes.md", "file"),
            entry("lists.txt", "dir"),
            entry("sites.yaml", "file"),
        ],
        files: vec![(
            "mem://sites.yaml".to_string(),
            "- https://yaml.example.com\n".to_string(),
        )],
        fetched: Mutex::new(Vec::new()),
    };

    let urls = fetch_repository_urls(&repo, "acme/lists", None).await;

    assert_eq!(urls, vec!["https://yaml.example.com"]);
    assert_eq!(*repo.fetched.lock().unwrap(), vec!["mem://sites.yaml".to_string()]);
}
