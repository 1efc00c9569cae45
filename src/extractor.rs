//! URL extraction from raw source content
//!
//! Turns the bytes of a local file or a repository file into a deduplicated list of
//! absolute `http`/`https` URLs. The file name only selects which extra passes run:
//!
//! - every source gets a scan for fully-qualified `http(s)://` tokens
//! - line-oriented text (`.txt`, `.text`, `.list`, `.lst`) also promotes bare domains to `https://`
//! - structured data (`.json`, `.yaml`, `.yml`) also walks every string leaf
//! - tabular data (`.csv`, `.tsv`) also takes the first field of each row
//!
//! Extraction never fails; unparsable structured or tabular content degrades to the
//! fully-qualified scan with a logged warning.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Fully-qualified URL token, delimited by whitespace, quotes, commas or angle brackets
#[allow(clippy::expect_used)]
static FULL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>`,]+"#).expect("full URL pattern is valid")
});

/// Whole-token bare domain (`label.label.tld`) with an optional port, path, query or fragment
#[allow(clippy::expect_used)]
static BARE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}(?::\d{1,5})?(?:[/?#]\S*)?$",
    )
    .expect("bare domain pattern is valid")
});

/// Characters stripped from the end of a URL token
const TRAILING_PUNCTUATION: &[char] = &[',', ';', '.', ')', ']'];

/// Quote characters stripped around bare-domain tokens
const QUOTES: &[char] = &['"', '\'', '`'];

/// Extensions whose content is line-oriented text
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "list", "lst"];

/// How a source's content is interpreted beyond the fully-qualified URL scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Line-oriented text; bare domains are promoted
    Text,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
    /// Delimited rows; the first field of each row is a candidate URL
    Tabular {
        /// Field delimiter
        delimiter: u8,
    },
    /// Anything else; only the fully-qualified scan applies
    Other,
}

impl SourceFormat {
    /// Pick the format from a file name or path
    pub fn from_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => SourceFormat::Text,
            Some("json") => SourceFormat::Json,
            Some("yaml" | "yml") => SourceFormat::Yaml,
            Some("csv") => SourceFormat::Tabular { delimiter: b',' },
            Some("tsv") => SourceFormat::Tabular { delimiter: b'\t' },
            _ => SourceFormat::Other,
        }
    }

    /// True for line-oriented text sources (the only kind that is reconciled in place)
    pub fn is_line_delimited(&self) -> bool {
        matches!(self, SourceFormat::Text)
    }
}

/// True if `name` ends in one of the extensions the extractor understands
pub fn is_supported_source(name: &str) -> bool {
    !matches!(SourceFormat::from_name(name), SourceFormat::Other)
}

/// Check that a string is an absolute `http`/`https` URL with a host
pub fn is_http_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// URLs one line of a text source contributes, exactly as [`extract_urls`] finds them
///
/// # Examples
///
/// ```
/// use adscan::extractor::line_urls;
///
/// assert_eq!(line_urls(" example.org, "), vec!["https://example.org"]);
/// assert_eq!(line_urls("https://a.example/page."), vec!["https://a.example/page"]);
/// assert!(line_urls("# comment").is_empty());
/// ```
pub fn line_urls(line: &str) -> Vec<String> {
    let mut urls = UrlSet::new();
    urls.extend(scan_full_urls(line));
    urls.extend(scan_bare_domains(line));
    urls.into_vec()
}

/// Insertion-ordered set of validated URLs
#[derive(Debug, Default)]
pub(crate) struct UrlSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl UrlSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a URL if it is a valid absolute http(s) URL not seen before
    pub(crate) fn insert(&mut self, candidate: &str) -> bool {
        if self.seen.contains(candidate) || !is_http_url(candidate) {
            return false;
        }
        self.seen.insert(candidate.to_string());
        self.ordered.push(candidate.to_string());
        true
    }

    pub(crate) fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.insert(url.as_ref());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Extract the deduplicated URLs contained in `content`
///
/// `source_name` is a file name or path used only to select the format.
/// Output is in first-seen order.
///
/// # Examples
///
/// ```
/// use adscan::extractor::extract_urls;
///
/// let urls = extract_urls("sites.txt", b"example.com\nhttps://news.example.org/a\n");
/// assert_eq!(urls, vec!["https://news.example.org/a", "https://example.com"]);
/// ```
pub fn extract_urls(source_name: &str, content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    let mut urls = UrlSet::new();

    urls.extend(scan_full_urls(&text));

    match SourceFormat::from_name(source_name) {
        SourceFormat::Text => urls.extend(scan_bare_domains(&text)),
        SourceFormat::Json => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => {
                let mut leaves = Vec::new();
                collect_json_strings(&value, &mut leaves);
                urls.extend(leaves.into_iter().filter_map(url_leaf));
            }
            Err(e) => {
                warn!(source = source_name, error = %e, "Invalid JSON, using plain URL scan only");
            }
        },
        SourceFormat::Yaml => match serde_yaml::from_str::<serde_yaml::Value>(&text) {
            Ok(value) => {
                let mut leaves = Vec::new();
                collect_yaml_strings(&value, &mut leaves);
                urls.extend(leaves.into_iter().filter_map(url_leaf));
            }
            Err(e) => {
                warn!(source = source_name, error = %e, "Invalid YAML, using plain URL scan only");
            }
        },
        SourceFormat::Tabular { delimiter } => {
            urls.extend(scan_first_column(source_name, &text, delimiter));
        }
        SourceFormat::Other => {}
    }

    debug!(source = source_name, count = urls.len(), "Extracted URLs");
    urls.into_vec()
}

/// All fully-qualified URL tokens, trimmed
fn scan_full_urls(text: &str) -> Vec<String> {
    FULL_URL
        .find_iter(text)
        .map(|m| m.as_str().trim().trim_end_matches(TRAILING_PUNCTUATION).to_string())
        .collect()
}

/// Bare domain tokens promoted to `https://`
fn scan_bare_domains(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| {
            let token = token
                .trim_matches(QUOTES)
                .trim_end_matches(TRAILING_PUNCTUATION)
                .trim_matches(QUOTES);
            if token.is_empty() || token.contains("://") {
                return None;
            }
            BARE_DOMAIN
                .is_match(token)
                .then(|| format!("https://{token}"))
        })
        .collect()
}

/// A string leaf that is itself a URL
fn url_leaf(leaf: &str) -> Option<&str> {
    let leaf = leaf.trim();
    (has_http_scheme(leaf) && !leaf.contains(char::is_whitespace)).then_some(leaf)
}

/// Case-insensitive `http://` or `https://` prefix check
fn has_http_scheme(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn collect_json_strings<'a>(value: &'a serde_json::Value, out: &mut Vec<&'a str>) {
    match value {
        serde_json::Value::String(s) => out.push(s),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_strings(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_json_strings(item, out);
            }
        }
        _ => {}
    }
}

fn collect_yaml_strings<'a>(value: &'a serde_yaml::Value, out: &mut Vec<&'a str>) {
    match value {
        serde_yaml::Value::String(s) => out.push(s),
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                collect_yaml_strings(item, out);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for item in map.values() {
                collect_yaml_strings(item, out);
            }
        }
        serde_yaml::Value::Tagged(tagged) => collect_yaml_strings(&tagged.value, out),
        _ => {}
    }
}

/// First field of every row, kept only if it already carries an http(s) scheme
fn scan_first_column(source_name: &str, text: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut urls = Vec::new();
    let mut discarded = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(source = source_name, row = row + 1, error = %e, "Skipping unreadable row");
                continue;
            }
        };
        let Some(first) = record.get(0).map(str::trim) else {
            continue;
        };
        if url_leaf(first).is_some() {
            urls.push(first.to_string());
        } else if !first.is_empty() {
            debug!(source = source_name, row = row + 1, value = first, "Discarding non-URL value");
            discarded += 1;
        }
    }

    if discarded > 0 {
        warn!(
            source = source_name,
            discarded, "Rows without an http(s) URL in the first column were ignored"
        );
    }
    urls
}
