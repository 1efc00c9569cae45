//! Range selection and chunking of a URL list
//!
//! Ranges are 1-based and inclusive: `"start-end"`, `"start-"` or `"-end"`.
//! Chunking splits the selected list into consecutive [`ScanBatch`]es that are
//! dispatched and persisted one after another.

use crate::error::{Error, Result};
use crate::types::ScanBatch;
use tracing::{info, warn};

/// Parsed 1-based inclusive range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeSpec {
    /// First position to keep (defaults to 1)
    pub start: Option<usize>,
    /// Last position to keep (defaults to the list length)
    pub end: Option<usize>,
}

impl std::str::FromStr for RangeSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("invalid range '{s}'"), "range");

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let parse_bound = |bound: &str| -> Result<Option<usize>> {
            let bound = bound.trim();
            if bound.is_empty() {
                return Ok(None);
            }
            bound.parse::<usize>().map(Some).map_err(|_| invalid())
        };

        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }
}

impl RangeSpec {
    /// Resolve against a list of `len` items, returning the zero-based slice bounds
    ///
    /// A start beyond the list yields an empty range. A start at or past the end
    /// yields everything from start onwards.
    pub fn resolve(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.start.unwrap_or(1).max(1);
        let end = self.end.unwrap_or(len).min(len);

        if start > len {
            return len..len;
        }
        if start >= end {
            return (start - 1)..len;
        }
        (start - 1)..end
    }
}

/// Narrow `urls` to the positions named by `range`
///
/// An unparsable range (non-numeric or negative bounds) is ignored with a warning
/// and the full list is returned.
pub fn apply_range(urls: Vec<String>, range: Option<&str>) -> Vec<String> {
    let Some(raw) = range else {
        return urls;
    };

    let spec = match raw.parse::<RangeSpec>() {
        Ok(spec) => spec,
        Err(e) => {
            warn!(range = raw, error = %e, "Ignoring range, processing the full list");
            return urls;
        }
    };

    let total = urls.len();
    let bounds = spec.resolve(total);
    info!(
        range = raw,
        first = bounds.start + 1,
        last = bounds.end,
        total,
        "Applying URL range"
    );

    let mut urls = urls;
    urls.truncate(bounds.end);
    urls.drain(..bounds.start);
    urls
}

/// Split `urls` into consecutive batches of `size`
///
/// `None` or `Some(0)` yields a single batch with the whole input. Otherwise every
/// batch holds exactly `size` URLs except possibly the last, and batches cover the
/// input once, in order.
pub fn chunk(urls: &[String], size: Option<usize>) -> Vec<ScanBatch> {
    match size {
        Some(size) if size > 0 => urls
            .chunks(size)
            .map(|part| ScanBatch::new(part.to_vec()))
            .collect(),
        _ => vec![ScanBatch::new(urls.to_vec())],
    }
}
