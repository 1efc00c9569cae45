//! Error codes and log categories for failed visits.

use crate::types::{ErrorCategory, TaskOutcome};
use regex::Regex;
use std::sync::LazyLock;

/// Code for a visit cut off by the engine-side timeout
pub const TIMEOUT_CODE: &str = "TIMEOUT";

/// Code for a URL whose visit panicked or whose worker died before reporting an outcome
pub const DISPATCH_FAILED_CODE: &str = "DISPATCH_FAILED";

/// Code used when an error message has no usable characters
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

const MAX_CODE_LEN: usize = 64;

/// Tokens marking DNS, connection and timeout class failures
///
/// Each token is one or more whole `_`-separated segments of a code.
const NAVIGATION_TOKENS: &[&str] = &[
    "NAME_NOT_RESOLVED",
    "NAME_RESOLUTION",
    "DNS",
    "CONNECTION",
    "CONNECT",
    "REFUSED",
    "RESET",
    "TIMED_OUT",
    "TIMEOUT",
    "ADDRESS_UNREACHABLE",
    "INTERNET_DISCONNECTED",
    "NETWORK_CHANGED",
];

#[allow(clippy::expect_used)]
static NET_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"net::(ERR_[A-Z0-9_]+)").expect("net error pattern is valid"));

/// URLs quoted inside an error message
#[allow(clippy::expect_used)]
static EMBEDDED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b[a-z][a-z0-9+.-]*://[^\s"'<>`]*"#).expect("embedded URL pattern is valid")
});

/// Derive a short machine-parsable code from an error message
///
/// A browser network token (`net::ERR_NAME_NOT_RESOLVED`) wins. Otherwise URLs are
/// removed from the message, the rest is upper-cased and every run of
/// non-alphanumeric characters becomes `_`.
///
/// ```
/// use adscan::executor::derive_error_code;
///
/// assert_eq!(
///     derive_error_code("page.goto: net::ERR_CONNECTION_REFUSED at https://a.example"),
///     "ERR_CONNECTION_REFUSED"
/// );
/// assert_eq!(derive_error_code("Target closed!"), "TARGET_CLOSED");
/// ```
pub fn derive_error_code(message: &str) -> String {
    if let Some(captures) = NET_ERROR.captures(message)
        && let Some(token) = captures.get(1)
    {
        return token.as_str().to_string();
    }

    let code = slugify(&EMBEDDED_URL.replace_all(message, " "));
    if code.is_empty() {
        UNKNOWN_ERROR_CODE.to_string()
    } else {
        code
    }
}

/// Upper-case `text` and collapse non-alphanumeric runs to `_`, capped at the code length
fn slugify(text: &str) -> String {
    let mut code = String::with_capacity(text.len().min(MAX_CODE_LEN));
    let mut pending_separator = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !code.is_empty() {
                code.push('_');
            }
            pending_separator = false;
            code.push(c.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
        if code.len() >= MAX_CODE_LEN {
            break;
        }
    }
    code.truncate(MAX_CODE_LEN);
    code.trim_end_matches('_').to_string()
}

/// True if `token` appears in `code` as a run of whole segments
fn has_segment_token(code: &str, token: &str) -> bool {
    format!("_{code}_").contains(&format!("_{token}_"))
}

/// Route a failure to its log category by code and message
///
/// Tokens are matched as whole segments of the code and of the message's own code,
/// so identifiers such as `connectSlots` or hosts such as `resetera.example` never
/// count as network failures.
pub fn classify_failure(error_code: &str, message: &str) -> ErrorCategory {
    let code = slugify(error_code);
    let message_code = derive_error_code(message);
    let is_navigation = NAVIGATION_TOKENS.iter().any(|token| {
        has_segment_token(&code, token) || has_segment_token(&message_code, token)
    });

    if is_navigation {
        ErrorCategory::NavigationError
    } else {
        ErrorCategory::ProcessingError
    }
}

/// Log category for an outcome, or None for a success
pub fn outcome_category(outcome: &TaskOutcome) -> Option<ErrorCategory> {
    match outcome {
        TaskOutcome::Success(_) => None,
        TaskOutcome::NoSignal { .. } => Some(ErrorCategory::NoSignal),
        TaskOutcome::Failure {
            error_code,
            message,
            ..
        } => Some(classify_failure(error_code, message)),
    }
}
