//! Tolerant incremental parser for the embedded `<actions>` tag.
//!
//! The model ends each reply with suggested quick replies encoded as
//! `<actions>["...", "..."]</actions>`. During streaming the tag arrives
//! in fragments, so "not parseable yet" is the ordinary case, not an
//! error: the scan reports a formal not-ready state and the caller simply
//! tries again after the next append.

use std::sync::LazyLock;

use regex::Regex;

/// First delimited tag region, tolerating embedded line breaks.
static ACTION_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<actions>(.*?)</actions>").expect("Invalid action-tag regex"));

const OPEN_TAG: &str = "<actions>";

/// Result of scanning accumulated reply text for the actions tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagScan {
    /// No opening delimiter anywhere; text stands as-is.
    Absent,
    /// A tag has opened but is either unclosed or its content is not yet
    /// a valid JSON array of strings. Expected mid-stream; never an error.
    Pending,
    /// The tag closed and parsed. `stripped_text` is the full text with
    /// the tag region removed and trimmed.
    Ready {
        stripped_text: String,
        actions: Vec<String>,
    },
}

/// Parser for the suggested-replies tag.
pub struct ActionTagParser;

impl ActionTagParser {
    /// Scan the entire accumulated text for one actions tag.
    ///
    /// The scan is idempotent over unchanged input and cheap enough to
    /// re-run after every chunk append.
    pub fn scan(text: &str) -> TagScan {
        if let Some(caps) = ACTION_TAG_RE.captures(text) {
            let payload = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            match serde_json::from_str::<Vec<String>>(payload) {
                Ok(actions) => TagScan::Ready {
                    stripped_text: ACTION_TAG_RE.replace(text, "").trim().to_string(),
                    actions,
                },
                // Closed but malformed; keep waiting. If it never parses
                // the actions simply stay unset for the turn.
                Err(_) => TagScan::Pending,
            }
        } else if text.contains(OPEN_TAG) {
            TagScan::Pending
        } else {
            TagScan::Absent
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
