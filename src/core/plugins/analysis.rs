// src/core/plugins/analysis.rs

use once_cell::sync::Lazy;
use regex::{escape, RegexSet};
use reqwest::header::SERVER;
use tracing::debug;

use super::{Analysis, Page, PluginError};
use crate::core::knowledge_base::{
    CGI_BIN_MARKER, FILE_EXTENSION_SIGNATURES, INDEX_MARKER, INDEX_SERVERS, KEYWORD_SIGNATURES,
    MIN_INDEX_LINES,
};

const INDEXED: &str = "Indexed";
const NOT_INDEXED: &str = "Not indexed";

/// All signatures in table order, as one case-insensitive set.
static SIGNATURE_SET: Lazy<Result<RegexSet, regex::Error>> = Lazy::new(|| {
    RegexSet::new(signatures().map(|signature| format!("(?i){}", escape(signature))))
});

fn signatures() -> impl Iterator<Item = &'static str> {
    FILE_EXTENSION_SIGNATURES
        .iter()
        .chain(KEYWORD_SIGNATURES.iter())
        .copied()
}

/// Flags pages that look like auto-generated directory listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectIndexing;

impl Analysis for DetectIndexing {
    fn name(&self) -> &str {
        "detect_indexing"
    }

    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError> {
        if !page.body.contains(INDEX_MARKER) {
            return Ok(NOT_INDEXED.to_string());
        }

        let lines = page.body.matches('\n').count();
        let server = page
            .headers
            .get(SERVER)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();

        // The page body is trusted over the Server header, but either may name the server.
        if let Some(known) = INDEX_SERVERS
            .iter()
            .find(|known| page.body.contains(known.name) || server.contains(known.name))
        {
            debug!(server = known.name, lines, "Directory listing candidate.");
            if lines < known.min_lines
                || (lines < known.min_lines + 1 && page.body.contains(CGI_BIN_MARKER))
            {
                return Ok(NOT_INDEXED.to_string());
            }
        }

        if lines < MIN_INDEX_LINES {
            return Ok(NOT_INDEXED.to_string());
        }
        Ok(INDEXED.to_string())
    }
}

/// Lists the interesting file extensions and keywords found in the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchSigs;

impl Analysis for MatchSigs {
    fn name(&self) -> &str {
        "match_sigs"
    }

    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError> {
        let set = SIGNATURE_SET
            .as_ref()
            .map_err(|e| PluginError::new(format!("signature set failed to compile: {e}")))?;
        let matched = set.matches(page.body);
        let found: Vec<&str> = signatures()
            .enumerate()
            .filter(|(index, _)| matched.matched(*index))
            .map(|(_, signature)| signature)
            .collect();
        Ok(found.join(", "))
    }
}

/// A coarse language check: anything outside ASCII counts as non-English.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsEnglish;

impl Analysis for IsEnglish {
    fn name(&self) -> &str {
        "is_english"
    }

    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError> {
        let verdict = if page.body.is_ascii() {
            "English only"
        } else {
            "Non-English present"
        };
        Ok(verdict.to_string())
    }
}

/// Dumps every response header as `name: value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripHeaders;

impl Analysis for StripHeaders {
    fn name(&self) -> &str {
        "strip_headers"
    }

    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError> {
        let headers: Vec<String> = page
            .headers
            .iter()
            .map(|(name, value)| format!("{name}: {}", String::from_utf8_lossy(value.as_bytes())))
            .collect();
        Ok(headers.join(", "))
    }
}
