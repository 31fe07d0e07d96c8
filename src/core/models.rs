// src/core/models.rs

use reqwest::header::HeaderMap;
use std::fmt;

/// Schemes that mark a line as already being a URL.
const KNOWN_SCHEMES: &[&str] = &["http://", "https://"];

/// Scheme prepended to bare hostnames.
const DEFAULT_SCHEME: &str = "http://";

// --- Target ---

/// A single normalized hostname or URL, ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// Normalizes one raw input line.
    ///
    /// A single trailing line terminator (`\n` or `\r\n`) is stripped, and
    /// `http://` is prepended unless the line already carries an HTTP(S) scheme.
    pub fn normalize(raw: &str) -> Self {
        let line = match raw.strip_suffix('\n') {
            Some(stripped) => stripped.strip_suffix('\r').unwrap_or(stripped),
            None => raw,
        };

        let has_scheme = KNOWN_SCHEMES.iter().any(|scheme| {
            line.get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        });

        if has_scheme {
            Self(line.to_string())
        } else {
            Self(format!("{DEFAULT_SCHEME}{line}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Fetch results ---

/// A response that came back with a 2xx status.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// The outcome of a single fetch attempt.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Response),
    Timeout,
    HttpError(u16),
    ConnectionError(String),
}

/// What the retry controller settled on for one target.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The last attempt produced a definitive outcome.
    Fetched(FetchOutcome),
    /// Every attempt timed out.
    Exhausted { attempts: u32 },
}

// --- Output ---

/// The status field that follows the bracketed target in every result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Live,
    Inaccessible,
    Rejected(u16),
    TimedOut,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteStatus::Live => write!(f, "Live"),
            SiteStatus::Inaccessible => write!(f, "Inaccessible"),
            SiteStatus::Rejected(status) => write!(f, "Inaccessible ({status})"),
            SiteStatus::TimedOut => write!(f, "Timed out"),
        }
    }
}

/// One formatted output line: `[target]` followed by separator-delimited fields.
///
/// Fields never contain line terminators; any found in plugin output are
/// replaced with spaces so that one target always maps to one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultLine(String);

impl ResultLine {
    pub fn new(target: &Target) -> Self {
        let mut line = String::from("[");
        line.extend(single_line(target.as_str()));
        line.push(']');
        Self(line)
    }

    pub fn with_status(target: &Target, separator: char, status: SiteStatus) -> Self {
        let mut line = Self::new(target);
        line.push_field(separator, &status.to_string());
        line
    }

    pub fn push_field(&mut self, separator: char, field: &str) {
        self.0.push(separator);
        self.0.extend(single_line(field));
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn single_line(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
}

impl fmt::Display for ResultLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
