// src/core/config.rs

use crate::core::error::ConfigError;
use std::time::Duration;
use strum::{Display, EnumString};

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_THREAD_COUNT: usize = 50;
pub const DEFAULT_SEPARATOR: char = '|';

/// Above this many threads remote hosts start resetting connections.
pub const ADVISORY_THREAD_LIMIT: usize = 50;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:60.0) Gecko/20100101 Firefox/60.0";

/// How a test function that malfunctions (errors or panics) is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TestFailurePolicy {
    /// The test counts as passed and classification continues.
    #[default]
    Pass,
    /// The target is reported as `Inaccessible` and analysis is skipped.
    Inaccessible,
}

/// Immutable per-scan configuration.
///
/// Values are validated on the way in; a `ScanConfig` that exists is always
/// within bounds.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    timeout: Duration,
    retries: u32,
    thread_count: usize,
    separator: char,
    test_failure_policy: TestFailurePolicy,
    flush_each_line: bool,
    user_agent: String,
}

impl ScanConfig {
    /// Builds a configuration from raw values as they arrive from the outer surface.
    pub fn new(
        timeout_secs: i64,
        retries: i64,
        thread_count: i64,
        separator: char,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout: validate_timeout(timeout_secs)?,
            retries: validate_retries(retries)?,
            thread_count: validate_thread_count(thread_count)?,
            separator: validate_separator(separator)?,
            test_failure_policy: TestFailurePolicy::default(),
            flush_each_line: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_test_failure_policy(mut self, policy: TestFailurePolicy) -> Self {
        self.test_failure_policy = policy;
        self
    }

    pub fn with_flush_each_line(mut self, flush: bool) -> Self {
        self.flush_each_line = flush;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn set_timeout(&mut self, timeout_secs: i64) -> Result<(), ConfigError> {
        self.timeout = validate_timeout(timeout_secs)?;
        Ok(())
    }

    pub fn set_retries(&mut self, retries: i64) -> Result<(), ConfigError> {
        self.retries = validate_retries(retries)?;
        Ok(())
    }

    pub fn set_thread_count(&mut self, thread_count: i64) -> Result<(), ConfigError> {
        self.thread_count = validate_thread_count(thread_count)?;
        Ok(())
    }

    pub fn set_separator(&mut self, separator: char) -> Result<(), ConfigError> {
        self.separator = validate_separator(separator)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Fetch attempts made per target. Zero retries still means one attempt.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Workers spawned per scan; the remaining thread is the result writer.
    pub fn worker_count(&self) -> usize {
        self.thread_count - 1
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn test_failure_policy(&self) -> TestFailurePolicy {
        self.test_failure_policy
    }

    pub fn flush_each_line(&self) -> bool {
        self.flush_each_line
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn exceeds_advisory_limit(&self) -> bool {
        self.thread_count > ADVISORY_THREAD_LIMIT
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            thread_count: DEFAULT_THREAD_COUNT,
            separator: DEFAULT_SEPARATOR,
            test_failure_policy: TestFailurePolicy::default(),
            flush_each_line: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn validate_timeout(timeout_secs: i64) -> Result<Duration, ConfigError> {
    u64::try_from(timeout_secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or(ConfigError::InvalidTimeout(timeout_secs))
}

fn validate_retries(retries: i64) -> Result<u32, ConfigError> {
    u32::try_from(retries).map_err(|_| ConfigError::InvalidRetries(retries))
}

fn validate_thread_count(thread_count: i64) -> Result<usize, ConfigError> {
    usize::try_from(thread_count)
        .ok()
        .filter(|count| *count >= 2)
        .ok_or(ConfigError::InvalidThreadCount(thread_count))
}

fn validate_separator(separator: char) -> Result<char, ConfigError> {
    if matches!(separator, '\n' | '\r') {
        Err(ConfigError::InvalidSeparator(separator))
    } else {
        Ok(separator)
    }
}
