//! Structured scan events and the sink they are reported through.
//!
//! The engine never logs directly. Every component receives an `EventSink`
//! and reports typed `ScanEvent`s to it; the binary wires in `TracingSink`,
//! tests wire in a recording sink.

use std::fmt;
use std::path::PathBuf;
use strum::IntoStaticStr;
use tracing::{error, info, warn};

use crate::core::config::ADVISORY_THREAD_LIMIT;

/// Everything the engine has to say while it runs.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScanEvent {
    Trying { site: String },
    Retrying { site: String, attempt: u32, attempts: u32 },
    FinalRetryFailed { site: String, attempts: u32 },
    BadResponse { site: String, status: u16 },
    ConnectionFailed { site: String, detail: String },
    Analysed { site: String },
    Discarded { site: String, test: String },
    TestMalfunction { site: String, test: String, detail: String },
    AnalysisMalfunction { site: String, analysis: String, detail: String },
    SessionFailed { detail: String },
    WorkerFailed { detail: String },
    ThreadCountAdvisory { threads: usize },
    SourceStarted { input: PathBuf, output: PathBuf, targets: usize },
    SourceFinished { input: PathBuf, lines: u64 },
    SourceSkipped { input: PathBuf, reason: String },
}

impl ScanEvent {
    /// The target this event is about, when there is one.
    pub fn site(&self) -> Option<&str> {
        match self {
            ScanEvent::Trying { site }
            | ScanEvent::Retrying { site, .. }
            | ScanEvent::FinalRetryFailed { site, .. }
            | ScanEvent::BadResponse { site, .. }
            | ScanEvent::ConnectionFailed { site, .. }
            | ScanEvent::Analysed { site }
            | ScanEvent::Discarded { site, .. }
            | ScanEvent::TestMalfunction { site, .. }
            | ScanEvent::AnalysisMalfunction { site, .. } => Some(site),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEvent::Trying { site } => write!(f, "[{site}] Trying site..."),
            ScanEvent::Retrying { site, attempt, attempts } => {
                write!(f, "[{site}] Timed out, retrying... ({attempt} of {attempts})!")
            }
            ScanEvent::FinalRetryFailed { site, attempts } => {
                write!(f, "[{site}] Final retry failed! ({attempts} of {attempts})")
            }
            ScanEvent::BadResponse { site, status } => {
                write!(f, "[{site}] Bad response ({status})")
            }
            ScanEvent::ConnectionFailed { site, detail } => {
                write!(f, "[{site}] Could not connect: {detail}")
            }
            ScanEvent::Analysed { site } => write!(f, "[{site}] Successfully analysed site!"),
            ScanEvent::Discarded { site, test } => {
                write!(f, "[{site}] Discarded by test function \"{test}\"")
            }
            ScanEvent::TestMalfunction { site, test, detail } => write!(
                f,
                "[{site}] Caught unexpected error in test function \"{test}\": {detail}"
            ),
            ScanEvent::AnalysisMalfunction { site, analysis, detail } => write!(
                f,
                "[{site}] Caught unexpected error in analysis function \"{analysis}\": {detail}"
            ),
            ScanEvent::SessionFailed { detail } => {
                write!(f, "Worker could not open an HTTP session: {detail}")
            }
            ScanEvent::WorkerFailed { detail } => write!(f, "Worker stopped abnormally: {detail}"),
            ScanEvent::ThreadCountAdvisory { threads } => write!(
                f,
                "Using more than {ADVISORY_THREAD_LIMIT} threads ({threads}) is not recommended and may cause connections to reset"
            ),
            ScanEvent::SourceStarted { input, output, targets } => write!(
                f,
                "Scanning {} ({targets} lines) into {}",
                input.display(),
                output.display()
            ),
            ScanEvent::SourceFinished { input, lines } => {
                write!(f, "Finished {}: {lines} result lines written", input.display())
            }
            ScanEvent::SourceSkipped { input, reason } => {
                write!(f, "{reason}, skipping {}!", input.display())
            }
        }
    }
}

/// Receives engine events. Implementations must be cheap and non-blocking.
pub trait EventSink: Send + Sync {
    fn info(&self, event: &ScanEvent);
    fn warn(&self, event: &ScanEvent);
    fn error(&self, event: &ScanEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn info(&self, event: &ScanEvent) {
        info!(kind = event.kind(), site = event.site(), "{event}");
    }

    fn warn(&self, event: &ScanEvent) {
        warn!(kind = event.kind(), site = event.site(), "{event}");
    }

    fn error(&self, event: &ScanEvent) {
        error!(kind = event.kind(), site = event.site(), "{event}");
    }
}
