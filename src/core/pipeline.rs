// src/core/pipeline.rs

//! Turns a resolved fetch into a result line.
//!
//! Failed fetches get a status-only line. Live pages run every test, then
//! every analysis, in registration order. Plugin malfunctions are contained
//! per plugin and never cost the target its remaining fields.

use std::panic::{self, AssertUnwindSafe};

use crate::core::config::{ScanConfig, TestFailurePolicy};
use crate::core::events::{EventSink, ScanEvent};
use crate::core::models::{FetchOutcome, Resolution, ResultLine, SiteStatus, Target};
use crate::core::plugins::{Page, PluginError, PluginRegistry, Verdict};

/// What the pipeline decided for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Emit(ResultLine),
    Discarded,
}

pub fn classify(
    target: &Target,
    resolution: &Resolution,
    registry: &PluginRegistry,
    config: &ScanConfig,
    sink: &dyn EventSink,
) -> Classification {
    let separator = config.separator();
    let site = || target.to_string();

    let response = match resolution {
        Resolution::Fetched(FetchOutcome::Success(response)) => response,
        Resolution::Fetched(FetchOutcome::HttpError(status)) => {
            sink.warn(&ScanEvent::BadResponse { site: site(), status: *status });
            return status_only(target, separator, SiteStatus::Rejected(*status));
        }
        Resolution::Fetched(FetchOutcome::ConnectionError(detail)) => {
            sink.warn(&ScanEvent::ConnectionFailed { site: site(), detail: detail.clone() });
            return status_only(target, separator, SiteStatus::Inaccessible);
        }
        Resolution::Fetched(FetchOutcome::Timeout) | Resolution::Exhausted { .. } => {
            return status_only(target, separator, SiteStatus::TimedOut);
        }
    };

    let page = Page {
        target: target.as_str(),
        body: &response.body,
        headers: &response.headers,
    };

    for test in registry.tests() {
        match guarded(|| test.check(&page)) {
            Ok(Verdict::Proceed) => {}
            Ok(Verdict::Discard) => {
                sink.info(&ScanEvent::Discarded { site: site(), test: test.name().to_string() });
                return Classification::Discarded;
            }
            Err(e) => {
                sink.warn(&ScanEvent::TestMalfunction {
                    site: site(),
                    test: test.name().to_string(),
                    detail: e.to_string(),
                });
                if config.test_failure_policy() == TestFailurePolicy::Inaccessible {
                    return status_only(target, separator, SiteStatus::Inaccessible);
                }
            }
        }
    }

    let mut line = ResultLine::with_status(target, separator, SiteStatus::Live);
    for analysis in registry.analyses() {
        match guarded(|| analysis.analyse(&page)) {
            Ok(field) => line.push_field(separator, &field),
            Err(e) => {
                sink.error(&ScanEvent::AnalysisMalfunction {
                    site: site(),
                    analysis: analysis.name().to_string(),
                    detail: e.to_string(),
                });
                line.push_field(separator, "");
            }
        }
    }

    sink.info(&ScanEvent::Analysed { site: site() });
    Classification::Emit(line)
}

fn status_only(target: &Target, separator: char, status: SiteStatus) -> Classification {
    Classification::Emit(ResultLine::with_status(target, separator, status))
}

/// Runs one plugin call, turning a panic into a `PluginError`.
fn guarded<T>(call: impl FnOnce() -> Result<T, PluginError>) -> Result<T, PluginError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(PluginError::from_panic(payload)))
}
