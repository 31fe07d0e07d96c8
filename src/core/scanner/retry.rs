// src/core/scanner/retry.rs

use super::fetcher::Fetcher;
use crate::core::config::ScanConfig;
use crate::core::events::{EventSink, ScanEvent};
use crate::core::models::{FetchOutcome, Resolution, Target};

/// Fetches a target, retrying only on timeouts.
///
/// Makes at most `config.attempts()` attempts. HTTP and connection errors are
/// not transient and return immediately; a timeout on the final attempt
/// resolves to `Resolution::Exhausted`.
pub async fn resolve<F: Fetcher>(
    fetcher: &F,
    session: &F::Session,
    target: &Target,
    config: &ScanConfig,
    sink: &dyn EventSink,
) -> Resolution {
    let attempts = config.attempts();

    for attempt in 1..=attempts {
        match fetcher.fetch(session, target.as_str(), config.timeout()).await {
            FetchOutcome::Timeout if attempt < attempts => {
                sink.info(&ScanEvent::Retrying {
                    site: target.to_string(),
                    attempt,
                    attempts,
                });
            }
            FetchOutcome::Timeout => break,
            outcome => return Resolution::Fetched(outcome),
        }
    }

    sink.warn(&ScanEvent::FinalRetryFailed {
        site: target.to_string(),
        attempts,
    });
    Resolution::Exhausted { attempts }
}
