// src/core/scanner/worker.rs

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::fetcher::Fetcher;
use super::queue::{WorkItem, WorkQueue};
use super::retry::resolve;
use super::writer::WriterMessage;
use crate::core::config::ScanConfig;
use crate::core::events::{EventSink, ScanEvent};
use crate::core::models::{FetchOutcome, Resolution, Target};
use crate::core::pipeline::{classify, Classification};
use crate::core::plugins::PluginRegistry;

/// Everything one worker needs. Shared parts are read-only for the whole scan.
pub struct WorkerContext<F: Fetcher> {
    pub fetcher: Arc<F>,
    pub registry: Arc<PluginRegistry>,
    pub config: Arc<ScanConfig>,
    pub sink: Arc<dyn EventSink>,
    pub queue: WorkQueue,
    pub results: UnboundedSender<WriterMessage>,
}

/// Processes targets from the work queue until it pops a `Shutdown`.
///
/// Every per-target failure is absorbed here and rendered into the result
/// line; nothing is returned to the coordinator but the number of targets
/// handled.
pub async fn run_worker<F: Fetcher>(ctx: WorkerContext<F>) -> usize {
    let session = ctx.fetcher.open_session();
    if let Err(detail) = &session {
        ctx.sink.error(&ScanEvent::SessionFailed { detail: detail.clone() });
    }

    let mut handled = 0;
    loop {
        let raw = match ctx.queue.pop().await {
            WorkItem::Target(raw) => raw,
            WorkItem::Shutdown => break,
        };

        let target = Target::normalize(&raw);
        ctx.sink.info(&ScanEvent::Trying { site: target.to_string() });

        let resolution = match &session {
            Ok(session) => {
                resolve(ctx.fetcher.as_ref(), session, &target, &ctx.config, ctx.sink.as_ref()).await
            }
            Err(detail) => Resolution::Fetched(FetchOutcome::ConnectionError(detail.clone())),
        };

        match classify(&target, &resolution, &ctx.registry, &ctx.config, ctx.sink.as_ref()) {
            Classification::Emit(line) => {
                // The writer outlives every worker, so the queue is still open.
                let _ = ctx.results.send(WriterMessage::Line(line));
            }
            Classification::Discarded => {}
        }
        handled += 1;
    }

    debug!(handled, "Worker shutting down.");
    handled
}
