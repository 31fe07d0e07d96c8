// src/core/scanner/mod.rs

//! The scan coordinator and the components it drives.
//!
//! One scan per input source: the whole source is queued up front, a writer
//! task and `thread_count - 1` worker tasks are started, and shutdown follows
//! a fixed order so that no result line can arrive after the writer stops.

pub mod fetcher;
pub mod queue;
pub mod retry;
pub mod worker;
pub mod writer;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use self::fetcher::Fetcher;
use self::queue::{WorkItem, WorkQueue};
use self::worker::{run_worker, WorkerContext};
use self::writer::{run_writer, WriterMessage};
use crate::core::config::ScanConfig;
use crate::core::error::{ConfigError, ScanError};
use crate::core::events::{EventSink, ScanEvent};
use crate::core::plugins::PluginRegistry;

const OUTPUT_SUFFIX: &str = "-sites-analysed.txt";

/// What happened to one input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub targets: usize,
    pub lines_written: u64,
}

/// Owns the configuration and plugins of a run and scans input sources with them.
///
/// Reconfiguration needs `&mut self` while a scan borrows `&self`, so a
/// running scan always sees one fixed `ScanConfig`.
pub struct Scanner<F: Fetcher> {
    config: ScanConfig,
    registry: Arc<PluginRegistry>,
    fetcher: Arc<F>,
    sink: Arc<dyn EventSink>,
}

impl<F: Fetcher> Scanner<F> {
    pub fn new(
        config: ScanConfig,
        registry: PluginRegistry,
        fetcher: Arc<F>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let scanner = Self {
            config,
            registry: Arc::new(registry),
            fetcher,
            sink,
        };
        scanner.advise_on_thread_count();
        scanner
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn set_timeout(&mut self, timeout_secs: i64) -> Result<(), ConfigError> {
        self.config.set_timeout(timeout_secs)
    }

    pub fn set_retries(&mut self, retries: i64) -> Result<(), ConfigError> {
        self.config.set_retries(retries)
    }

    /// Fails below two threads; above the advisory limit it succeeds with a warning.
    pub fn set_thread_count(&mut self, thread_count: i64) -> Result<(), ConfigError> {
        self.config.set_thread_count(thread_count)?;
        self.advise_on_thread_count();
        Ok(())
    }

    pub fn set_registry(&mut self, registry: PluginRegistry) {
        self.registry = Arc::new(registry);
    }

    fn advise_on_thread_count(&self) {
        if self.config.exceeds_advisory_limit() {
            self.sink.warn(&ScanEvent::ThreadCountAdvisory {
                threads: self.config.thread_count(),
            });
        }
    }

    /// Scans every input in order. A source that cannot be read or written is
    /// logged and skipped; the others still run.
    pub async fn scan(&self, inputs: &[PathBuf]) -> Vec<SourceReport> {
        let mut seen = HashSet::new();
        let mut reports = Vec::new();

        for input in inputs.iter().filter(|input| seen.insert(*input)) {
            match self.scan_source(input).await {
                Ok(report) => reports.push(report),
                Err(e) => self.sink.error(&ScanEvent::SourceSkipped {
                    input: input.clone(),
                    reason: error_chain(&e),
                }),
            }
        }
        reports
    }

    async fn scan_source(&self, input: &Path) -> Result<SourceReport, ScanError> {
        let bytes = tokio::fs::read(input)
            .await
            .map_err(|source| ScanError::InputUnreadable {
                path: input.to_path_buf(),
                source,
            })?;
        let lines = decode_lines(&bytes);

        let output = output_path_for(input);
        let destination = tokio::fs::File::create(&output)
            .await
            .map_err(|source| ScanError::OutputUnwritable {
                path: output.clone(),
                source,
            })?;

        let targets = lines.len();
        self.sink.info(&ScanEvent::SourceStarted {
            input: input.to_path_buf(),
            output: output.clone(),
            targets,
        });

        let lines_written = self
            .scan_lines(lines, destination)
            .await
            .map_err(|source| ScanError::WriteFailed {
                path: output.clone(),
                source,
            })?;

        self.sink.info(&ScanEvent::SourceFinished {
            input: input.to_path_buf(),
            lines: lines_written,
        });
        Ok(SourceReport {
            input: input.to_path_buf(),
            output,
            targets,
            lines_written,
        })
    }

    /// Runs one scan over `lines`, writing result lines to `destination`.
    ///
    /// Returns the number of lines written, or the writer's first I/O error.
    pub async fn scan_lines<W>(&self, lines: Vec<String>, destination: W) -> io::Result<u64>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let config = Arc::new(self.config.clone());
        let workers = config.worker_count();

        let queue = WorkQueue::new();
        for line in lines {
            queue.push(WorkItem::Target(line));
        }

        let (results, result_queue) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(result_queue, destination, config.flush_each_line()));

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            pool.spawn(run_worker(WorkerContext {
                fetcher: Arc::clone(&self.fetcher),
                registry: Arc::clone(&self.registry),
                config: Arc::clone(&config),
                sink: Arc::clone(&self.sink),
                queue: queue.clone(),
                results: results.clone(),
            }));
        }

        // Sentinels go in only after every real item.
        for _ in 0..workers {
            queue.push(WorkItem::Shutdown);
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(handled) => debug!(handled, "Worker joined."),
                Err(e) => self.sink.error(&ScanEvent::WorkerFailed { detail: e.to_string() }),
            }
        }

        // Every worker is gone, so nothing can follow this message.
        let _ = results.send(WriterMessage::Shutdown);
        writer.await.map_err(io::Error::other)?
    }
}

/// `<dir>/<stem>-sites-analysed.txt` next to the input.
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}"))
}

/// Decodes the input as ISO-8859-1 and splits it into lines, keeping terminators.
pub fn decode_lines(bytes: &[u8]) -> Vec<String> {
    let text: String = bytes.iter().copied().map(char::from).collect();
    text.split_inclusive('\n').map(str::to_string).collect()
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TestFailurePolicy;
    use crate::core::models::FetchOutcome;
    use crate::core::plugins::{analysis_fn, test_fn, PluginError, Verdict};
    use crate::core::test_utils::{
        page, BrokenFetcher, FailingWriter, RecordingSink, ScriptedFetcher, SharedBuffer,
    };
    use rstest::rstest;
    use tracing::Level;

    fn ok_registry() -> PluginRegistry {
        PluginRegistry::new().with_analysis(analysis_fn("ok", |_| Ok("OK".to_string())))
    }

    fn scanner<F: Fetcher>(
        fetcher: F,
        registry: PluginRegistry,
        threads: i64,
    ) -> (Scanner<F>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let config = ScanConfig::new(5, 1, threads, '|').unwrap();
        let scanner = Scanner::new(config, registry, Arc::new(fetcher), sink.clone());
        (scanner, sink)
    }

    fn lines(hosts: &[&str]) -> Vec<String> {
        hosts.iter().map(|host| format!("{host}\n")).collect()
    }

    async fn run<F: Fetcher>(scanner: &Scanner<F>, input: Vec<String>) -> Vec<String> {
        let out = SharedBuffer::default();
        scanner.scan_lines(input, out.clone()).await.unwrap();
        let mut written = out.lines();
        written.sort();
        written
    }

    #[rstest]
    #[case(2)]
    #[case(4)]
    #[case(16)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn live_and_unreachable_hosts(#[case] threads: i64) {
        let fetcher = ScriptedFetcher::new().script("http://example.com", vec![page("<p>hi</p>")]);
        let (scanner, _) = scanner(fetcher, ok_registry(), threads);

        let written = run(&scanner, lines(&["example.com", "bad.invalid"])).await;
        assert_eq!(written, ["[http://bad.invalid]|Inaccessible", "[http://example.com]|Live|OK"]);
    }

    #[tokio::test]
    async fn timed_out_hosts_are_reported() {
        let fetcher = ScriptedFetcher::new().script("http://slow.example", vec![FetchOutcome::Timeout]);
        let (scanner, _) = scanner(fetcher, ok_registry(), 2);

        let written = run(&scanner, lines(&["slow.example"])).await;
        assert_eq!(written, ["[http://slow.example]|Timed out"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn discarded_targets_write_nothing() {
        let mut fetcher = ScriptedFetcher::new();
        for n in 0..20 {
            fetcher = fetcher.script(&format!("http://host{n}.example"), vec![page("parked")]);
        }
        let registry = ok_registry().with_test(test_fn("odd_hosts", |page| {
            let n: u32 = page
                .target
                .trim_start_matches("http://host")
                .trim_end_matches(".example")
                .parse()
                .unwrap();
            Ok(if n % 2 == 1 { Verdict::Discard } else { Verdict::Proceed })
        }));
        let (scanner, _) = scanner(fetcher, registry, 5);

        let hosts: Vec<String> = (0..20).map(|n| format!("host{n}.example\n")).collect();
        let out = SharedBuffer::default();
        let written = scanner.scan_lines(hosts, out.clone()).await.unwrap();

        assert_eq!(written, 10);
        assert_eq!(out.lines().len(), 10);
        assert!(out.lines().iter().all(|line| line.ends_with("|Live|OK")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn repeated_scans_yield_the_same_lines() {
        let fetcher = ScriptedFetcher::new()
            .script("http://a.example", vec![page("a")])
            .script("http://b.example", vec![FetchOutcome::HttpError(500)])
            .script("http://c.example", vec![FetchOutcome::Timeout]);
        let registry = PluginRegistry::new()
            .with_analysis(analysis_fn("body", |page| Ok(page.body.to_string())));
        let (scanner, _) = scanner(fetcher, registry, 3);
        let input = lines(&["a.example", "b.example", "c.example", "d.example"]);

        let first = run(&scanner, input.clone()).await;
        let second = run(&scanner, input).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[tokio::test]
    async fn faulty_test_does_not_block_analyses() {
        let fetcher = ScriptedFetcher::new().script("http://example.com", vec![page("x")]);
        let registry = ok_registry().with_test(test_fn("faulty", |_| Err(PluginError::new("boom"))));
        let (scanner, _) = scanner(fetcher, registry, 2);

        let written = run(&scanner, lines(&["example.com"])).await;
        assert_eq!(written, ["[http://example.com]|Live|OK"]);
    }

    #[tokio::test]
    async fn broken_sessions_still_produce_lines() {
        let (scanner, sink) = scanner(BrokenFetcher, ok_registry(), 3);

        let written = run(&scanner, lines(&["a.example", "b.example"])).await;
        assert_eq!(written, ["[http://a.example]|Inaccessible", "[http://b.example]|Inaccessible"]);
        assert_eq!(
            sink.at(Level::ERROR)
                .iter()
                .filter(|event| matches!(event, ScanEvent::SessionFailed { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let (scanner, _) = scanner(ScriptedFetcher::new(), ok_registry(), 4);
        assert!(run(&scanner, Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn writer_failure_is_returned() {
        let (scanner, _) = scanner(ScriptedFetcher::new(), ok_registry(), 2);
        let err = scanner
            .scan_lines(lines(&["a.example"]), FailingWriter)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn thread_count_is_validated_between_scans() {
        let (mut scanner, sink) = scanner(ScriptedFetcher::new(), ok_registry(), 2);

        assert_eq!(scanner.set_thread_count(1), Err(ConfigError::InvalidThreadCount(1)));
        assert_eq!(scanner.config().thread_count(), 2);
        assert!(sink.events().is_empty());

        scanner.set_thread_count(51).unwrap();
        assert_eq!(scanner.config().thread_count(), 51);
        assert_eq!(sink.at(Level::WARN), vec![ScanEvent::ThreadCountAdvisory { threads: 51 }]);
    }

    #[test]
    fn oversized_pool_is_advised_at_construction() {
        let (_, sink) = scanner(ScriptedFetcher::new(), ok_registry(), 80);
        assert_eq!(sink.at(Level::WARN), vec![ScanEvent::ThreadCountAdvisory { threads: 80 }]);
    }

    #[test]
    fn timeout_and_retries_are_validated() {
        let (mut scanner, _) = scanner(ScriptedFetcher::new(), ok_registry(), 2);
        assert_eq!(scanner.set_timeout(0), Err(ConfigError::InvalidTimeout(0)));
        assert_eq!(scanner.set_retries(-1), Err(ConfigError::InvalidRetries(-1)));
        scanner.set_timeout(10).unwrap();
        scanner.set_retries(0).unwrap();
        assert_eq!(scanner.config().timeout().as_secs(), 10);
        assert_eq!(scanner.config().attempts(), 1);
    }

    #[tokio::test]
    async fn replaced_registry_applies_to_the_next_scan() {
        let fetcher = ScriptedFetcher::new().script("http://example.com", vec![page("x")]);
        let (mut scanner, _) = scanner(fetcher, ok_registry(), 2);
        scanner.set_registry(
            PluginRegistry::new().with_test(test_fn("veto", |_| Ok(Verdict::Discard))),
        );
        assert!(run(&scanner, lines(&["example.com"])).await.is_empty());
    }

    #[tokio::test]
    async fn scans_files_and_skips_unreadable_ones() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("hosts.txt");
        let missing = dir.path().join("missing.txt");
        let second = dir.path().join("more.list");
        std::fs::write(&first, "example.com\nbad.invalid\n").unwrap();
        std::fs::write(&second, b"caf\xe9.example").unwrap();

        let fetcher = ScriptedFetcher::new().script("http://example.com", vec![page("hi")]);
        let (scanner, sink) = scanner(fetcher, ok_registry(), 3);
        let reports = scanner
            .scan(&[first.clone(), missing.clone(), second.clone(), first.clone()])
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].output, dir.path().join("hosts-sites-analysed.txt"));
        assert_eq!(reports[0].targets, 2);
        assert_eq!(reports[0].lines_written, 2);

        let mut written: Vec<String> = std::fs::read_to_string(&reports[0].output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        written.sort();
        assert_eq!(written, ["[http://bad.invalid]|Inaccessible", "[http://example.com]|Live|OK"]);

        assert_eq!(
            std::fs::read_to_string(dir.path().join("more-sites-analysed.txt")).unwrap(),
            "[http://café.example]|Inaccessible\n"
        );

        let skipped = sink.at(Level::ERROR);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(&skipped[0], ScanEvent::SourceSkipped { input, .. } if *input == missing));
    }

    #[tokio::test]
    async fn skips_sources_whose_output_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked.txt");
        let next = dir.path().join("next.txt");
        std::fs::write(&blocked, "a.example\n").unwrap();
        std::fs::write(&next, "b.example\n").unwrap();
        std::fs::create_dir(dir.path().join("blocked-sites-analysed.txt")).unwrap();

        let (scanner, sink) = scanner(ScriptedFetcher::new(), ok_registry(), 2);
        let reports = scanner.scan(&[blocked.clone(), next.clone()]).await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].input, next);
        assert_eq!(reports[0].lines_written, 1);

        let errors = sink.at(Level::ERROR);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ScanEvent::SourceSkipped { input, reason } => {
                assert_eq!(*input, blocked);
                assert!(reason.starts_with("could not open output file"), "{reason}");
            }
            other => panic!("expected SourceSkipped, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inaccessible_policy_applies_across_the_scan() {
        let fetcher = ScriptedFetcher::new().script("http://example.com", vec![page("x")]);
        let registry = ok_registry().with_test(test_fn("faulty", |_| panic!("boom")));
        let sink = Arc::new(RecordingSink::default());
        let config = ScanConfig::new(5, 1, 2, '|')
            .unwrap()
            .with_test_failure_policy(TestFailurePolicy::Inaccessible);
        let scanner = Scanner::new(config, registry, Arc::new(fetcher), sink);

        let written = run(&scanner, lines(&["example.com"])).await;
        assert_eq!(written, ["[http://example.com]|Inaccessible"]);
    }

    #[rstest]
    #[case("lists/hosts.txt", "lists/hosts-sites-analysed.txt")]
    #[case("hosts", "hosts-sites-analysed.txt")]
    #[case("/tmp/a.b.txt", "/tmp/a.b-sites-analysed.txt")]
    fn derives_output_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(output_path_for(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn decodes_latin1_and_keeps_terminators() {
        assert_eq!(
            decode_lines(b"a.com\r\nb\xe9.com\nlast"),
            ["a.com\r\n", "bé.com\n", "last"]
        );
        assert!(decode_lines(b"").is_empty());
    }
}
