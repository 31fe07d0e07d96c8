//! Shared fixtures for engine tests: a scripted fetcher, a recording event
//! sink and an in-memory output destination.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::io::AsyncWrite;
use tracing::Level;

use crate::core::events::{EventSink, ScanEvent};
use crate::core::models::{FetchOutcome, Response};
use crate::core::scanner::fetcher::Fetcher;

pub fn page(body: &str) -> FetchOutcome {
    FetchOutcome::Success(Response {
        status: 200,
        headers: HeaderMap::new(),
        body: body.to_string(),
    })
}

/// Replays per-URL outcome scripts and counts attempts.
///
/// The last outcome of a script repeats once the script runs out. Unscripted
/// URLs fail with a connection error.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, outcomes: Vec<FetchOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.into());
        self
    }

    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn next_outcome(&self, url: &str) -> FetchOutcome {
        *self.attempts.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap(),
            None => FetchOutcome::ConnectionError("Name or service not known".to_string()),
        }
    }
}

impl Fetcher for ScriptedFetcher {
    type Session = ();

    fn open_session(&self) -> Result<(), String> {
        Ok(())
    }

    fn fetch(
        &self,
        _session: &(),
        url: &str,
        _timeout: Duration,
    ) -> impl Future<Output = FetchOutcome> + Send {
        let outcome = self.next_outcome(url);
        async move { outcome }
    }
}

/// A fetcher whose sessions can never be opened.
#[derive(Debug, Default)]
pub struct BrokenFetcher;

impl Fetcher for BrokenFetcher {
    type Session = ();

    fn open_session(&self) -> Result<(), String> {
        Err("no TLS backend".to_string())
    }

    fn fetch(
        &self,
        _session: &(),
        _url: &str,
        _timeout: Duration,
    ) -> impl Future<Output = FetchOutcome> + Send {
        async { FetchOutcome::ConnectionError("fetched without a session".to_string()) }
    }
}

/// Keeps every event with the level it was reported at.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Level, ScanEvent)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(Level, ScanEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn at(&self, level: Level) -> Vec<ScanEvent> {
        self.events()
            .into_iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, event)| event)
            .collect()
    }

    fn record(&self, level: Level, event: &ScanEvent) {
        self.events.lock().unwrap().push((level, event.clone()));
    }
}

impl EventSink for RecordingSink {
    fn info(&self, event: &ScanEvent) {
        self.record(Level::INFO, event);
    }

    fn warn(&self, event: &ScanEvent) {
        self.record(Level::WARN, event);
    }

    fn error(&self, event: &ScanEvent) {
        self.record(Level::ERROR, event);
    }
}

/// An output destination that can be read back after it was moved into a task.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Rejects every write.
#[derive(Debug, Default)]
pub struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::other("disk full")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
