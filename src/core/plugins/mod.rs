// src/core/plugins/mod.rs

//! Pluggable classification strategies.
//!
//! A `SiteTest` may veto a target by returning `Verdict::Discard`. An
//! `Analysis` contributes one field to the target's result line. Both receive
//! the same borrowed `Page` and must not touch shared engine state. Returning
//! `Err` (or panicking) signals a malfunction, never a verdict.

pub mod analysis;

use reqwest::header::HeaderMap;
use std::any::Any;
use std::fmt;
use thiserror::Error;

use self::analysis::{DetectIndexing, IsEnglish, MatchSigs, StripHeaders};
use self::site_tests::{DetectParking, IsEmpty};

/// A fetched page as seen by plugins.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub target: &'a str,
    pub body: &'a str,
    pub headers: &'a HeaderMap,
}

/// The result of a `SiteTest` that ran normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Discard,
}

/// A plugin malfunction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Converts a caught panic payload into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map_or_else(|| "unknown panic".to_string(), |s| (*s).to_string()),
        };
        Self::new(format!("panicked: {message}"))
    }
}

/// A classifier that may discard a target before analysis.
pub trait SiteTest: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, page: &Page<'_>) -> Result<Verdict, PluginError>;
}

/// A classifier that contributes one descriptive field to the result line.
pub trait Analysis: Send + Sync {
    fn name(&self) -> &str;
    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError>;
}

/// Adapts a closure into a `SiteTest`.
pub struct FnTest<F> {
    name: String,
    func: F,
}

/// Adapts a closure into an `Analysis`.
pub struct FnAnalysis<F> {
    name: String,
    func: F,
}

pub fn test_fn<F>(name: impl Into<String>, func: F) -> FnTest<F>
where
    F: Fn(&Page<'_>) -> Result<Verdict, PluginError> + Send + Sync,
{
    FnTest { name: name.into(), func }
}

pub fn analysis_fn<F>(name: impl Into<String>, func: F) -> FnAnalysis<F>
where
    F: Fn(&Page<'_>) -> Result<String, PluginError> + Send + Sync,
{
    FnAnalysis { name: name.into(), func }
}

impl<F> SiteTest for FnTest<F>
where
    F: Fn(&Page<'_>) -> Result<Verdict, PluginError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, page: &Page<'_>) -> Result<Verdict, PluginError> {
        (self.func)(page)
    }
}

impl<F> Analysis for FnAnalysis<F>
where
    F: Fn(&Page<'_>) -> Result<String, PluginError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn analyse(&self, page: &Page<'_>) -> Result<String, PluginError> {
        (self.func)(page)
    }
}

/// Ordered collections of tests and analyses.
///
/// Registration order is run order, and analysis order is output field order.
#[derive(Default)]
pub struct PluginRegistry {
    tests: Vec<Box<dyn SiteTest>>,
    analyses: Vec<Box<dyn Analysis>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock set shipped with the scanner.
    pub fn builtin() -> Self {
        Self::new()
            .with_test(DetectParking)
            .with_test(IsEmpty)
            .with_analysis(DetectIndexing)
            .with_analysis(MatchSigs)
            .with_analysis(IsEnglish)
            .with_analysis(StripHeaders)
    }

    pub fn with_test(mut self, test: impl SiteTest + 'static) -> Self {
        self.tests.push(Box::new(test));
        self
    }

    pub fn with_analysis(mut self, analysis: impl Analysis + 'static) -> Self {
        self.analyses.push(Box::new(analysis));
        self
    }

    pub fn tests(&self) -> impl Iterator<Item = &dyn SiteTest> {
        self.tests.iter().map(|test| test.as_ref())
    }

    pub fn analyses(&self) -> impl Iterator<Item = &dyn Analysis> {
        self.analyses.iter().map(|analysis| analysis.as_ref())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("tests", &self.tests().map(|t| t.name()).collect::<Vec<_>>())
            .field("analyses", &self.analyses().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}
