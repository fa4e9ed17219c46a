//! Resolution options
//!
//! This module provides the ResolveOptions struct that encapsulates
//! the knobs controlling which requirements are resolved and which
//! releases are eligible.

use std::time::Duration;
use tokio::sync::Semaphore;

/// Default number of concurrent index queries
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Options for dependency resolution
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Optional dependency groups to include besides runtime dependencies
    pub groups: Vec<String>,
    /// Accept pre-releases even when no specifier names one
    pub allow_prerelease: bool,
    /// Minimum age for releases to be considered
    pub min_age: Option<Duration>,
    /// Maximum number of concurrent index queries
    pub concurrency: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            allow_prerelease: false,
            min_age: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ResolveOptions {
    /// Create options that resolve runtime dependencies only
    pub fn new() -> Self {
        Self::default()
    }

    /// Set optional groups to include
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Set whether pre-releases are eligible
    pub fn with_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = allow;
        self
    }

    /// Set minimum age for releases
    pub fn with_min_age(mut self, age: Duration) -> Self {
        self.min_age = Some(age);
        self
    }

    /// Set the concurrency limit, clamped to what a semaphore can hold
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }
}
