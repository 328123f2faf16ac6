//! In-memory cache state for fetched API resources
//!
//! Each resource tracks whether it has been fetched, is loading, holds data,
//! or failed. A failed or in-flight fetch keeps the previous snapshot
//! readable. Whether a ready resource is fetched again depends on its
//! [`TtlPolicy`]; a forced refresh always fetches.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// When a ready resource becomes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Fetched once per process; only a forced refresh fetches again
    FetchOnce,
    /// Stale once older than the duration
    ExpireAfter(Duration),
}

impl TtlPolicy {
    pub fn is_stale(&self, fetched_at: Instant, now: Instant) -> bool {
        match self {
            TtlPolicy::FetchOnce => false,
            TtlPolicy::ExpireAfter(ttl) => now.saturating_duration_since(fetched_at) >= *ttl,
        }
    }
}

/// Data together with the time it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: T,
    pub fetched_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState<T> {
    NotFetched,
    Loading { stale: Option<Snapshot<T>> },
    Ready(Snapshot<T>),
    Failed {
        error: String,
        stale: Option<Snapshot<T>>,
    },
}

/// One cached API resource
#[derive(Debug)]
pub struct Resource<T> {
    name: &'static str,
    policy: TtlPolicy,
    state: CacheState<T>,
}

impl<T> Resource<T> {
    pub fn new(name: &'static str, policy: TtlPolicy) -> Self {
        Self {
            name,
            policy,
            state: CacheState::NotFetched,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn needs_fetch(&self, now: Instant, force: bool) -> bool {
        if force {
            return true;
        }
        match &self.state {
            CacheState::NotFetched | CacheState::Failed { .. } => true,
            CacheState::Loading { .. } => false,
            CacheState::Ready(snapshot) => self.policy.is_stale(snapshot.fetched_at, now),
        }
    }

    fn take_snapshot(&mut self) -> Option<Snapshot<T>> {
        match std::mem::replace(&mut self.state, CacheState::NotFetched) {
            CacheState::NotFetched => None,
            CacheState::Ready(snapshot) => Some(snapshot),
            CacheState::Loading { stale } | CacheState::Failed { stale, .. } => stale,
        }
    }

    /// Mark a fetch as in flight
    pub fn begin(&mut self) {
        let stale = self.take_snapshot();
        self.state = CacheState::Loading { stale };
    }

    /// Record the outcome of a fetch. The last response recorded wins.
    pub fn finish<E: Display>(&mut self, result: Result<T, E>, now: Instant) {
        match result {
            Ok(data) => {
                self.state = CacheState::Ready(Snapshot {
                    data,
                    fetched_at: now,
                });
            }
            Err(error) => {
                let stale = self.take_snapshot();
                self.state = CacheState::Failed {
                    error: error.to_string(),
                    stale,
                };
            }
        }
    }

    /// Latest good data, including a stale snapshot kept through a failure
    pub fn data(&self) -> Option<&T> {
        self.snapshot().map(|s| &s.data)
    }

    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        match &self.state {
            CacheState::NotFetched => None,
            CacheState::Ready(snapshot) => Some(snapshot),
            CacheState::Loading { stale } | CacheState::Failed { stale, .. } => stale.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CacheState::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }

    /// Fetch if the policy (or `force`) asks for it.
    ///
    /// On failure the error is returned and the previous snapshot stays readable.
    pub async fn load<E, F, Fut>(&mut self, force: bool, fetch: F) -> Result<(), E>
    where
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.needs_fetch(Instant::now(), force) {
            debug!(resource = self.name, "Using cached data");
            return Ok(());
        }

        debug!(resource = self.name, force, "Fetching");
        self.begin();
        match fetch().await {
            Ok(data) => {
                self.finish::<E>(Ok(data), Instant::now());
                Ok(())
            }
            Err(error) => {
                warn!(resource = self.name, %error, "Fetch failed");
                let message = error.to_string();
                self.finish::<String>(Err(message), Instant::now());
                Err(error)
            }
        }
    }
}
