//! Refresh-on-access caching of values built from a [`RuleSource`].
//!
//! There is no background task: the first call after the refresh period has
//! elapsed rebuilds the value. Reads of a fresh value are a single atomic
//! load. Rebuilds are serialised behind a mutex, and callers that were
//! waiting on a rebuild share its outcome instead of starting their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{ConfigError, RuleSourceError};
use crate::source::RuleSource;
use crate::RuleDocument;

/// Shortest accepted refresh period.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(1);

type Builder<T, D> = dyn Fn(D) -> Result<T, RuleSourceError> + Send + Sync;

struct CachedValue<T> {
    value: Arc<T>,
    built_at: Instant,
    expires_at: Option<Instant>,
}

impl<T> CachedValue<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// The most recent rebuild, numbered so waiters can tell whether one
/// finished while they were blocked.
struct RebuildState<T> {
    attempt: u64,
    outcome: Option<Result<Arc<T>, RuleSourceError>>,
}

/// Caches a value built from a rule document and rebuilds it when it expires.
///
/// With a refresh period, the value is rebuilt by the first [`get`](Self::get)
/// at or after expiry. Without one, it is built on first use and kept. A
/// period too long to represent as a deadline also never expires.
///
/// `D` is the document shape fetched from the source: a [`RuleDocument`] for
/// system-wide control, or a
/// [`CatalogRuleDocument`](crate::CatalogRuleDocument) for a single catalog.
///
/// A failed rebuild discards the cached value: the failure is returned to the
/// triggering caller and to everyone who was waiting on it, and the next call
/// tries again. Stale values are never served in place of an error.
pub struct RefreshingSupplier<T, D = RuleDocument> {
    source: RuleSource,
    build: Box<Builder<T, D>>,
    refresh_period: Option<Duration>,
    scope: String,
    current: ArcSwapOption<CachedValue<T>>,
    attempts: AtomicU64,
    rebuild: Mutex<RebuildState<T>>,
}

impl<T, D: DeserializeOwned> RefreshingSupplier<T, D> {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProperty`] if `refresh_period` is shorter
    /// than [`MIN_REFRESH_PERIOD`].
    pub fn new<F>(
        source: RuleSource,
        refresh_period: Option<Duration>,
        build: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(D) -> Result<T, RuleSourceError> + Send + Sync + 'static,
    {
        if let Some(period) = refresh_period {
            check_refresh_period(period)?;
        }
        Ok(Self {
            source,
            build: Box::new(build),
            refresh_period,
            scope: "system access control".to_owned(),
            current: ArcSwapOption::empty(),
            attempts: AtomicU64::new(0),
            rebuild: Mutex::new(RebuildState {
                attempt: 0,
                outcome: None,
            }),
        })
    }

    /// Name what is being refreshed in log lines, such as
    /// `access control for catalog 'hive'`.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    #[must_use]
    pub fn refresh_period(&self) -> Option<Duration> {
        self.refresh_period
    }

    /// When the currently cached value was built, if there is one.
    #[must_use]
    pub fn last_refresh(&self) -> Option<Instant> {
        self.current.load().as_ref().map(|cached| cached.built_at)
    }

    /// Return the cached value, rebuilding it first if it is missing or
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns the source's or builder's [`RuleSourceError`] when a rebuild
    /// fails.
    pub fn get(&self) -> Result<Arc<T>, RuleSourceError> {
        // Read before the cache so a rebuild finishing after this point is
        // recognised as one to share rather than repeat.
        let observed = self.attempts.load(Ordering::Acquire);
        if let Some(cached) = self.current.load().as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(Arc::clone(&cached.value));
            }
        }
        self.rebuild(observed)
    }

    fn rebuild(&self, observed: u64) -> Result<Arc<T>, RuleSourceError> {
        let mut state = self.rebuild.lock().unwrap_or_else(|poisoned| {
            warn!("refresh lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        });
        if state.attempt != observed {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
        }

        info!(source = %self.source, "Refreshing {}", self.scope);
        let outcome = self
            .source
            .fetch_as()
            .and_then(|document| (self.build)(document))
            .map(Arc::new);

        match &outcome {
            Ok(value) => {
                let built_at = Instant::now();
                self.current.store(Some(Arc::new(CachedValue {
                    value: Arc::clone(value),
                    built_at,
                    expires_at: self
                        .refresh_period
                        .and_then(|period| built_at.checked_add(period)),
                })));
            }
            Err(error) => {
                self.current.store(None);
                warn!(source = %self.source, %error, "failed to refresh {}", self.scope);
            }
        }

        state.attempt += 1;
        state.outcome = Some(outcome.clone());
        self.attempts.store(state.attempt, Ordering::Release);
        outcome
    }
}

pub(crate) fn check_refresh_period(period: Duration) -> Result<(), ConfigError> {
    if period < MIN_REFRESH_PERIOD {
        return Err(ConfigError::InvalidProperty {
            key: crate::config::REFRESH_PERIOD.to_owned(),
            reason: format!("{period:?} is shorter than the minimum of 1ms"),
        });
    }
    Ok(())
}
