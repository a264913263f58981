//! Fresh/stale directory cache for the ping service
//!
//! Two values are kept. The fresh value expires after a TTL; the stale
//! value is the last successful fetch and never expires. Reads past the
//! TTL trigger a time-bounded refresh; when that refresh fails the stale
//! value is served and the failure is only logged. Both values live in
//! `ArcSwapOption`s, so concurrent readers always see a whole entry.

use super::DirectorySource;
use crate::logging::Logger;
use crate::models::EndpointDirectory;
use crate::{AppError, Result};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Observable cache state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing fetched yet
    Empty,
    /// Fresh value within its TTL
    Fresh,
    /// TTL elapsed, the next read refreshes
    Expired,
    /// Last refresh failed, reads are served the stale value
    ExpiredFallback,
}

#[derive(Debug)]
struct FreshEntry {
    value: Arc<EndpointDirectory>,
    expires_at: Instant,
}

impl FreshEntry {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct DirectoryCache {
    source: Arc<dyn DirectorySource>,
    ttl: Duration,
    refresh_timeout: Duration,
    fresh: ArcSwapOption<FreshEntry>,
    stale: ArcSwapOption<EndpointDirectory>,
    serving_stale: AtomicBool,
    logger: Arc<Logger>,
}

impl DirectoryCache {
    pub fn new(
        source: Arc<dyn DirectorySource>,
        ttl: Duration,
        refresh_timeout: Duration,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            source,
            ttl,
            refresh_timeout,
            fresh: ArcSwapOption::empty(),
            stale: ArcSwapOption::empty(),
            serving_stale: AtomicBool::new(false),
            logger,
        }
    }

    /// Current directory.
    ///
    /// Only fails on a cold cache whose first refresh fails.
    pub async fn get(&self) -> Result<Arc<EndpointDirectory>> {
        if let Some(entry) = self.fresh.load_full() {
            if entry.is_valid() {
                return Ok(entry.value.clone());
            }
        }

        match self.refresh().await {
            Ok(value) => Ok(value),
            Err(error) => match self.stale.load_full() {
                Some(stale) => {
                    self.serving_stale.store(true, Ordering::Release);
                    self.logger.warn("Directory refresh failed, serving stale copy")
                        .field("source", self.source.describe())
                        .field("regions", stale.len())
                        .error_info(&error)
                        .log()
                        .await;
                    Ok(stale)
                }
                None => {
                    self.logger.error("Directory refresh failed with nothing cached")
                        .field("source", self.source.describe())
                        .error_info(&error)
                        .log()
                        .await;
                    Err(error)
                }
            },
        }
    }

    /// Fetch from the source and store the result as both fresh and stale.
    ///
    /// Concurrent refreshes are not deduplicated; the last one to finish wins.
    pub async fn refresh(&self) -> Result<Arc<EndpointDirectory>> {
        let fetched = tokio::time::timeout(self.refresh_timeout, self.source.fetch())
            .await
            .map_err(|_| AppError::directory_fetch(format!(
                "Refresh from {} timed out after {:?}",
                self.source.describe(),
                self.refresh_timeout
            )))??;

        let value = Arc::new(fetched);
        self.stale.store(Some(value.clone()));
        self.fresh.store(Some(Arc::new(FreshEntry {
            value: value.clone(),
            expires_at: Instant::now() + self.ttl,
        })));
        self.serving_stale.store(false, Ordering::Release);

        self.logger.info("Directory refreshed")
            .field("source", self.source.describe())
            .field("regions", value.len())
            .field("ttl_seconds", self.ttl.as_secs())
            .log()
            .await;

        Ok(value)
    }

    pub fn status(&self) -> CacheStatus {
        match self.fresh.load_full() {
            None if self.stale.load().is_none() => CacheStatus::Empty,
            Some(entry) if entry.is_valid() => CacheStatus::Fresh,
            _ if self.serving_stale.load(Ordering::Acquire) => CacheStatus::ExpiredFallback,
            _ => CacheStatus::Expired,
        }
    }

    /// Force the fresh value past its TTL
    pub fn expire(&self) {
        if let Some(entry) = self.fresh.load_full() {
            self.fresh.store(Some(Arc::new(FreshEntry {
                value: entry.value.clone(),
                expires_at: Instant::now(),
            })));
        }
    }
}
