//! Per-region sample aggregation
//!
//! Results arrive in any order. The aggregator groups them by region and,
//! once the expected number has been seen, turns each group into an
//! immutable [`RegionAggregate`] whose median is computed exactly once.


use crate::{
    error::{AppError, Result},
    models::ProbeResult,
};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Non-interpolated median: sorts `samples` and takes index `len / 2`.
///
/// For even counts this is the upper of the two middle values.
pub fn median(samples: &mut [Duration]) -> Option<Duration> {
    samples.sort_unstable();
    samples.get(samples.len() / 2).copied()
}

/// Finished statistics for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionAggregate {
    region: String,
    /// Sorted ascending
    samples: Vec<Duration>,
    error_count: usize,
    median: Duration,
}

impl RegionAggregate {
    /// `None` when there are no samples; such a region is never reported
    pub fn from_samples(region: String, mut samples: Vec<Duration>, error_count: usize) -> Option<Self> {
        let median = median(&mut samples)?;
        Some(Self {
            region,
            samples,
            error_count,
            median,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Every sample, failed probes included, in ascending order
    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn median(&self) -> Duration {
        self.median
    }
}

#[derive(Debug)]
struct RegionSamples {
    region: String,
    samples: Vec<Duration>,
    errors: usize,
}

/// Groups a stream of probe results by region
#[derive(Debug)]
pub struct SampleAggregator {
    expected: usize,
    received: usize,
    /// Groups in order of first arrival
    groups: Vec<RegionSamples>,
    index: HashMap<String, usize>,
}

impl SampleAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            received: 0,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn is_complete(&self) -> bool {
        self.received >= self.expected
    }

    /// Add one result; failed probes count their elapsed time as a sample
    pub fn record(&mut self, result: ProbeResult) {
        let slot = match self.index.get(&result.region) {
            Some(&slot) => slot,
            None => {
                self.groups.push(RegionSamples {
                    region: result.region.clone(),
                    samples: Vec::new(),
                    errors: 0,
                });
                self.index.insert(result.region, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[slot];
        group.samples.push(result.latency);
        if result.failed {
            group.errors += 1;
        }
        self.received += 1;
    }

    /// One aggregate per observed region, in first-arrival order
    pub fn finish(self) -> Vec<RegionAggregate> {
        self.groups
            .into_iter()
            .filter_map(|g| RegionAggregate::from_samples(g.region, g.samples, g.errors))
            .collect()
    }

    /// Drain `receiver` until the expected count is reached.
    ///
    /// `on_result` sees every result before it is recorded. A stream that
    /// closes early is an internal error, since every request yields a result.
    pub async fn collect<F>(mut self, receiver: &mut mpsc::Receiver<ProbeResult>, mut on_result: F) -> Result<Vec<RegionAggregate>>
    where
        F: FnMut(&ProbeResult),
    {
        while !self.is_complete() {
            match receiver.recv().await {
                Some(result) => {
                    on_result(&result);
                    self.record(result);
                }
                None => {
                    return Err(AppError::internal(format!(
                        "result stream closed after {} of {} probes",
                        self.received, self.expected
                    )));
                }
            }
        }
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    fn result(region: &str, latency_ms: u64, failed: bool) -> ProbeResult {
        ProbeResult {
            region: region.to_string(),
            url: format!("https://{}.example", region),
            latency: Duration::from_millis(latency_ms),
            failed,
            error: failed.then(|| "HTTP 503".to_string()),
        }
    }

    #[test]
    fn test_median_odd_count() {
        let mut samples = ms(&[10, 30, 20, 50, 40]);
        assert_eq!(median(&mut samples), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_median_even_count_takes_upper_middle() {
        let mut samples = ms(&[10, 20, 30, 40]);
        assert_eq!(median(&mut samples), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_median_edge_sizes() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut ms(&[7])), Some(Duration::from_millis(7)));
        assert_eq!(median(&mut ms(&[9, 3])), Some(Duration::from_millis(9)));
    }

    #[test]
    fn test_aggregate_counts_failures_as_samples() {
        let mut aggregator = SampleAggregator::new(4);
        aggregator.record(result("us-east1", 10, false));
        aggregator.record(result("us-east1", 500, true));
        aggregator.record(result("us-east1", 20, false));
        aggregator.record(result("us-east1", 30, true));
        assert!(aggregator.is_complete());

        let aggregates = aggregator.finish();
        assert_eq!(aggregates.len(), 1);
        let us = &aggregates[0];
        assert_eq!(us.samples().len(), 4);
        assert_eq!(us.error_count(), 2);
        assert_eq!(us.median(), Duration::from_millis(30));
        assert_eq!(us.samples(), ms(&[10, 20, 30, 500]).as_slice());
    }

    #[test]
    fn test_groups_keep_first_arrival_order() {
        let mut aggregator = SampleAggregator::new(4);
        aggregator.record(result("b", 1, false));
        aggregator.record(result("a", 1, false));
        aggregator.record(result("b", 1, false));
        aggregator.record(result("c", 1, false));

        let regions: Vec<String> = aggregator.finish().iter().map(|a| a.region().to_string()).collect();
        assert_eq!(regions, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_region_never_reported() {
        assert!(RegionAggregate::from_samples("x".to_string(), Vec::new(), 0).is_none());
        assert!(SampleAggregator::new(0).finish().is_empty());
    }

    #[tokio::test]
    async fn test_collect_stops_at_expected() {
        let (tx, mut rx) = mpsc::channel(8);
        for latency in [10, 20, 30] {
            tx.send(result("a", latency, false)).await.unwrap();
        }
        // An extra result is left unread
        tx.send(result("a", 99, false)).await.unwrap();

        let mut seen = 0;
        let aggregates = SampleAggregator::new(3).collect(&mut rx, |_| seen += 1).await.unwrap();
        assert_eq!(seen, 3);
        assert_eq!(aggregates[0].median(), Duration::from_millis(20));
        assert_eq!(rx.recv().await.unwrap().latency, Duration::from_millis(99));
    }

    #[tokio::test]
    async fn test_collect_reports_short_stream() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(result("a", 10, false)).await.unwrap();
        drop(tx);

        let err = SampleAggregator::new(2).collect(&mut rx, |_| {}).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("1 of 2"));
    }
}
