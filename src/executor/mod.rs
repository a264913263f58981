//! Probe execution engine
//!
//! A [`ProbePlan`] expands the directory into one request per
//! (region, repetition) pair. The [`WorkerPool`] drains that plan with a
//! fixed number of workers and streams every [`ProbeResult`] back over a
//! channel in completion order.

use crate::{
    client::Prober,
    error::{AppError, Result},
    logging::Logger,
    models::{Config, EndpointDirectory, ProbeRequest, ProbeResult},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Every request a run will issue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbePlan {
    requests: Vec<ProbeRequest>,
}

impl ProbePlan {
    /// `repetitions` rounds over every region in the directory
    pub fn all(directory: &EndpointDirectory, repetitions: u32) -> Self {
        let mut requests = Vec::with_capacity(directory.len() * repetitions as usize);
        for _ in 0..repetitions {
            for (region, endpoint) in directory.iter() {
                requests.push(ProbeRequest::new(region, endpoint.url.as_str()));
            }
        }
        Self { requests }
    }

    /// `repetitions` probes of one region; unknown regions are rejected
    /// before anything is scheduled
    pub fn single(directory: &EndpointDirectory, region: &str, repetitions: u32) -> Result<Self> {
        let endpoint = directory.get(region).ok_or_else(|| {
            AppError::validation(format!(
                "unknown region {:?}; known regions: {}",
                region,
                directory.sorted_regions().join(", ")
            ))
        })?;

        let requests = (0..repetitions)
            .map(|_| ProbeRequest::new(region, endpoint.url.as_str()))
            .collect();
        Ok(Self { requests })
    }

    /// Build the plan a configuration asks for
    pub fn for_config(directory: &EndpointDirectory, config: &Config) -> Result<Self> {
        match &config.region {
            Some(region) => Self::single(directory, region, config.repetitions),
            None => Ok(Self::all(directory, config.repetitions)),
        }
    }

    /// Number of results the run will produce
    pub fn expected(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[ProbeRequest] {
        &self.requests
    }
}

/// Worker pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on probes in flight
    pub concurrency: usize,
    /// Log each probe start and completion at Info
    pub verbose: bool,
}

impl PoolConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            verbose: config.verbose && !config.effective_output_mode().is_machine_readable(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: crate::defaults::DEFAULT_CONCURRENCY,
            verbose: false,
        }
    }
}

/// Fixed-size pool of probe workers sharing one pre-populated queue
pub struct WorkerPool {
    config: PoolConfig,
    prober: Arc<dyn Prober>,
    logger: Arc<Logger>,
}

impl WorkerPool {
    pub fn new(config: PoolConfig, prober: Arc<dyn Prober>, logger: Arc<Logger>) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }
        Ok(Self { config, prober, logger })
    }

    /// Start the workers and return the result stream.
    ///
    /// The channel closes once every request has been probed.
    pub fn spawn(&self, plan: ProbePlan) -> mpsc::Receiver<ProbeResult> {
        let total = plan.expected();
        let workers = self.config.concurrency.min(total);
        let queue = Arc::new(Mutex::new(VecDeque::from(plan.requests)));
        let (sender, receiver) = mpsc::channel(total.max(1));

        for _ in 0..workers {
            let queue = queue.clone();
            let sender = sender.clone();
            let prober = self.prober.clone();
            let logger = self.logger.clone();
            let verbose = self.config.verbose;

            tokio::spawn(async move {
                loop {
                    let Some(request) = next_request(&queue) else { break };

                    let probe_id = Uuid::new_v4().to_string();
                    if verbose {
                        logger.info(&format!("Pinging {:?}", request.region))
                            .correlation_id(&probe_id)
                            .field("url", &request.url)
                            .log()
                            .await;
                    }

                    let result = prober.probe(&request).await;

                    if verbose {
                        logger.info(&format!("Ping to {:?} completed in {:?}", result.region, result.latency))
                            .correlation_id(&probe_id)
                            .probe(&result)
                            .log()
                            .await;
                    }

                    if sender.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }

        receiver
    }

    /// Run the plan to completion and collect results in arrival order
    pub async fn run(&self, plan: ProbePlan) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(plan.expected());
        let mut receiver = self.spawn(plan);
        while let Some(result) = receiver.recv().await {
            results.push(result);
        }
        results
    }
}

/// Pop the next request. A poisoned lock is recovered, since `pop_front`
/// is the only mutation and leaves the queue consistent.
fn next_request(queue: &Mutex<VecDeque<ProbeRequest>>) -> Option<ProbeRequest> {
    queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
}
