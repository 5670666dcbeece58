//! Pipeline module - collectors feeding processors through one bounded queue
//!
//! One collector per source pushes k-mers onto the shared queue; a pool of processors pops
//! them and inserts them into the index. Processors stop once every collector has finished
//! and the queue is empty.

pub mod collector;
pub mod coordinator;
pub mod lcp;
pub mod processor;
pub mod watcher;
pub mod worker;

pub use collector::{Collector, CollectorReport, KmerHook};
pub use coordinator::{Coordinator, Role};
pub use lcp::{lcp, LcpHook, LcpStats, LcpSummary};
pub use processor::{processor_count, KmerSink, Processor};
pub use watcher::{QueueUsage, QueueWatcher};
pub use worker::{Task, Worker};

use crate::error::{Error, PipelineError, Result};
use crate::index::ShardedIndex;
use crate::io::KmerSource;
use crate::queue::BoundedQueue;
use crate::settings::Settings;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long an idle worker waits on the queue before re-checking its exit condition.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default queue sampling interval of the watcher
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(10);

fn is_aborted(error: &Error) -> bool {
    matches!(error, Error::Pipeline(PipelineError::Aborted { .. }))
}

/// Outcome of one [`IndexBuilder::run`]
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub elapsed: Duration,
    pub processors: usize,
    pub collectors: Vec<CollectorReport>,
    pub nb_processed: usize,
    pub nb_inserted: usize,
    pub queue: Option<QueueUsage>,
}

impl BuildReport {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Wires the queue, the collectors, the processors and the optional watcher around an index.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    index: Arc<ShardedIndex>,
    queue_size: usize,
    processors: Option<usize>,
    lcp: bool,
    watch_interval: Option<Duration>,
}

impl IndexBuilder {
    pub fn new(index: Arc<ShardedIndex>) -> Self {
        Self {
            index,
            queue_size: 1024,
            processors: None,
            lcp: false,
            watch_interval: None,
        }
    }

    pub fn from_settings(index: Arc<ShardedIndex>, settings: &Settings) -> Self {
        let builder = Self::new(index)
            .queue_size(settings.queue_size)
            .processors(settings.processors)
            .lcp(true);
        if settings.watch_queue {
            builder.watch_queue(DEFAULT_WATCH_INTERVAL)
        } else {
            builder
        }
    }

    /// Queue capacity, rounded up to a power of two.
    pub fn queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    /// Processor pool size; `None` sizes it from the hardware thread count.
    pub fn processors(mut self, processors: Option<usize>) -> Self {
        self.processors = processors;
        self
    }

    /// Compute LCP statistics in every collector.
    pub fn lcp(mut self, enabled: bool) -> Self {
        self.lcp = enabled;
        self
    }

    /// Sample the queue occupancy every `interval` while collectors run.
    pub fn watch_queue(mut self, interval: Duration) -> Self {
        self.watch_interval = Some(interval);
        self
    }

    pub fn index(&self) -> &Arc<ShardedIndex> {
        &self.index
    }

    /// Index every k-mer of `sources`, one collector per source, and wait for all workers.
    ///
    /// The first worker error is returned once every worker has been joined.
    pub fn run<S>(&self, sources: Vec<S>) -> Result<BuildReport>
    where
        S: KmerSource + Send + 'static,
    {
        let start = Instant::now();
        let coordinator = Arc::new(Coordinator::new());
        let queue = Arc::new(BoundedQueue::new(self.queue_size));

        let mut collectors: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let hook = self.lcp.then(|| LcpHook::new(Arc::clone(self.index.transformer())));
                let collector = Collector::with_hook(source, hook, Arc::clone(&queue), Arc::clone(&coordinator));
                Worker::new(collector, Arc::clone(&coordinator))
            })
            .collect();

        let nb_processors = match self.processors {
            Some(n) => n.max(1),
            None => {
                let hardware_threads = num_cpus::get();
                let n = processor_count(hardware_threads, collectors.len());
                info!(
                    "{} hardware threads, {} collectors: using {} processors",
                    hardware_threads,
                    collectors.len(),
                    n
                );
                n
            }
        };
        let mut processors: Vec<_> = (0..nb_processors)
            .map(|_| {
                let processor = Processor::new(Arc::clone(&self.index), Arc::clone(&queue), Arc::clone(&coordinator));
                Worker::new(processor, Arc::clone(&coordinator))
            })
            .collect();

        let mut watcher = self.watch_interval.map(|interval| {
            Worker::new(
                QueueWatcher::new(Arc::clone(&queue), Arc::clone(&coordinator), interval),
                Arc::clone(&coordinator),
            )
        });

        // The error that caused an abort wins over the Aborted errors it triggered.
        let mut first_error: Option<Error> = None;
        let mut keep = |result: Result<()>| {
            if let Err(e) = result {
                warn!("{}", e);
                if first_error.as_ref().map_or(true, is_aborted) {
                    first_error = Some(e);
                }
            }
        };

        for worker in processors.iter_mut() {
            keep(worker.run());
        }
        if let Some(worker) = watcher.as_mut() {
            keep(worker.run());
        }
        for worker in collectors.iter_mut() {
            keep(worker.run());
        }

        // Workers that failed to spawn are no longer running; only started ones are joined.
        for worker in collectors.iter_mut().filter(|w| w.is_running()) {
            keep(worker.join());
        }
        if let Some(worker) = watcher.as_mut().filter(|w| w.is_running()) {
            keep(worker.join());
        }
        for worker in processors.iter_mut().filter(|w| w.is_running()) {
            keep(worker.join());
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let collector_reports = collectors
            .iter()
            .filter_map(|worker| {
                worker.task().map(|collector| CollectorReport {
                    lcp: collector.hook().as_ref().map(LcpHook::summary),
                    ..collector.report(worker.id())
                })
            })
            .collect();
        let (nb_processed, nb_inserted) = processors
            .iter()
            .filter_map(Worker::task)
            .fold((0, 0), |(p, i), processor| (p + processor.nb_popped(), i + processor.nb_inserted()));

        let report = BuildReport {
            elapsed: start.elapsed(),
            processors: nb_processors,
            collectors: collector_reports,
            nb_processed,
            nb_inserted,
            queue: watcher.as_ref().and_then(Worker::task).map(QueueWatcher::usage),
        };
        info!(
            "Indexed {} k-mers ({} new) in {} ms",
            report.nb_processed,
            report.nb_inserted,
            report.elapsed_ms()
        );
        Ok(report)
    }
}
