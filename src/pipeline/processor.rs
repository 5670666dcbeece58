// src/pipeline/processor.rs
use super::coordinator::{Coordinator, Role};
use super::worker::Task;
use super::POLL_INTERVAL;
use crate::error::{PipelineError, Result};
use crate::queue::BoundedQueue;
use std::sync::Arc;
use tracing::{debug, info};

/// Destination of the k-mers popped by processors.
pub trait KmerSink: Send + Sync + 'static {
    /// Returns true if the k-mer was not already present.
    fn insert_kmer(&self, kmer: &str) -> Result<bool>;
}

/// Pops k-mers from the shared queue and hands them to the sink until every collector has
/// finished and the queue is drained.
pub struct Processor<K> {
    sink: Arc<K>,
    queue: Arc<BoundedQueue<String>>,
    coordinator: Arc<Coordinator>,
    nb_popped: usize,
    nb_inserted: usize,
}

impl<K: KmerSink> Processor<K> {
    pub fn new(sink: Arc<K>, queue: Arc<BoundedQueue<String>>, coordinator: Arc<Coordinator>) -> Self {
        Self {
            sink,
            queue,
            coordinator,
            nb_popped: 0,
            nb_inserted: 0,
        }
    }

    /// Number of k-mers taken from the queue.
    pub fn nb_popped(&self) -> usize {
        self.nb_popped
    }

    /// Number of those that were new to the sink.
    pub fn nb_inserted(&self) -> usize {
        self.nb_inserted
    }

    /// No collector left and nothing queued.
    ///
    /// The collector count is read before the queue: once it reads zero, every push of
    /// every collector happened before, so an empty queue cannot be refilled.
    fn drained(&self) -> bool {
        self.coordinator.running(Role::Collector) == 0 && self.queue.is_empty()
    }

    fn process(&mut self, id: usize) -> Result<()> {
        loop {
            if self.coordinator.is_aborted() {
                return Err(PipelineError::Aborted {
                    role: Role::Processor.name(),
                    id,
                }
                .into());
            }
            match self.queue.pop_wait(POLL_INTERVAL) {
                Some(kmer) => {
                    self.nb_popped += 1;
                    if self.sink.insert_kmer(&kmer)? {
                        self.nb_inserted += 1;
                    }
                }
                // Re-evaluated after every failed pop.
                None if self.drained() => return Ok(()),
                None => {}
            }
        }
    }
}

impl<K: KmerSink> Task for Processor<K> {
    const ROLE: Role = Role::Processor;

    fn run(&mut self, id: usize) -> Result<()> {
        debug!("Processor #{}: started", id);
        let result = self.process(id);
        match &result {
            Ok(()) => info!(
                "Processor #{}: {} k-mers processed, {} new",
                id, self.nb_popped, self.nb_inserted
            ),
            Err(_) => self.coordinator.abort(),
        }
        result
    }
}

/// Processor pool size for `collectors` collectors on `hardware_threads` threads.
///
/// Two processors per collector when the hardware has room for three threads per
/// collector, the spare threads when it has room for two, one per collector otherwise,
/// plus one.
pub fn processor_count(hardware_threads: usize, collectors: usize) -> usize {
    let n = if hardware_threads > 3 * collectors {
        2 * collectors
    } else if hardware_threads > 2 * collectors {
        hardware_threads - collectors
    } else {
        collectors
    };
    n + 1
}
