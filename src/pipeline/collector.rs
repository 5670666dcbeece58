// src/pipeline/collector.rs
use super::coordinator::{Coordinator, Role};
use super::worker::Task;
use super::POLL_INTERVAL;
use crate::error::{PipelineError, Result};
use crate::io::KmerSource;
use crate::queue::BoundedQueue;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Per k-mer callback run by a collector before the k-mer is queued.
pub trait KmerHook: Send + 'static {
    /// `relative_id` is the k-mer rank in its sequence, 1 for the first k-mer of a sequence.
    fn observe(&mut self, kmer: &str, relative_id: u64) -> Result<()>;
}

impl KmerHook for () {
    #[inline]
    fn observe(&mut self, _kmer: &str, _relative_id: u64) -> Result<()> {
        Ok(())
    }
}

impl<H: KmerHook> KmerHook for Option<H> {
    #[inline]
    fn observe(&mut self, kmer: &str, relative_id: u64) -> Result<()> {
        match self {
            Some(hook) => hook.observe(kmer, relative_id),
            None => Ok(()),
        }
    }
}

/// Pulls every k-mer of one source and pushes it onto the shared queue.
pub struct Collector<S, H = ()> {
    source: S,
    hook: H,
    queue: Arc<BoundedQueue<String>>,
    coordinator: Arc<Coordinator>,
    nb_kmers: usize,
    nb_sequences: usize,
    sequence_offset: Option<u64>,
}

impl<S: KmerSource> Collector<S> {
    pub fn new(source: S, queue: Arc<BoundedQueue<String>>, coordinator: Arc<Coordinator>) -> Self {
        Self::with_hook(source, (), queue, coordinator)
    }
}

impl<S: KmerSource, H: KmerHook> Collector<S, H> {
    pub fn with_hook(
        source: S,
        hook: H,
        queue: Arc<BoundedQueue<String>>,
        coordinator: Arc<Coordinator>,
    ) -> Self {
        Self {
            source,
            hook,
            queue,
            coordinator,
            nb_kmers: 0,
            nb_sequences: 0,
            sequence_offset: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Number of k-mers queued so far.
    pub fn nb_kmers(&self) -> usize {
        self.nb_kmers
    }

    /// Number of sequences that yielded at least one k-mer.
    pub fn nb_sequences(&self) -> usize {
        self.nb_sequences
    }

    pub fn report(&self, id: usize) -> CollectorReport {
        CollectorReport {
            id,
            source: self.source.name().to_string(),
            nb_sequences: self.nb_sequences,
            nb_kmers: self.nb_kmers,
            lcp: None,
        }
    }

    /// Push `kmer`, waiting while the queue is full. Gives up if the run is aborted.
    fn enqueue(&self, mut kmer: String, id: usize) -> Result<()> {
        loop {
            match self.queue.push_timeout(kmer, POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(back) => {
                    if self.coordinator.is_aborted() {
                        return Err(PipelineError::Aborted {
                            role: Role::Collector.name(),
                            id,
                        }
                        .into());
                    }
                    trace!("Collector #{}: queue full ({} items)", id, self.queue.size());
                    kmer = back;
                }
            }
        }
    }

    fn collect(&mut self, id: usize) -> Result<()> {
        while self.source.next_kmer()? {
            let relative_id = self.source.current_kmer_id(false);
            // Every sequence has its own offset, even when its first windows were skipped.
            let offset = self.source.current_kmer_id(true) - relative_id;
            if self.sequence_offset != Some(offset) {
                self.sequence_offset = Some(offset);
                self.nb_sequences += 1;
                debug!(
                    "Collector #{}: new sequence '{}'",
                    id,
                    self.source.current_sequence_description()
                );
            }
            let kmer = self.source.current_kmer().to_string();
            self.hook.observe(&kmer, relative_id)?;
            self.enqueue(kmer, id)?;
            self.nb_kmers += 1;
        }
        Ok(())
    }
}

impl<S: KmerSource + Send + 'static, H: KmerHook> Task for Collector<S, H> {
    const ROLE: Role = Role::Collector;

    fn run(&mut self, id: usize) -> Result<()> {
        debug!("Collector #{}: reading '{}'", id, self.source.name());
        let result = self.collect(id);
        match &result {
            Ok(()) => info!(
                "Collector #{}: {} k-mers from {} sequences in '{}'",
                id,
                self.nb_kmers,
                self.nb_sequences,
                self.source.name()
            ),
            Err(_) => self.coordinator.abort(),
        }
        result
    }
}

/// What one collector did during a run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorReport {
    pub id: usize,
    pub source: String,
    pub nb_sequences: usize,
    pub nb_kmers: usize,
    /// LCP statistics, when they were computed
    pub lcp: Option<super::LcpSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::KmerReader;
    use crate::pipeline::Worker;

    #[test]
    fn test_collects_every_kmer_in_order() {
        let coordinator = Arc::new(Coordinator::new());
        let queue = Arc::new(BoundedQueue::new(64));
        let reader = KmerReader::from_sequences("mem", 3, vec![("s1", "ACGTA"), ("s2", "GGNCC"), ("s3", "NTTT")]);
        let mut worker = Worker::new(Collector::new(reader, Arc::clone(&queue), Arc::clone(&coordinator)), Arc::clone(&coordinator));
        worker.run().unwrap();
        worker.join().unwrap();

        let collector = worker.task().unwrap();
        assert_eq!(collector.nb_kmers(), 4);
        assert_eq!(collector.nb_sequences(), 2);
        let kmers: Vec<String> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(kmers, vec!["ACG", "CGT", "GTA", "TTT"]);
        assert_eq!(coordinator.running(Role::Collector), 0);
    }

    #[test]
    fn test_aborted_run_stops_blocked_collector() {
        let coordinator = Arc::new(Coordinator::new());
        let queue = Arc::new(BoundedQueue::new(1));
        let reader = KmerReader::from_sequences("mem", 2, vec![("s", "ACGTACGT")]);
        let mut worker = Worker::new(Collector::new(reader, Arc::clone(&queue), Arc::clone(&coordinator)), Arc::clone(&coordinator));
        worker.run().unwrap();
        // Nobody pops: the collector blocks on the second k-mer until the abort.
        coordinator.abort();
        assert!(worker.join().is_err());
        assert_eq!(queue.size(), 1);
    }
}
