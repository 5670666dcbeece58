// src/pipeline/watcher.rs
use super::coordinator::{Coordinator, Role};
use super::worker::Task;
use crate::error::Result;
use crate::queue::BoundedQueue;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Queue occupancy observed while the collectors were running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QueueUsage {
    pub capacity: usize,
    pub samples: usize,
    pub peak: usize,
    pub mean: f64,
}

/// Samples the queue size at a fixed interval until no collector is running.
pub struct QueueWatcher<T> {
    queue: Arc<BoundedQueue<T>>,
    coordinator: Arc<Coordinator>,
    interval: Duration,
    samples: usize,
    peak: usize,
    total: usize,
}

impl<T: Send + 'static> QueueWatcher<T> {
    pub fn new(queue: Arc<BoundedQueue<T>>, coordinator: Arc<Coordinator>, interval: Duration) -> Self {
        Self {
            queue,
            coordinator,
            interval,
            samples: 0,
            peak: 0,
            total: 0,
        }
    }

    fn sample(&mut self) -> usize {
        let size = self.queue.size();
        self.samples += 1;
        self.total += size;
        self.peak = self.peak.max(size);
        size
    }

    pub fn usage(&self) -> QueueUsage {
        QueueUsage {
            capacity: self.queue.capacity(),
            samples: self.samples,
            peak: self.peak,
            mean: if self.samples == 0 {
                0.0
            } else {
                self.total as f64 / self.samples as f64
            },
        }
    }
}

impl<T: Send + 'static> Task for QueueWatcher<T> {
    const ROLE: Role = Role::Watcher;

    fn run(&mut self, id: usize) -> Result<()> {
        while self.coordinator.running(Role::Collector) > 0 && !self.coordinator.is_aborted() {
            let size = self.sample();
            debug!("QueueWatcher #{}: {} / {}", id, size, self.queue.capacity());
            thread::sleep(self.interval);
        }
        Ok(())
    }
}
