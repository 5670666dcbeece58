// src/pipeline/coordinator.rs
//! Worker bookkeeping shared by every worker of one pipeline run.

use crossbeam::utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The kind of work a worker does. Each role has its own id sequence and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Collector,
    Processor,
    Watcher,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Collector => "Collector",
            Role::Processor => "Processor",
            Role::Watcher => "QueueWatcher",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Role::Collector => 0,
            Role::Processor => 1,
            Role::Watcher => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct RoleCounters {
    created: CachePadded<AtomicUsize>,
    running: CachePadded<AtomicUsize>,
}

/// Created / running counters per role, plus an abort flag raised when a worker fails.
///
/// A worker counts as running from its registration until its task loop exits, whether or
/// not its thread has been started yet. Processors rely on this: they stop once no collector
/// is running and the queue is empty.
#[derive(Debug, Default)]
pub struct Coordinator {
    roles: [RoleCounters; 3],
    aborted: AtomicBool,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new worker and return its id (1-based, per role).
    pub(crate) fn register(&self, role: Role) -> usize {
        let counters = &self.roles[role.slot()];
        counters.running.fetch_add(1, Ordering::AcqRel);
        counters.created.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Mark one worker of `role` as finished.
    pub(crate) fn finished(&self, role: Role) {
        self.roles[role.slot()].running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Number of workers of `role` ever registered.
    pub fn created(&self, role: Role) -> usize {
        self.roles[role.slot()].created.load(Ordering::Acquire)
    }

    /// Number of workers of `role` whose task loop has not exited yet.
    pub fn running(&self, role: Role) -> usize {
        self.roles[role.slot()].running.load(Ordering::Acquire)
    }

    /// Ask every worker to stop as soon as possible.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}
