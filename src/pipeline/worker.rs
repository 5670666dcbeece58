// src/pipeline/worker.rs
//! Run-once background workers.

use super::coordinator::{Coordinator, Role};
use crate::error::{PipelineError, Result};
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// The work loop of a worker, executed on its own thread.
pub trait Task: Send + 'static {
    const ROLE: Role;

    /// Run to completion. `id` is the worker id within its role.
    fn run(&mut self, id: usize) -> Result<()>;
}

/// Marks its worker as finished when dropped: at the end of the task loop, on panic, or
/// when a worker that never ran is dropped. A panicking task also aborts the run.
struct RunningGuard {
    coordinator: Arc<Coordinator>,
    role: Role,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.coordinator.abort();
        }
        self.coordinator.finished(self.role);
    }
}

enum State<T> {
    Idle(T, RunningGuard),
    Running(JoinHandle<(T, Result<()>)>),
    Done(Option<T>),
}

/// A task bound to a dedicated thread.
///
/// The worker is registered as running on creation. [`run`](Worker::run) spawns the thread
/// once, later calls do nothing. [`join`](Worker::join) waits for the thread and returns the
/// task result; the task is then available again through [`task`](Worker::task).
pub struct Worker<T: Task> {
    id: usize,
    coordinator: Arc<Coordinator>,
    state: State<T>,
}

impl<T: Task> Worker<T> {
    pub fn new(task: T, coordinator: Arc<Coordinator>) -> Self {
        let id = coordinator.register(T::ROLE);
        let guard = RunningGuard {
            coordinator: Arc::clone(&coordinator),
            role: T::ROLE,
        };
        Self {
            id,
            coordinator,
            state: State::Idle(task, guard),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn role(&self) -> Role {
        T::ROLE
    }

    /// Spawn the worker thread if it was never started.
    pub fn run(&mut self) -> Result<()> {
        let (mut task, guard) = match mem::replace(&mut self.state, State::Done(None)) {
            State::Idle(task, guard) => (task, guard),
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let id = self.id;
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", T::ROLE.name().to_lowercase(), id))
            .spawn(move || {
                let _guard = guard;
                let result = task.run(id);
                (task, result)
            });

        match spawned {
            Ok(handle) => {
                debug!("{} #{} started", T::ROLE, id);
                self.state = State::Running(handle);
                Ok(())
            }
            Err(e) => {
                // The closure, task and guard included, was dropped by the failed spawn.
                self.coordinator.abort();
                Err(PipelineError::Spawn {
                    role: T::ROLE.name(),
                    id,
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    /// True between [`run`](Self::run) and [`join`](Self::join).
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Wait for the worker thread and return the task result.
    ///
    /// Joining a worker twice is a no-op; joining a worker that was never started fails.
    pub fn join(&mut self) -> Result<()> {
        let handle = match mem::replace(&mut self.state, State::Done(None)) {
            State::Running(handle) => handle,
            State::Idle(task, guard) => {
                self.state = State::Idle(task, guard);
                return Err(PipelineError::NotStarted {
                    role: T::ROLE.name(),
                    id: self.id,
                }
                .into());
            }
            done @ State::Done(_) => {
                self.state = done;
                return Ok(());
            }
        };

        match handle.join() {
            Ok((task, result)) => {
                self.state = State::Done(Some(task));
                result
            }
            Err(_) => Err(PipelineError::Panicked {
                role: T::ROLE.name(),
                id: self.id,
            }
            .into()),
        }
    }

    /// The task, unless its thread is running or panicked.
    pub fn task(&self) -> Option<&T> {
        match &self.state {
            State::Idle(task, _) => Some(task),
            State::Done(task) => task.as_ref(),
            State::Running(_) => None,
        }
    }
}

impl<T: Task> Drop for Worker<T> {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("{} #{} dropped while running, joining it", T::ROLE, self.id);
            if let Err(e) = self.join() {
                warn!("{}", e);
            }
        }
    }
}
