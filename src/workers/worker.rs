//! # Worker
//! src/workers/worker.rs
//!
//! Loop de un thread del pool:
//!
//! ```text
//! Starting → Idle ⇄ Processing
//!             ↓
//!          Exiting   (timeout ocioso con live > min, o shutdown con cola vacía)
//! ```

use crate::workers::pool::Shared;
use log::{debug, error, info, trace};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};

/// Estado de un worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Idle,
    Processing,
    Exiting,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Starting => "starting",
            WorkerState::Idle => "idle",
            WorkerState::Processing => "processing",
            WorkerState::Exiting => "exiting",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct Worker {
    name: String,
    state: WorkerState,
}

impl Worker {
    fn transition(&mut self, next: WorkerState) {
        trace!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }
}

/// Cuerpo del thread `worker-<id>`
pub(crate) fn run(shared: Arc<Shared>, id: usize) {
    let mut worker = Worker {
        name: format!("worker-{}", id),
        state: WorkerState::Starting,
    };
    debug!("{} started", worker.name);
    worker.transition(WorkerState::Idle);

    loop {
        let mut conn = {
            let state = shared.lock();
            let (mut state, wait) = shared
                .job_available
                .wait_timeout_while(state, shared.config.idle_timeout, |s| {
                    s.jobs.is_empty() && !s.shutting_down
                })
                .unwrap_or_else(PoisonError::into_inner);

            match state.jobs.pop_front() {
                Some(conn) => {
                    shared.metrics.job_dequeued();
                    shared.space_available.notify_one();
                    conn
                }
                None if state.shutting_down => {
                    state.live -= 1;
                    shared.metrics.worker_exited();
                    worker.transition(WorkerState::Exiting);
                    debug!("{} exiting on shutdown", worker.name);
                    return;
                }
                None if wait.timed_out() && state.live > shared.config.min_threads => {
                    state.live -= 1;
                    shared.metrics.worker_exited();
                    worker.transition(WorkerState::Exiting);
                    info!("{} idle, exiting ({} threads left)", worker.name, state.live);
                    return;
                }
                None => continue,
            }
        };

        worker.transition(WorkerState::Processing);
        debug!("{} picked up [FD={}]", worker.name, conn.fd());
        shared.metrics.job_started();

        let handler = &shared.handler;
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.serve(&mut conn)));
        if result.is_err() {
            error!("{} handler panicked on [FD={}]", worker.name, conn.fd());
        }

        shared.metrics.job_finished();
        drop(conn);
        worker.transition(WorkerState::Idle);
    }
}
