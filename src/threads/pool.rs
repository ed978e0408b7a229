// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use log::error;
use log::info;
use log::warn;
use sync::Condvar;
use sync::Mutex;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::warning::Warning;

/// Default hard limit on worker threads.
pub const MAX_THREADS: usize = 32;

/// A unit of work run to completion on one worker thread.
///
/// A task that depends on other tasks blocks its worker in
/// [`ProgressGate::wait_for_progress`](sync::ProgressGate::wait_for_progress) until the
/// dependency is met.
pub trait Task: Send + Sync {
    fn work(&self);

    fn name(&self) -> String {
        "noname".to_string()
    }
}

#[derive(Default)]
struct State {
    tasks: VecDeque<Arc<dyn Task>>,
    num_threads_working: usize,
    stopped: bool,
}

struct Inner {
    state: Mutex<State>,
    condvar: Condvar,
}

/// Marks the worker idle again once its task returns or unwinds.
struct WorkingGuard<'a> {
    inner: &'a Inner,
    task: &'a dyn Task,
}

impl Drop for WorkingGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("task {} panicked", self.task.name());
        }
        self.inner.state.lock().num_threads_working -= 1;
    }
}

fn run_worker_thread(inner: Arc<Inner>) {
    let mut state = inner.state.lock();
    loop {
        state = inner
            .condvar
            .wait_while(state, |s| !s.stopped && s.tasks.is_empty());

        if state.stopped {
            break;
        }

        let Some(task) = state.tasks.pop_front() else {
            continue;
        };
        state.num_threads_working += 1;
        drop(state);

        {
            let _working = WorkingGuard {
                inner: &inner,
                task: task.as_ref(),
            };
            task.work();
        }

        state = inner.state.lock();
    }
}

/// A fixed set of worker threads taking tasks from one FIFO queue.
///
/// Tasks are started in submission order but may finish in any order. Once
/// [`stop`](WorkerPool::stop) is called, tasks still in the queue are dropped without running
/// and later submissions are dropped as well; check [`is_stopped`](WorkerPool::is_stopped) if a
/// lost task matters. A task waiting on progress that only a dropped task would have made never
/// wakes up, so callers must not stop the pool while such dependencies are outstanding.
///
/// Dropping the pool stops it.
pub struct WorkerPool {
    inner: Arc<Inner>,
    threads: Vec<JoinHandle<()>>,
    max_threads: usize,
}

impl WorkerPool {
    /// Creates a pool without threads. Tasks added before [`start`](WorkerPool::start) wait in
    /// the queue.
    pub fn new(config: &Config) -> WorkerPool {
        WorkerPool {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                condvar: Condvar::new(),
            }),
            threads: Vec::new(),
            max_threads: config.max_threads,
        }
    }

    /// Spawns `num_threads` worker threads.
    ///
    /// The total number of threads is clamped to the configured maximum; in that case the
    /// returned warning is `NumberOfThreadsLimitedToMaximum`. A thread that fails to spawn is a
    /// hard error. Threads started before the failure keep running until `stop`.
    pub fn start(&mut self, num_threads: usize) -> Result<Option<Warning>> {
        let available = self.max_threads.saturating_sub(self.threads.len());
        let (num_threads, warning) = if num_threads > available {
            warn!(
                "limiting worker threads to {} (requested {})",
                self.max_threads,
                self.threads.len() + num_threads
            );
            (available, Some(Warning::NumberOfThreadsLimitedToMaximum))
        } else {
            (num_threads, None)
        };

        self.inner.state.lock().stopped = false;

        for _ in 0..num_threads {
            let inner = self.inner.clone();
            let handle = thread::Builder::new()
                .name(format!("p265-worker-{}", self.threads.len()))
                .spawn(move || run_worker_thread(inner))
                .map_err(Error::CannotStartThreadPool)?;
            self.threads.push(handle);
        }

        info!("worker pool running {} threads", self.threads.len());
        Ok(warning)
    }

    /// Stops the pool and joins every worker thread.
    ///
    /// Tasks that are already running are finished first. Queued tasks are dropped.
    pub fn stop(&mut self) {
        let mut state = self.inner.state.lock();
        if state.stopped && self.threads.is_empty() {
            return;
        }

        state.stopped = true;
        let unfinished_tasks = mem::take(&mut state.tasks);
        drop(state);

        self.inner.condvar.notify_all();

        let num_dropped = unfinished_tasks.len();
        drop(unfinished_tasks);

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        info!("worker pool stopped, {} queued tasks dropped", num_dropped);
    }

    /// Queues `task` and wakes one idle worker.
    ///
    /// On a stopped pool the task is dropped; the caller's own handles to it stay valid.
    pub fn add_task(&self, task: Arc<dyn Task>) {
        let mut state = self.inner.state.lock();

        if state.stopped {
            warn!("worker pool is stopped, dropping task {}", task.name());
            return;
        }

        state.tasks.push_back(task);
        drop(state);

        self.inner.condvar.notify_one();
    }

    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    /// Number of workers currently running a task.
    pub fn num_threads_working(&self) -> usize {
        self.inner.state.lock().num_threads_working
    }

    pub fn num_queued_tasks(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }
}

impl Default for WorkerPool {
    fn default() -> WorkerPool {
        WorkerPool::new(&Config::default())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}
