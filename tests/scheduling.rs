// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use p265::threads::ctb::add_wavefront_tasks;
use p265::threads::ctb::CtbGeometry;
use p265::threads::ctb::CtbProgress;
use p265::threads::ctb::CtbWork;
use p265::threads::ctb::CTB_PROGRESS_PREFILTER;
use p265::threads::Task;
use p265::threads::WorkerPool;
use p265::warning::Warning;
use p265::warning::WarningQueue;
use p265::Config;
use p265::ProgressGate;
use sync::Mutex;

struct FnTask<F>(F);

impl<F: Fn() + Send + Sync> Task for FnTask<F> {
    fn work(&self) {
        (self.0)()
    }
}

fn task<F: Fn() + Send + Sync + 'static>(f: F) -> Arc<dyn Task> {
    Arc::new(FnTask(f))
}

#[test]
fn more_tasks_than_threads() {
    const TASKS: usize = 64;

    let mut pool = WorkerPool::default();
    pool.start(4).unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());
    let done = Arc::new(ProgressGate::new());

    for i in 0..TASKS {
        let counter = counter.clone();
        let runs = runs.clone();
        let done = done.clone();
        pool.add_task(task(move || {
            thread::sleep(Duration::from_millis(1));
            runs[i].fetch_add(1, Ordering::SeqCst);
            counter.fetch_add(1, Ordering::SeqCst);
            done.increase_progress(1);
        }));
    }

    done.wait_for_progress(TASKS as i32);
    pool.stop();

    assert_eq!(counter.load(Ordering::SeqCst), TASKS);
    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
    assert_eq!(pool.num_threads_working(), 0);
}

#[test]
fn waiter_runs_after_progress_is_reached() {
    let mut pool = WorkerPool::default();
    pool.start(2).unwrap();

    let gate = Arc::new(ProgressGate::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(ProgressGate::new());

    {
        let gate = gate.clone();
        let log = log.clone();
        let finished = finished.clone();
        pool.add_task(task(move || {
            gate.wait_for_progress(5);
            log.lock().push("waiter");
            finished.set_progress(1);
        }));
    }

    thread::sleep(Duration::from_millis(20));
    log.lock().push("partial");
    gate.set_progress(3);

    thread::sleep(Duration::from_millis(20));
    log.lock().push("complete");
    gate.increase_progress(2);

    finished.wait_for_progress(1);
    pool.stop();

    assert_eq!(*log.lock(), vec!["partial", "complete", "waiter"]);
}

#[test]
fn stop_drops_queued_producer() {
    let mut pool = WorkerPool::default();
    pool.start(1).unwrap();

    let gate = Arc::new(ProgressGate::new());
    let started = Arc::new(ProgressGate::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    let waiter = {
        let gate = gate.clone();
        let started = started.clone();
        let log = log.clone();
        task(move || {
            started.set_progress(1);
            gate.wait_for_progress(1);
            log.lock().push("waiter");
        })
    };
    let producer = {
        let gate = gate.clone();
        let log = log.clone();
        task(move || {
            log.lock().push("producer");
            gate.set_progress(1);
        })
    };

    pool.add_task(waiter);
    started.wait_for_progress(1);
    pool.add_task(producer.clone());
    assert_eq!(pool.num_queued_tasks(), 1);

    // The only worker is blocked in the waiter, so the producer is still queued when the pool
    // stops and is dropped. Nothing else would ever release the waiter.
    let helper = {
        let gate = gate.clone();
        let log = log.clone();
        thread::spawn(move || {
            while Arc::strong_count(&producer) > 1 {
                thread::sleep(Duration::from_millis(1));
            }
            log.lock().push("released");
            gate.set_progress(1);
        })
    };

    pool.stop();
    helper.join().unwrap();

    assert_eq!(*log.lock(), vec!["released", "waiter"]);
    assert_eq!(pool.num_queued_tasks(), 0);
}

#[test]
fn add_task_after_stop() {
    let mut pool = WorkerPool::default();
    pool.start(2).unwrap();
    pool.stop();
    assert!(pool.is_stopped());

    let counter = Arc::new(AtomicUsize::new(0));
    let c = counter.clone();
    pool.add_task(task(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(pool.num_queued_tasks(), 0);

    // A restarted pool takes tasks again.
    pool.start(1).unwrap();
    let done = Arc::new(ProgressGate::new());
    let d = done.clone();
    pool.add_task(task(move || d.set_progress(1)));
    done.wait_for_progress(1);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn clamped_start_reports_warning() {
    let config = Config::from_json_str(r#"{"max-threads": 2}"#).unwrap();
    let mut pool = WorkerPool::new(&config);
    let mut warnings = WarningQueue::with_capacity(config.max_warnings);

    if let Some(warning) = pool.start(8).unwrap() {
        warnings.add_warning(warning, false);
    }
    assert_eq!(pool.num_threads(), 2);
    assert_eq!(
        warnings.get_warning(),
        Some(Warning::NumberOfThreadsLimitedToMaximum)
    );
}

fn run_wavefront(geometry: CtbGeometry, threads: usize) -> Vec<(usize, usize)> {
    let mut pool = WorkerPool::default();
    pool.start(threads).unwrap();

    let progress = Arc::new(CtbProgress::new(geometry));
    let order = Arc::new(Mutex::new(Vec::new()));
    let work_order = order.clone();
    let work: Arc<CtbWork> = Arc::new(move |x, y| {
        if (x + y) % 3 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        work_order.lock().push((x, y));
    });

    let tasks = add_wavefront_tasks(&pool, &progress, work);
    assert_eq!(tasks.len(), geometry.height_in_ctbs);
    assert_eq!(tasks[1].name(), "ctb-row-1");

    for y in 0..geometry.height_in_ctbs {
        progress.wait_for(geometry.width_in_ctbs - 1, y, CTB_PROGRESS_PREFILTER);
    }
    pool.stop();

    let order = order.lock().clone();
    order
}

fn check_wavefront_order(geometry: CtbGeometry, order: &[(usize, usize)]) {
    assert_eq!(order.len(), geometry.ctb_count());
    let index_of = |ctb: (usize, usize)| order.iter().position(|&c| c == ctb).unwrap();

    for &(x, y) in order {
        if x > 0 {
            assert!(index_of((x - 1, y)) < index_of((x, y)));
        }
        if y > 0 {
            let above_right = ((x + 1).min(geometry.width_in_ctbs - 1), y - 1);
            assert!(index_of(above_right) < index_of((x, y)));
        }
    }
}

#[test]
fn wavefront_respects_dependencies() {
    let geometry = CtbGeometry::new(7, 5);
    let order = run_wavefront(geometry, 4);
    check_wavefront_order(geometry, &order);
}

#[test]
fn wavefront_on_single_thread() {
    let geometry = CtbGeometry::new(3, 4);
    let order = run_wavefront(geometry, 1);
    check_wavefront_order(geometry, &order);

    // One worker runs rows strictly one after the other.
    let raster: Vec<_> = (0..4)
        .flat_map(|y| (0..3).map(move |x| (x, y)))
        .collect();
    assert_eq!(order, raster);
}
