// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use crate::Condvar;
use crate::Mutex;

/// A monotonic progress counter that threads can block on.
///
/// One thread (usually the task producing some resource) advances the counter with
/// [`set_progress`](Self::set_progress) or [`increase_progress`](Self::increase_progress), while
/// any number of other threads wait in [`wait_for_progress`](Self::wait_for_progress) until the
/// counter reaches the value they depend on.
///
/// The counter never decreases except through [`reset`](Self::reset). Because of that, a waiter
/// may look at the counter without taking the lock: a stale value can only be too small, which
/// just sends the waiter down the locked path for a re-check.
///
/// There is no timeout. A gate that is never advanced blocks its waiters forever.
#[derive(Debug, Default)]
pub struct ProgressGate {
    progress: AtomicI32,
    mutex: Mutex<()>,
    cond: Condvar,
}

impl ProgressGate {
    /// Creates a gate with progress 0.
    pub const fn new() -> ProgressGate {
        ProgressGate::with_progress(0)
    }

    pub const fn with_progress(value: i32) -> ProgressGate {
        ProgressGate {
            progress: AtomicI32::new(value),
            mutex: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Blocks until the progress counter is at least `progress`.
    pub fn wait_for_progress(&self, progress: i32) {
        if self.progress.load(Ordering::Acquire) >= progress {
            return;
        }

        let guard = self.mutex.lock();
        let _guard = self.cond.wait_while(guard, |_| {
            self.progress.load(Ordering::Acquire) < progress
        });
    }

    /// Raises the counter to `progress` and wakes all waiters.
    ///
    /// Does nothing if `progress` is not larger than the current value.
    pub fn set_progress(&self, progress: i32) {
        let _guard = self.mutex.lock();

        if progress > self.progress.load(Ordering::Relaxed) {
            self.progress.store(progress, Ordering::Release);
            self.cond.notify_all();
        }
    }

    /// Adds `delta` to the counter and wakes all waiters.
    pub fn increase_progress(&self, delta: i32) {
        debug_assert!(delta >= 0, "progress must not go backwards");

        let _guard = self.mutex.lock();

        let current = self.progress.load(Ordering::Relaxed);
        self.progress
            .store(current.saturating_add(delta), Ordering::Release);
        self.cond.notify_all();
    }

    pub fn get_progress(&self) -> i32 {
        self.progress.load(Ordering::Acquire)
    }

    /// Overwrites the counter, possibly moving it backwards.
    ///
    /// Only call this while no thread is waiting on the gate, e.g. between pictures.
    pub fn reset(&self, value: i32) {
        let _guard = self.mutex.lock();
        self.progress.store(value, Ordering::Release);
    }
}
