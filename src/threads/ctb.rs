// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-CTB progress tracking and wavefront row tasks.

use std::cmp::min;
use std::sync::Arc;

use sync::ProgressGate;

use crate::threads::Task;
use crate::threads::WorkerPool;

pub const CTB_PROGRESS_NONE: i32 = 0;
pub const CTB_PROGRESS_PREFILTER: i32 = 1;
pub const CTB_PROGRESS_DEBLK_V: i32 = 2;
pub const CTB_PROGRESS_DEBLK_H: i32 = 3;
pub const CTB_PROGRESS_SAO: i32 = 4;

/// Picture size in CTBs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CtbGeometry {
    pub width_in_ctbs: usize,
    pub height_in_ctbs: usize,
}

impl CtbGeometry {
    pub fn new(width_in_ctbs: usize, height_in_ctbs: usize) -> Self {
        CtbGeometry {
            width_in_ctbs,
            height_in_ctbs,
        }
    }

    pub fn ctb_count(&self) -> usize {
        self.width_in_ctbs * self.height_in_ctbs
    }

    /// Raster-scan address of the CTB at column `x`, row `y`.
    pub fn addr(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width_in_ctbs && y < self.height_in_ctbs);
        y * self.width_in_ctbs + x
    }
}

/// One progress gate per CTB of a picture.
#[derive(Debug)]
pub struct CtbProgress {
    geometry: CtbGeometry,
    gates: Vec<ProgressGate>,
}

impl CtbProgress {
    pub fn new(geometry: CtbGeometry) -> Self {
        CtbProgress {
            geometry,
            gates: (0..geometry.ctb_count())
                .map(|_| ProgressGate::new())
                .collect(),
        }
    }

    pub fn geometry(&self) -> CtbGeometry {
        self.geometry
    }

    /// Blocks until CTB `(x, y)` has reached `value`.
    pub fn wait_for(&self, x: usize, y: usize, value: i32) {
        self.gates[self.geometry.addr(x, y)].wait_for_progress(value);
    }

    pub fn set(&self, x: usize, y: usize, value: i32) {
        self.gates[self.geometry.addr(x, y)].set_progress(value);
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.gates[self.geometry.addr(x, y)].get_progress()
    }

    /// Puts every CTB back to `CTB_PROGRESS_NONE`. No task may be waiting.
    pub fn reset_all(&self) {
        for gate in &self.gates {
            gate.reset(CTB_PROGRESS_NONE);
        }
    }
}

/// Decoding work for the CTB at `(x, y)`.
pub type CtbWork = dyn Fn(usize, usize) + Send + Sync;

/// Decodes one CTB row from left to right.
///
/// Each CTB waits until the CTB above and to the right (clamped to the last column) has reached
/// `CTB_PROGRESS_PREFILTER`, runs the work and then marks itself `CTB_PROGRESS_PREFILTER`.
pub struct CtbRowTask {
    y: usize,
    progress: Arc<CtbProgress>,
    work: Arc<CtbWork>,
}

impl CtbRowTask {
    pub fn new(y: usize, progress: Arc<CtbProgress>, work: Arc<CtbWork>) -> Self {
        CtbRowTask { y, progress, work }
    }

    pub fn row(&self) -> usize {
        self.y
    }
}

impl Task for CtbRowTask {
    fn work(&self) {
        let width = self.progress.geometry().width_in_ctbs;

        for x in 0..width {
            if self.y > 0 {
                self.progress
                    .wait_for(min(x + 1, width - 1), self.y - 1, CTB_PROGRESS_PREFILTER);
            }

            (self.work)(x, self.y);

            self.progress.set(x, self.y, CTB_PROGRESS_PREFILTER);
        }
    }

    fn name(&self) -> String {
        format!("ctb-row-{}", self.y)
    }
}

/// Queues one `CtbRowTask` per row of `progress`, top row first.
///
/// Rows are queued top-down so a pool of any size makes progress: every row a worker picks up
/// only depends on rows that were dequeued before it.
pub fn add_wavefront_tasks(
    pool: &WorkerPool,
    progress: &Arc<CtbProgress>,
    work: Arc<CtbWork>,
) -> Vec<Arc<CtbRowTask>> {
    (0..progress.geometry().height_in_ctbs)
        .map(|y| {
            let task = Arc::new(CtbRowTask::new(y, progress.clone(), work.clone()));
            pool.add_task(task.clone());
            task
        })
        .collect()
}
