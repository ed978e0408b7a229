// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Worker threads for parallel CTB decoding and the dependency tracking between CTBs.

pub mod ctb;
mod pool;

pub use pool::Task;
pub use pool::WorkerPool;
pub use pool::MAX_THREADS;
