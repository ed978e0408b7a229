// Copyright 2018 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Sync primitive types whose methods panic rather than returning error in case of poison, plus
//! the [`ProgressGate`] used to order dependent decode work across threads.
//!
//! A panic while one of these locks is held takes down the decoder anyway (release builds use
//! panic=abort), so callers never have to handle a poisoned lock and `.lock().unwrap()` does not
//! appear in the decoding code.

mod condvar;
mod mutex;
mod progress;

pub use crate::condvar::Condvar;
pub use crate::mutex::Mutex;
pub use crate::progress::ProgressGate;
