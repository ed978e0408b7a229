// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::VecDeque;

use log::debug;
use remain::sorted;
use thiserror::Error as ThisError;

/// Default bound on pending warnings.
pub const MAX_WARNINGS: usize = 20;

/// Recoverable conditions reported while decoding. They never stop the decoder.
#[sorted]
#[derive(ThisError, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Warning {
    #[error("non-existing PPS referenced")]
    NonExistingPpsReferenced,
    #[error("non-existing SPS referenced")]
    NonExistingSpsReferenced,
    #[error("non-existing VPS referenced")]
    NonExistingVpsReferenced,
    #[error("number of threads limited to maximum")]
    NumberOfThreadsLimitedToMaximum,
    #[error("rbsp_trailing_bits do not match")]
    RbspTrailingBitsMismatch,
    #[error("slice header invalid")]
    SliceHeaderInvalid,
    #[error("warning buffer full")]
    WarningBufferFull,
}

/// Bounded FIFO of pending warnings.
///
/// When the queue is full, the newest slot is overwritten with
/// [`Warning::WarningBufferFull`] so the consumer learns that warnings were lost. Warnings added
/// with `once` set are reported a single time; the set of already shown warnings has the same
/// bound as the queue.
#[derive(Debug)]
pub struct WarningQueue {
    pending: VecDeque<Warning>,
    shown: Vec<Warning>,
    capacity: usize,
}

impl WarningQueue {
    pub fn new() -> Self {
        Self::with_capacity(MAX_WARNINGS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WarningQueue {
            pending: VecDeque::with_capacity(capacity),
            shown: Vec::new(),
            capacity,
        }
    }

    pub fn add_warning(&mut self, warning: Warning, once: bool) {
        if once {
            if self.shown.contains(&warning) {
                debug!("suppressing repeated warning: {}", warning);
                return;
            }
            if self.shown.len() < self.capacity {
                self.shown.push(warning);
            }
        }

        if self.pending.len() >= self.capacity {
            if let Some(last) = self.pending.back_mut() {
                *last = Warning::WarningBufferFull;
            }
            return;
        }

        self.pending.push_back(warning);
    }

    /// Takes the oldest pending warning.
    pub fn get_warning(&mut self) -> Option<Warning> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for WarningQueue {
    fn default() -> Self {
        Self::new()
    }
}
