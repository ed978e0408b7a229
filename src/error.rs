// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::TryReserveError;
use std::io;

use remain::sorted;
use thiserror::Error as ThisError;

#[sorted]
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("cannot start worker thread: {0}")]
    CannotStartThreadPool(io::Error),
    #[error("forbidden_zero_bit is set in NAL header")]
    ForbiddenZeroBit,
    #[error("{kind} id {id} out of range (max {max})")]
    InvalidParamSetId {
        kind: &'static str,
        id: usize,
        max: usize,
    },
    #[error("nuh_temporal_id_plus1 is zero")]
    InvalidTemporalId,
    #[error("Exp-Golomb code exceeds the maximum prefix length")]
    MalformedExpGolomb,
    #[error("cannot push a NAL unit while byte-stream input is pending")]
    MixedInputModes,
    #[error("NAL unit too short for header: {0} bytes")]
    NalUnitTooShort(usize),
    #[error("out of memory growing NAL buffer: {0}")]
    OutOfMemory(TryReserveError),
}

pub type Result<T> = std::result::Result<T, Error>;
