// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! NAL unit framing: the unit buffer with its emulation-prevention bookkeeping, the two-byte
//! header, a bounded pool of reusable units and the byte-stream demuxer.

mod demuxer;
mod header;
mod pool;
mod unit;

pub use demuxer::NalDemuxer;
pub use header::NalHeader;
pub use header::NalUnitType;
pub use header::NAL_HEADER_BYTES;
pub use pool::NalUnitPool;
pub use pool::NAL_FREE_LIST_SIZE;
pub use unit::NalUnit;
pub use unit::Pts;
pub use unit::UserData;
