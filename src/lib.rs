// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Stream core of an HEVC decoder.
//!
//! [`nal::NalDemuxer`] turns an Annex B byte stream into NAL units with emulation-prevention
//! bytes removed, [`bitstream::BitCursor`] reads their payloads bit by bit and
//! [`threads::WorkerPool`] runs CTB decoding tasks whose ordering is enforced by
//! [`ProgressGate`]s.

pub mod bitstream;
pub mod config;
mod error;
pub mod nal;
pub mod params;
pub mod threads;
pub mod warning;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use sync::ProgressGate;
