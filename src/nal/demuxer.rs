// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::VecDeque;

use log::debug;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::nal::pool::NalUnitPool;
use crate::nal::unit::NalUnit;
use crate::nal::unit::Pts;
use crate::nal::unit::UserData;

/// Start-code scanner state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    /// No unit open yet; bytes are discarded until `00 00 01`. Counts the zero bytes seen.
    SearchingStartCode { zeros: usize },
    /// A unit is open. Counts the zero bytes at the end of the pending unit, which are cut off
    /// again if they turn out to belong to the next start code.
    InUnit { zeros: usize },
}

/// Splits input into NAL units and queues them in arrival order.
///
/// Input is either an Annex B byte stream fed in arbitrary chunks to
/// [`push_data`](Self::push_data), or already separated units fed to
/// [`push_nal`](Self::push_nal). Queued units have their emulation-prevention bytes removed.
///
/// The demuxer is meant to be driven by one producer and drained by one consumer. All methods
/// take `&mut self`; sharing it between threads needs a lock around it.
pub struct NalDemuxer {
    pending: Option<NalUnit>,
    queue: VecDeque<NalUnit>,
    /// Bytes in `queue`, not counting `pending`.
    bytes_in_queue: usize,
    end_of_stream: bool,
    end_of_frame: bool,
    state: ScanState,
    pool: NalUnitPool,
}

impl NalDemuxer {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        NalDemuxer {
            pending: None,
            queue: VecDeque::new(),
            bytes_in_queue: 0,
            end_of_stream: false,
            end_of_frame: false,
            state: ScanState::SearchingStartCode { zeros: 0 },
            pool: NalUnitPool::new(config.nal_free_list_size),
        }
    }

    /// Scans a chunk of byte-stream data.
    ///
    /// Every start code found completes the pending unit, which is queued, and opens a new one
    /// that carries `pts` and `user_data`. Data after the last start code stays pending until the
    /// next start code or [`flush_data`](Self::flush_data).
    pub fn push_data(&mut self, data: &[u8], pts: Pts, user_data: Option<UserData>) -> Result<()> {
        self.end_of_frame = false;

        if let Some(unit) = self.pending.as_mut() {
            // Reserve for the whole chunk up front so the byte loop never reallocates.
            unit.resize(unit.size() + data.len())?;
        }

        let mut discarded = 0;

        for (i, &byte) in data.iter().enumerate() {
            match self.state {
                ScanState::SearchingStartCode { zeros } => {
                    if byte == 0 {
                        self.state = ScanState::SearchingStartCode { zeros: zeros + 1 };
                    } else if byte == 1 && zeros >= 2 {
                        self.begin_unit(data.len() - i, pts, user_data.clone())?;
                    } else {
                        discarded += zeros + 1;
                        self.state = ScanState::SearchingStartCode { zeros: 0 };
                    }
                }
                ScanState::InUnit { zeros } => {
                    let Some(unit) = self.pending.as_mut() else {
                        self.state = ScanState::SearchingStartCode { zeros: 0 };
                        continue;
                    };

                    if byte == 1 && zeros >= 2 {
                        // The zeros belong to the start code (and any trailing_zero_8bits).
                        unit.truncate(unit.size() - zeros);
                        self.finish_pending();
                        self.begin_unit(data.len() - i, pts, user_data.clone())?;
                    } else {
                        unit.push_byte(byte);
                        let zeros = if byte == 0 { zeros + 1 } else { 0 };
                        self.state = ScanState::InUnit { zeros };
                    }
                }
            }
        }

        if discarded > 0 {
            debug!("discarded {} bytes outside of any NAL unit", discarded);
        }

        Ok(())
    }

    /// Queues one complete NAL unit without start-code scanning.
    ///
    /// Fails with [`Error::MixedInputModes`] while byte-stream data is pending.
    pub fn push_nal(&mut self, data: &[u8], pts: Pts, user_data: Option<UserData>) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::MixedInputModes);
        }

        self.end_of_frame = false;

        let mut unit = self.pool.alloc(data.len())?;
        if let Err(e) = unit.set_data(data) {
            self.pool.free(unit);
            return Err(e);
        }
        unit.pts = pts;
        unit.user_data = user_data;

        unit.remove_stuffing_bytes();
        self.push_to_queue(unit);
        Ok(())
    }

    /// Completes the pending unit, e.g. at the end of the stream or of a frame.
    pub fn flush_data(&mut self) -> Result<()> {
        self.finish_pending();
        self.state = ScanState::SearchingStartCode { zeros: 0 };
        Ok(())
    }

    /// Takes the oldest complete unit. Hand it back with
    /// [`free_nal_unit`](Self::free_nal_unit) to have its buffer reused.
    pub fn pop_from_nal_queue(&mut self) -> Option<NalUnit> {
        let unit = self.queue.pop_front()?;
        self.bytes_in_queue -= unit.size();
        Some(unit)
    }

    pub fn free_nal_unit(&mut self, unit: NalUnit) {
        self.pool.free(unit);
    }

    /// Drops the unit currently being assembled. Queued units are kept.
    pub fn remove_pending_input_data(&mut self) {
        if let Some(unit) = self.pending.take() {
            self.pool.free(unit);
        }
        self.state = ScanState::SearchingStartCode { zeros: 0 };
    }

    /// Drops the pending unit and every queued unit, as needed when seeking.
    pub fn clear(&mut self) {
        self.remove_pending_input_data();
        while let Some(unit) = self.pop_from_nal_queue() {
            self.pool.free(unit);
        }
        self.bytes_in_queue = 0;
    }

    pub fn mark_end_of_stream(&mut self) {
        self.end_of_stream = true;
    }

    pub fn mark_end_of_frame(&mut self) {
        self.end_of_frame = true;
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    pub fn is_end_of_frame(&self) -> bool {
        self.end_of_frame
    }

    /// Bytes of queued units plus the pending unit.
    pub fn bytes_in_input_queue(&self) -> usize {
        self.bytes_in_queue + self.pending.as_ref().map_or(0, NalUnit::size)
    }

    /// Complete units plus the pending one, if any.
    pub fn number_of_nal_units_pending(&self) -> usize {
        self.queue.len() + usize::from(self.pending.is_some())
    }

    pub fn number_of_complete_nal_units_pending(&self) -> usize {
        self.queue.len()
    }

    pub fn nal_queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of freed units held for reuse.
    pub fn free_list_len(&self) -> usize {
        self.pool.len()
    }

    fn begin_unit(&mut self, size_hint: usize, pts: Pts, user_data: Option<UserData>) -> Result<()> {
        self.state = ScanState::SearchingStartCode { zeros: 0 };

        let mut unit = self.pool.alloc(size_hint + 3)?;
        unit.pts = pts;
        unit.user_data = user_data;

        self.pending = Some(unit);
        self.state = ScanState::InUnit { zeros: 0 };
        Ok(())
    }

    /// Queues the pending unit. An empty one (two start codes in a row, or a flush right after a
    /// start code) goes back to the pool instead.
    fn finish_pending(&mut self) {
        if let Some(mut unit) = self.pending.take() {
            if unit.size() == 0 {
                debug!("dropping empty NAL unit");
                self.pool.free(unit);
                return;
            }
            unit.remove_stuffing_bytes();
            self.push_to_queue(unit);
        }
    }

    fn push_to_queue(&mut self, unit: NalUnit) {
        self.bytes_in_queue += unit.size();
        self.queue.push_back(unit);
    }
}

impl Default for NalDemuxer {
    fn default() -> Self {
        Self::new()
    }
}
