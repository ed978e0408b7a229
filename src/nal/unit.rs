// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::error::Result;
use crate::nal::header::NalHeader;
use crate::nal::header::NAL_HEADER_BYTES;

/// Presentation timestamp attached to pushed input.
pub type Pts = i64;

/// Opaque caller data that travels with a NAL unit from push to pop.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// One NAL unit: its payload with emulation-prevention bytes removed, plus the positions of the
/// bytes that were removed.
#[derive(Default)]
pub struct NalUnit {
    pub header: NalHeader,
    pub pts: Pts,
    pub user_data: Option<UserData>,

    data: Vec<u8>,
    /// Pre-removal positions of the removed bytes, in increasing order. Up to position
    /// `skipped_bytes[k]`, `k + 1` bytes were removed.
    skipped_bytes: Vec<usize>,
}

impl NalUnit {
    pub fn new() -> Self {
        Default::default()
    }

    /// Resets everything but the allocated capacity.
    pub fn clear(&mut self) {
        self.header = NalHeader::default();
        self.pts = 0;
        self.user_data = None;
        self.data.clear();
        self.skipped_bytes.clear();
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Grows the capacity to at least `new_size` bytes, keeping the contents.
    ///
    /// On allocation failure the buffer is left exactly as it was.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if self.data.capacity() < new_size {
            self.data
                .try_reserve_exact(new_size - self.data.len())
                .map_err(Error::OutOfMemory)?;
        }
        Ok(())
    }

    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.resize(self.data.len() + data.len())?;
        self.data.extend_from_slice(data);
        Ok(())
    }

    /// Replaces the contents with `data`.
    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        self.resize(data.len())?;
        self.data.clear();
        self.data.extend_from_slice(data);
        Ok(())
    }

    /// Shortens the payload to `len` bytes. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Appends one byte into capacity reserved earlier with `resize`.
    pub(crate) fn push_byte(&mut self, byte: u8) {
        self.data.push(byte);
    }

    /// Parses the NAL header from the payload and stores it in `header`.
    ///
    /// Returns the header length in bytes.
    pub fn parse_header(&mut self) -> Result<usize> {
        self.header = NalHeader::parse(&self.data)?;
        Ok(NAL_HEADER_BYTES)
    }

    pub fn num_skipped_bytes(&self) -> usize {
        self.skipped_bytes.len()
    }

    pub fn skipped_bytes(&self) -> &[usize] {
        &self.skipped_bytes
    }

    /// Records that a byte at pre-removal position `pos` has already been removed from the data.
    ///
    /// Positions must be recorded in increasing order.
    pub fn insert_skipped_byte(&mut self, pos: usize) {
        debug_assert!(self.skipped_bytes.last().map_or(true, |&last| last < pos));
        self.skipped_bytes.push(pos);
    }

    /// Number of bytes removed before `byte_position`, where `byte_position` counts from the end
    /// of a `header_length` byte header in pre-removal coordinates (as slice entry points do).
    pub fn num_skipped_bytes_before(&self, byte_position: usize, header_length: usize) -> usize {
        self.skipped_bytes
            .iter()
            .rposition(|&pos| pos <= byte_position + header_length)
            .map_or(0, |k| k + 1)
    }

    /// Strips emulation-prevention bytes in place.
    ///
    /// In every `00 00 03 xx` with `xx <= 03`, and in a `00 00 03` that ends the payload, the
    /// `03` is removed and its position recorded with `insert_skipped_byte`.
    pub fn remove_stuffing_bytes(&mut self) {
        let prior = self.skipped_bytes.len();
        let len = self.data.len();
        let mut zeros = 0;
        let mut write = 0;

        for read in 0..len {
            let byte = self.data[read];

            if zeros >= 2 && byte == 0x03 {
                let emulated = match self.data.get(read + 1) {
                    Some(&next) => next <= 0x03,
                    None => true,
                };
                if emulated {
                    self.insert_skipped_byte(read + prior);
                    zeros = 0;
                    continue;
                }
            }

            self.data[write] = byte;
            write += 1;
            zeros = if byte == 0 { zeros + 1 } else { 0 };
        }

        self.data.truncate(write);
    }

    /// Inserts an emulation-prevention `03` wherever the payload would otherwise contain
    /// `00 00 0x` with `x <= 3`, or end in `00 00`.
    pub fn insert_emulation_prevention_bytes(&mut self) -> Result<()> {
        let mut out = Vec::new();
        out.try_reserve_exact(self.data.len() + self.data.len() / 2 + 1)
            .map_err(Error::OutOfMemory)?;

        let mut zeros = 0;
        for &byte in &self.data {
            if zeros >= 2 && byte <= 0x03 {
                out.push(0x03);
                zeros = 0;
            }
            out.push(byte);
            zeros = if byte == 0 { zeros + 1 } else { 0 };
        }
        if zeros >= 2 {
            out.push(0x03);
        }

        // Copy back so the unit keeps its (possibly larger) buffer.
        self.resize(out.len())?;
        self.data.clear();
        self.data.extend_from_slice(&out);
        Ok(())
    }
}

impl fmt::Debug for NalUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NalUnit")
            .field("header", &self.header)
            .field("pts", &self.pts)
            .field("size", &self.data.len())
            .field("skipped_bytes", &self.skipped_bytes)
            .finish()
    }
}
