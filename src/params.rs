// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Id-addressed tables of parsed parameter sets.
//!
//! The parameter-set syntax itself is parsed elsewhere; these tables only store the results and
//! hand out shared read-only views. A slice keeps the `Arc` it looked up, so replacing an entry
//! while pictures still refer to the old one is safe.

use std::sync::Arc;

use crate::bitstream::BitCursor;
use crate::bitstream::UVLC_ERROR;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::warning::Warning;
use crate::warning::WarningQueue;

pub const MAX_VPS_SETS: usize = 16;
pub const MAX_SPS_SETS: usize = 16;
pub const MAX_PPS_SETS: usize = 64;

/// Fixed-size arena of parameter sets indexed by their id.
#[derive(Debug)]
pub struct ParamSetTable<T> {
    kind: &'static str,
    slots: Vec<Option<Arc<T>>>,
}

impl<T> ParamSetTable<T> {
    /// Creates an empty table for ids `0..capacity`. `kind` names the table in errors.
    pub fn new(kind: &'static str, capacity: usize) -> Self {
        ParamSetTable {
            kind,
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn has(&self, id: usize) -> bool {
        matches!(self.slots.get(id), Some(Some(_)))
    }

    pub fn get(&self, id: usize) -> Option<Arc<T>> {
        self.slots.get(id).and_then(|slot| slot.clone())
    }

    /// Stores `value` under `id` and returns the entry it replaced.
    pub fn set(&mut self, id: usize, value: T) -> Result<Option<Arc<T>>> {
        let max = self.slots.len();
        let slot = self.slots.get_mut(id).ok_or(Error::InvalidParamSetId {
            kind: self.kind,
            id,
            max,
        })?;
        Ok(slot.replace(Arc::new(value)))
    }

    pub fn remove(&mut self, id: usize) -> Option<Arc<T>> {
        self.slots.get_mut(id).and_then(Option::take)
    }

    /// Ids of the stored entries in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(id, _)| id)
    }
}

/// Parameter sets seen so far in a stream together with the warnings raised while parsing it.
pub struct ParseContext<V, S, P> {
    pub vps: ParamSetTable<V>,
    pub sps: ParamSetTable<S>,
    pub pps: ParamSetTable<P>,
    pub warnings: WarningQueue,
}

impl<V, S, P> ParseContext<V, S, P> {
    pub fn new(config: &Config) -> Self {
        ParseContext {
            vps: ParamSetTable::new("VPS", MAX_VPS_SETS),
            sps: ParamSetTable::new("SPS", MAX_SPS_SETS),
            pps: ParamSetTable::new("PPS", MAX_PPS_SETS),
            warnings: WarningQueue::with_capacity(config.max_warnings),
        }
    }

    pub fn get_vps_or_warn(&mut self, id: usize) -> Option<Arc<V>> {
        let vps = self.vps.get(id);
        if vps.is_none() {
            self.warnings
                .add_warning(Warning::NonExistingVpsReferenced, false);
        }
        vps
    }

    pub fn get_sps_or_warn(&mut self, id: usize) -> Option<Arc<S>> {
        let sps = self.sps.get(id);
        if sps.is_none() {
            self.warnings
                .add_warning(Warning::NonExistingSpsReferenced, false);
        }
        sps
    }

    pub fn get_pps_or_warn(&mut self, id: usize) -> Option<Arc<P>> {
        let pps = self.pps.get(id);
        if pps.is_none() {
            self.warnings
                .add_warning(Warning::NonExistingPpsReferenced, false);
        }
        pps
    }

    /// Reads a ue(v) header field. A malformed code raises `SliceHeaderInvalid`.
    pub fn read_header_uvlc(&mut self, cursor: &mut BitCursor) -> Option<u32> {
        let value = cursor.get_uvlc();
        if value == UVLC_ERROR {
            self.warnings.add_warning(Warning::SliceHeaderInvalid, false);
            return None;
        }
        u32::try_from(value).ok()
    }

    /// Checks the end of an RBSP, raising `RbspTrailingBitsMismatch` if it is malformed.
    pub fn check_rbsp_trailing_bits(&mut self, cursor: &mut BitCursor) -> bool {
        let ok = cursor.check_rbsp_trailing_bits();
        if !ok {
            self.warnings
                .add_warning(Warning::RbspTrailingBitsMismatch, false);
        }
        ok
    }
}

impl<V, S, P> Default for ParseContext<V, S, P> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
